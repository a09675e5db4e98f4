use crate::utils::error::{AppError, Result};
use reqwest::{Client, Response};
use std::time::Duration;

const USER_AGENT: &str = concat!("equity-duration/", env!("CARGO_PKG_VERSION"));

pub fn build_client(timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()?;
    Ok(client)
}

/// 非 2xx 回應轉為 `UpstreamError`，盡量保留上游回傳的訊息
pub async fn ensure_success(source_name: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|json| {
            json.get("error_message")
                .or_else(|| json.get("message"))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.chars().take(200).collect());

    tracing::debug!("{} responded with HTTP {}: {}", source_name, status, message);
    Err(AppError::UpstreamError {
        source_name: source_name.to_string(),
        code: status.as_u16().to_string(),
        message,
    })
}

pub fn require_key<'a>(source_name: &str, key: Option<&'a str>) -> Result<&'a str> {
    key.filter(|k| !k.trim().is_empty())
        .ok_or_else(|| AppError::MissingCredential {
            source_name: source_name.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_key() {
        assert_eq!(require_key("FRED", Some("abc")).unwrap(), "abc");
        assert!(matches!(
            require_key("FRED", Some("  ")),
            Err(AppError::MissingCredential { .. })
        ));
        assert!(require_key("ECOS", None).is_err());
    }
}
