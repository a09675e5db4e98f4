use crate::adapters::cache::MAX_TTL;
use crate::adapters::dart::DEFAULT_DART_BASE_URL;
use crate::adapters::ecos::DEFAULT_ECOS_BASE_URL;
use crate::adapters::fred::DEFAULT_FRED_BASE_URL;
use crate::core::ConfigProvider;
use crate::domain::model::AnalysisParams;
use crate::utils::error::{AppError, Result};
use crate::utils::validation::{validate_positive_number, validate_range, validate_url, Validate};
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 6 * 60 * 60;
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// 由環境變數組成的設定；未設定的金鑰會讓對應來源在查詢時失敗
#[derive(Debug, Clone, PartialEq)]
pub struct EnvConfig {
    pub dart_api_key: Option<String>,
    pub ecos_api_key: Option<String>,
    pub fred_api_key: Option<String>,
    pub dart_base_url: String,
    pub ecos_base_url: String,
    pub fred_base_url: String,
    pub timeout_seconds: u64,
    pub cache_ttl_seconds: u64,
    pub cache_capacity: usize,
    pub params: AnalysisParams,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            dart_api_key: None,
            ecos_api_key: None,
            fred_api_key: None,
            dart_base_url: DEFAULT_DART_BASE_URL.to_string(),
            ecos_base_url: DEFAULT_ECOS_BASE_URL.to_string(),
            fred_base_url: DEFAULT_FRED_BASE_URL.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            params: AnalysisParams::default(),
        }
    }
}

impl EnvConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 以任意查詢函式取代 `std::env::var`，測試時不必改動行程環境
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        Ok(Self {
            dart_api_key: non_empty("DART_API_KEY"),
            ecos_api_key: non_empty("ECOS_API_KEY"),
            fred_api_key: non_empty("FRED_API_KEY"),
            dart_base_url: non_empty("DART_BASE_URL").unwrap_or(defaults.dart_base_url),
            ecos_base_url: non_empty("ECOS_BASE_URL").unwrap_or(defaults.ecos_base_url),
            fred_base_url: non_empty("FRED_BASE_URL").unwrap_or(defaults.fred_base_url),
            timeout_seconds: parse_number(
                "REQUEST_TIMEOUT_SECONDS",
                non_empty("REQUEST_TIMEOUT_SECONDS"),
            )?
            .unwrap_or(defaults.timeout_seconds),
            cache_ttl_seconds: parse_number("CACHE_TTL_SECONDS", non_empty("CACHE_TTL_SECONDS"))?
                .unwrap_or(defaults.cache_ttl_seconds),
            cache_capacity: defaults.cache_capacity,
            params: defaults.params,
        })
    }
}

fn parse_number(field: &str, raw: Option<String>) -> Result<Option<u64>> {
    raw.map(|value| {
        value.parse::<u64>().map_err(|e| AppError::InvalidConfigValueError {
            field: field.to_string(),
            value: value.clone(),
            reason: format!("Expected a non-negative integer: {}", e),
        })
    })
    .transpose()
}

impl ConfigProvider for EnvConfig {
    fn dart_api_key(&self) -> Option<&str> {
        self.dart_api_key.as_deref()
    }

    fn ecos_api_key(&self) -> Option<&str> {
        self.ecos_api_key.as_deref()
    }

    fn fred_api_key(&self) -> Option<&str> {
        self.fred_api_key.as_deref()
    }

    fn dart_base_url(&self) -> &str {
        &self.dart_base_url
    }

    fn ecos_base_url(&self) -> &str {
        &self.ecos_base_url
    }

    fn fred_base_url(&self) -> &str {
        &self.fred_base_url
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    fn cache_capacity(&self) -> usize {
        self.cache_capacity
    }

    fn analysis_params(&self) -> AnalysisParams {
        self.params
    }
}

impl Validate for EnvConfig {
    fn validate(&self) -> Result<()> {
        validate_url("DART_BASE_URL", &self.dart_base_url)?;
        validate_url("ECOS_BASE_URL", &self.ecos_base_url)?;
        validate_url("FRED_BASE_URL", &self.fred_base_url)?;
        validate_positive_number("REQUEST_TIMEOUT_SECONDS", self.timeout_seconds, 1)?;
        validate_range("CACHE_TTL_SECONDS", self.cache_ttl_seconds, 0, MAX_TTL.as_secs())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = EnvConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config, EnvConfig::default());
        assert!(config.dart_api_key().is_none());
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.cache_ttl(), Duration::from_secs(21_600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_reads_keys_and_overrides() {
        let config = EnvConfig::from_lookup(lookup(&[
            ("DART_API_KEY", "dart"),
            ("ECOS_API_KEY", "  "),
            ("FRED_BASE_URL", "http://localhost:9000"),
            ("CACHE_TTL_SECONDS", "0"),
        ]))
        .unwrap();

        assert_eq!(config.dart_api_key(), Some("dart"));
        assert!(config.ecos_api_key().is_none());
        assert_eq!(config.fred_base_url(), "http://localhost:9000");
        assert_eq!(config.cache_ttl(), Duration::ZERO);
    }

    #[test]
    fn test_invalid_timeout() {
        let err =
            EnvConfig::from_lookup(lookup(&[("REQUEST_TIMEOUT_SECONDS", "soon")])).unwrap_err();
        assert!(matches!(err, AppError::InvalidConfigValueError { .. }));

        let zero = EnvConfig::from_lookup(lookup(&[("REQUEST_TIMEOUT_SECONDS", "0")])).unwrap();
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_cache_ttl_upper_bound() {
        let max = u64::MAX.to_string();
        let huge = EnvConfig::from_lookup(lookup(&[("CACHE_TTL_SECONDS", max.as_str())])).unwrap();
        assert!(matches!(huge.validate(), Err(AppError::InvalidConfigValueError { .. })));

        let month = EnvConfig::from_lookup(lookup(&[("CACHE_TTL_SECONDS", "2592000")])).unwrap();
        assert!(month.validate().is_ok());
    }
}
