use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("XML parsing error: {0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("{source_name} API key is not configured")]
    MissingCredential { source_name: String },

    #[error("{source_name} returned an error ({code}): {message}")]
    UpstreamError {
        source_name: String,
        code: String,
        message: String,
    },

    #[error("Insufficient data: {message}")]
    DataInsufficient { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },
}

pub type Result<T> = std::result::Result<T, AppError>;

/// 分析失敗時回報給呼叫端的錯誤來源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ErrorCategory {
    Input,
    Data,
    Dart,
    Ecos,
    Fred,
    Server,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Input => "INPUT",
            ErrorCategory::Data => "DATA",
            ErrorCategory::Dart => "DART",
            ErrorCategory::Ecos => "ECOS",
            ErrorCategory::Fred => "FRED",
            ErrorCategory::Server => "SERVER",
        }
    }

    /// 對應的 HTTP 狀態碼（輸入與資料不足為 400，其餘 500）
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorCategory::Input | ErrorCategory::Data => 400,
            _ => 500,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorCategory::Input | ErrorCategory::Data => 2,
            ErrorCategory::Dart | ErrorCategory::Ecos | ErrorCategory::Fred => 1,
            ErrorCategory::Server => 3,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ErrorCategory::Input => {
                "Check the company id (see `companies`) and the year count (1-20)"
            }
            ErrorCategory::Data => "Increase --years or retry after the next quarterly filing",
            ErrorCategory::Dart => "Verify DART_API_KEY and the corp code, then retry",
            ErrorCategory::Ecos => "Verify ECOS_API_KEY and the ECOS service status, then retry",
            ErrorCategory::Fred => "Verify FRED_API_KEY and the FRED service status, then retry",
            ErrorCategory::Server => "Re-run with --verbose and inspect the log output",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 帶有來源分類的分析錯誤，`detail` 保留底層原因的訊息
#[derive(Error, Debug)]
#[error("[{category}] {message}: {detail}")]
pub struct CategorizedError {
    pub category: ErrorCategory,
    pub message: String,
    pub detail: String,
    #[source]
    pub cause: Option<AppError>,
}

impl CategorizedError {
    pub fn new(
        category: ErrorCategory,
        message: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            category,
            message: message.into(),
            detail: detail.into(),
            cause: None,
        }
    }

    pub fn from_cause(
        category: ErrorCategory,
        message: impl Into<String>,
        cause: AppError,
    ) -> Self {
        Self {
            category,
            message: message.into(),
            detail: cause.to_string(),
            cause: Some(cause),
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: ErrorPayload {
                source: self.category,
                message: self.message.clone(),
                detail: self.detail.clone(),
            },
        }
    }
}

/// 未分類的內部錯誤一律歸為 SERVER
impl From<AppError> for CategorizedError {
    fn from(err: AppError) -> Self {
        CategorizedError::from_cause(ErrorCategory::Server, "Internal server error", err)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: ErrorPayload,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub source: ErrorCategory,
    pub message: String,
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_serializes_uppercase() {
        let err = CategorizedError::new(ErrorCategory::Data, "Insufficient data", "need 2");
        let json = serde_json::to_value(err.to_body()).unwrap();
        assert_eq!(json["error"]["source"], "DATA");
        assert_eq!(json["error"]["detail"], "need 2");
    }

    #[test]
    fn test_detail_preserves_cause_message() {
        let cause = AppError::MissingCredential {
            source_name: "FRED".to_string(),
        };
        let err =
            CategorizedError::from_cause(ErrorCategory::Fred, "US 10Y rate lookup failed", cause);
        assert_eq!(err.category, ErrorCategory::Fred);
        assert_eq!(err.detail, "FRED API key is not configured");
        assert!(err.cause.is_some());
    }

    #[test]
    fn test_status_and_exit_codes() {
        assert_eq!(ErrorCategory::Input.status_code(), 400);
        assert_eq!(ErrorCategory::Ecos.status_code(), 500);
        assert_eq!(ErrorCategory::Server.exit_code(), 3);
        assert_eq!(ErrorCategory::Dart.to_string(), "DART");
    }

    #[test]
    fn test_uncategorized_error_is_server() {
        let err: CategorizedError = AppError::ConfigError {
            message: "bad".to_string(),
        }
        .into();
        assert_eq!(err.category, ErrorCategory::Server);
        assert_eq!(err.category.status_code(), 500);
    }
}
