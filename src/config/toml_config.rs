use crate::adapters::cache::MAX_TTL;
use crate::adapters::dart::DEFAULT_DART_BASE_URL;
use crate::adapters::ecos::DEFAULT_ECOS_BASE_URL;
use crate::adapters::fred::DEFAULT_FRED_BASE_URL;
use crate::config::env::{
    DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL_SECONDS, DEFAULT_TIMEOUT_SECONDS,
};
use crate::core::ConfigProvider;
use crate::domain::model::AnalysisParams;
use crate::utils::error::{AppError, Result};
use crate::utils::validation::{validate_positive_number, validate_range, validate_url, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub credentials: CredentialsConfig,
    pub sources: SourcesConfig,
    pub cache: CacheConfig,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    pub dart_api_key: Option<String>,
    pub ecos_api_key: Option<String>,
    pub fred_api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcesConfig {
    pub dart_base_url: Option<String>,
    pub ecos_base_url: Option<String>,
    pub fred_base_url: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    pub ttl_seconds: Option<u64>,
    pub capacity: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub max_lookback_days: Option<u32>,
    pub outlier_threshold: Option<f64>,
}

const PLACEHOLDER_PATTERN: &str = r"\$\{([^}]+)\}";

/// 空字串或未替換的 `${VAR}` 視為未設定
fn credential(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !(v.starts_with("${") && v.ends_with('}')))
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AppError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AppError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DART_API_KEY})，未定義者保留原字樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(PLACEHOLDER_PATTERN).map_err(|e| AppError::ConfigError {
            message: format!("Invalid placeholder pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_url("sources.dart_base_url", self.dart_base_url())?;
        validate_url("sources.ecos_base_url", self.ecos_base_url())?;
        validate_url("sources.fred_base_url", self.fred_base_url())?;

        if let Some(timeout) = self.sources.timeout_seconds {
            validate_positive_number("sources.timeout_seconds", timeout, 1)?;
        }
        if let Some(ttl) = self.cache.ttl_seconds {
            validate_range("cache.ttl_seconds", ttl, 0, MAX_TTL.as_secs())?;
        }
        if let Some(capacity) = self.cache.capacity {
            validate_positive_number("cache.capacity", capacity as u64, 1)?;
        }
        if let Some(days) = self.analysis.max_lookback_days {
            validate_range("analysis.max_lookback_days", days, 0, 31)?;
        }
        if let Some(threshold) = self.analysis.outlier_threshold {
            if !(threshold.is_finite() && threshold > 0.0) {
                return Err(AppError::InvalidConfigValueError {
                    field: "analysis.outlier_threshold".to_string(),
                    value: threshold.to_string(),
                    reason: "Threshold must be a positive number".to_string(),
                });
            }
        }

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn dart_api_key(&self) -> Option<&str> {
        credential(&self.credentials.dart_api_key)
    }

    fn ecos_api_key(&self) -> Option<&str> {
        credential(&self.credentials.ecos_api_key)
    }

    fn fred_api_key(&self) -> Option<&str> {
        credential(&self.credentials.fred_api_key)
    }

    fn dart_base_url(&self) -> &str {
        self.sources.dart_base_url.as_deref().unwrap_or(DEFAULT_DART_BASE_URL)
    }

    fn ecos_base_url(&self) -> &str {
        self.sources.ecos_base_url.as_deref().unwrap_or(DEFAULT_ECOS_BASE_URL)
    }

    fn fred_base_url(&self) -> &str {
        self.sources.fred_base_url.as_deref().unwrap_or(DEFAULT_FRED_BASE_URL)
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.sources.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS))
    }

    fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_seconds.unwrap_or(DEFAULT_CACHE_TTL_SECONDS))
    }

    fn cache_capacity(&self) -> usize {
        self.cache.capacity.unwrap_or(DEFAULT_CACHE_CAPACITY)
    }

    fn analysis_params(&self) -> AnalysisParams {
        let defaults = AnalysisParams::default();
        AnalysisParams {
            max_lookback_days: self
                .analysis
                .max_lookback_days
                .unwrap_or(defaults.max_lookback_days),
            outlier_threshold: self
                .analysis
                .outlier_threshold
                .unwrap_or(defaults.outlier_threshold),
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
