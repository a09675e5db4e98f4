use crate::core::ConfigProvider;
use crate::domain::model::HealthStatus;

fn configured(key: Option<&str>) -> bool {
    key.map(|k| !k.trim().is_empty()).unwrap_or(false)
}

/// 只回報各來源的 API 金鑰是否已設定，不檢查連線
pub fn health<C: ConfigProvider + ?Sized>(config: &C) -> HealthStatus {
    HealthStatus {
        status: "healthy".to_string(),
        dart_api: configured(config.dart_api_key()),
        ecos_api: configured(config.ecos_api_key()),
        fred_api: configured(config.fred_api_key()),
    }
}
