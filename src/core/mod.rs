pub mod analysis;
pub mod companies;
pub mod health;
pub mod report;

pub use crate::domain::model::{AnalysisParams, AnalysisResult, HealthStatus};
pub use crate::domain::ports::{Cache, ConfigProvider, DisclosureSource, RateSource, Storage};
pub use crate::utils::error::Result;
