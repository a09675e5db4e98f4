pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{Command, CliConfig};

pub use config::{cli::LocalStorage, env::EnvConfig, toml_config::TomlConfig};
pub use core::analysis::{AnalysisDeps, AnalysisEngine, AnalysisRequest};
pub use core::report::{render, OutputFormat};
pub use utils::error::{AppError, CategorizedError, ErrorCategory, Result};
