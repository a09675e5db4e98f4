pub mod cli;
pub mod env;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::report::OutputFormat;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "equity-duration")]
#[command(about = "Equity sensitivity to 10Y rates for Korean life insurers")]
pub struct CliConfig {
    /// TOML 設定檔；未指定時從環境變數讀取
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// 計算資本對美、韓 10 年期利率的敏感度
    Analyze {
        #[arg(long, default_value = "samsung")]
        company: String,

        #[arg(long, default_value_t = 3)]
        years: usize,

        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// 寫入檔案而非標準輸出
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// 列出可分析的公司
    Companies,
    /// 回報各來源金鑰是否已設定
    Health,
    /// 以公司名稱關鍵字查詢 DART corp_code
    SearchCorp {
        #[arg(long)]
        keyword: String,
    },
}
