use anyhow::Context;
use clap::Parser;
use equity_duration::core::{companies, health, ConfigProvider, Storage};
use equity_duration::utils::{logger, validation::Validate};
use equity_duration::{
    render, AnalysisEngine, AnalysisRequest, CategorizedError, CliConfig, Command, EnvConfig,
    LocalStorage, TomlConfig,
};
use std::path::Path;

fn load_config(path: Option<&Path>) -> anyhow::Result<Box<dyn ConfigProvider>> {
    match path {
        Some(path) => {
            let config = TomlConfig::from_file(path)
                .with_context(|| format!("Failed to load config file {}", path.display()))?;
            config.validate().context("Invalid config file")?;
            Ok(Box::new(config))
        }
        None => {
            let config = EnvConfig::from_env().context("Invalid environment configuration")?;
            config.validate().context("Invalid environment configuration")?;
            Ok(Box::new(config))
        }
    }
}

/// 輸出錯誤本文並以分類對應的結束碼離開
fn exit_with(err: CategorizedError) -> ! {
    tracing::error!("❌ {} (source: {})", err, err.category);
    tracing::error!("💡 Recovery suggestion: {}", err.category.recovery_suggestion());

    match serde_json::to_string_pretty(&err.to_body()) {
        Ok(body) => eprintln!("{}", body),
        Err(_) => eprintln!("❌ {}", err),
    }
    eprintln!("💡 {}", err.category.recovery_suggestion());

    std::process::exit(err.category.exit_code());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting equity-duration CLI");
    if cli.verbose {
        tracing::debug!("CLI args: {:?}", cli);
    }

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {:#}", e);
            eprintln!("❌ {:#}", e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Command::Companies => {
            println!("{}", serde_json::to_string_pretty(&companies::list_companies())?);
        }
        Command::Health => {
            println!("{}", serde_json::to_string_pretty(&health::health(config.as_ref()))?);
        }
        Command::SearchCorp { keyword } => {
            let engine = AnalysisEngine::from_config(config.as_ref())
                .unwrap_or_else(|e| exit_with(e.into()));
            match engine.search_corp(&keyword).await {
                Ok(entries) => println!("{}", serde_json::to_string_pretty(&entries)?),
                Err(e) => exit_with(e),
            }
        }
        Command::Analyze {
            company,
            years,
            format,
            output,
        } => {
            let engine = AnalysisEngine::from_config(config.as_ref())
                .unwrap_or_else(|e| exit_with(e.into()));
            let request = AnalysisRequest {
                company_id: company,
                year_count: years,
            };

            let result = engine.analyze(&request).await.unwrap_or_else(|e| exit_with(e));
            let rendered = render(&result, format).unwrap_or_else(|e| exit_with(e.into()));

            match output {
                Some(path) => {
                    let storage = LocalStorage::new(".");
                    let target = path.to_string_lossy();
                    storage
                        .write_file(&target, rendered.as_bytes())
                        .await
                        .unwrap_or_else(|e| exit_with(e.into()));
                    tracing::info!("✅ Analysis completed successfully!");
                    println!("📁 Output saved to: {}", storage.resolve(&target).display());
                }
                None => println!("{}", rendered),
            }
        }
    }

    Ok(())
}
