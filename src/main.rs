use anyhow::Context;
use clap::Parser;
use user_csv_etl::utils::{logger, validation::Validate};
use user_csv_etl::{
    CliConfig, ConfigProvider, EtlEngine, LocalStorage, ReqwestTransport, RunOutcome, TomlConfig,
    UserPipeline,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting user-csv-etl");

    match cli.config.clone() {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            let config = TomlConfig::from_file(&path)
                .with_context(|| format!("failed to load config file '{}'", path))?;
            execute(config).await;
        }
        None => execute(cli).await,
    }

    Ok(())
}

async fn execute<C>(config: C)
where
    C: ConfigProvider + Validate + std::fmt::Debug,
{
    tracing::debug!("Config: {:?}", config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let storage = LocalStorage::new(".");
    let pipeline = UserPipeline::new(storage, ReqwestTransport::new(), config);
    let engine = EtlEngine::new(pipeline);

    match engine.run().await {
        RunOutcome::Written {
            path,
            rows,
            record_failures,
        } => {
            tracing::info!("✅ ETL process completed successfully!");
            println!("📁 Output saved to: {} ({} rows)", path, rows);
            if record_failures > 0 {
                println!(
                    "⚠️  {} record(s) were written partially normalized",
                    record_failures
                );
            }
        }
        RunOutcome::NoData => {
            tracing::info!("ETL process finished without output");
        }
        RunOutcome::WriteFailed(e) => {
            tracing::warn!("ETL process finished but the CSV was not saved: {}", e);
        }
    }
}
