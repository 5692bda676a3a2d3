use clap::Parser;
use medallion_etl::core::ConfigProvider;
use medallion_etl::utils::{error::ErrorSeverity, logger};
use medallion_etl::{CliConfig, EtlEngine, LocalStorage, MedallionPipeline};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting medallion-etl");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    let settings = match config.resolve() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Pipeline: {} v{} (db: {}, artifacts: {})",
        settings.name,
        settings.version,
        settings.db_path.display(),
        settings.artifacts_dir.display()
    );

    let monitor_enabled = settings.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(settings.artifacts_dir().to_path_buf());
    let pipeline = MedallionPipeline::new(storage, settings);

    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run(config.mode).await {
        Ok(summaries) => {
            tracing::info!("✅ Pipeline completed successfully!");
            println!("✅ Pipeline completed successfully!");
            for summary in &summaries {
                for (object, rows) in &summary.row_counts {
                    println!("  [{}] {} rows={}", summary.stage, object, rows);
                }
                for artifact in &summary.artifacts {
                    println!("  [{}] wrote {}", summary.stage, artifact);
                }
                if summary.skipped_rows > 0 {
                    println!(
                        "  [{}] skipped {} malformed rows",
                        summary.stage, summary.skipped_rows
                    );
                }
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Pipeline failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
