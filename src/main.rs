use addr_backfill::utils::{logger, validation::Validate};
use addr_backfill::{run_backfill, BackfillReport, CliConfig};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.log_json {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting addr-backfill ({} role)", config.role);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    match run_backfill(&config, config.dry_run).await {
        Ok(BackfillReport::DryRun { total_rows, planned }) => {
            println!("🔍 {} of {} rows would be looked up", planned.len(), total_rows);
            for (index, query) in planned {
                println!("  Row {}: {}", index, query);
            }
        }
        Ok(BackfillReport::Completed { summary, output_path }) => {
            println!(
                "✅ {} lookups, {} rows updated. Output saved to: {}",
                summary.lookups(),
                summary.merged,
                output_path
            );
            if summary.halted() {
                // 配額用盡，已完成的資料已保存，稍後重跑即可
                eprintln!("🚫 Geocoding quota exhausted; rerun later to continue");
                std::process::exit(2);
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Backfill failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            std::process::exit(e.severity().exit_code());
        }
    }

    Ok(())
}
