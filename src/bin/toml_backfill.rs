use addr_backfill::core::ConfigProvider;
use addr_backfill::utils::logger;
use addr_backfill::{run_backfill, AddressRole, BackfillReport, TomlConfig};
use clap::Parser;

#[derive(Parser)]
#[command(name = "toml-backfill")]
#[command(about = "Address backfill driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "backfill.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override the address role from config
    #[arg(long, value_enum)]
    role: Option<AddressRole>,

    /// Dry run - show which rows would be looked up without calling the provider
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Starting TOML-based address backfill");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    // 載入 TOML 配置
    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 應用命令列覆蓋設定
    if let Some(role) = args.role {
        config.dataset.role = role;
        tracing::info!("🔧 Role overridden to: {}", role);
    }

    if let Err(e) = config.validate_config(!args.dry_run) {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");
    display_config_summary(&config, &args);

    match run_backfill(&config, args.dry_run).await {
        Ok(BackfillReport::DryRun { total_rows, planned }) => {
            println!("🔍 Dry Run Analysis:");
            println!("  Rows: {}", total_rows);
            println!("  Lookups needed: {}", planned.len());
            for (index, query) in planned {
                println!("  Row {}: {}", index, query);
            }
        }
        Ok(report) => {
            if let BackfillReport::Completed { output_path, .. } = &report {
                println!("📁 Output saved to: {}", output_path);
            }
            if report.halted() {
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
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            std::process::exit(e.severity().exit_code());
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Role: {}", config.role());
    println!("  Input: {}", config.input_path());
    println!("  Output: {}", config.output_path());
    println!(
        "  Checkpoint: {} (every {} rows)",
        config.checkpoint_path(),
        config.checkpoint_every()
    );
    println!("  Endpoint: {}", config.endpoint());
    println!("  Delay: {}s per lookup", config.delay_seconds());

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}
