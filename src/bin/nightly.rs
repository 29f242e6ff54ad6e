//! Cron entry point: `0-7 * * * nightly` (same as `sitevitrine nightly`).
//!
//! Always exits 0; the journal under `logs/nightly-<HH>.log` records OK/WARN.

use clap::Parser;
use sitevitrine::app::commands;
use sitevitrine::app::factory::{build_funnel, FactoryOptions};
use sitevitrine::config::AppConfig;
use sitevitrine::core::schedule::parse_time_slot;
use sitevitrine::utils::logger::{self, LogFormat};
use sitevitrine::utils::validation::Validate;

#[derive(Parser)]
#[command(name = "nightly")]
#[command(about = "Scheduled funnel checks, keyed by the hour of the day")]
struct Args {
    /// TOML configuration file; without it the configuration comes from the environment
    #[arg(short, long)]
    config: Option<String>,

    /// Pretend the clock reads HH:MM
    #[arg(long)]
    at: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Log as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    // 初始化日誌
    logger::init_logger(LogFormat::from_json_flag(args.json_logs), args.verbose);

    let config = match &args.config {
        Some(path) => AppConfig::from_file(path),
        None => Ok(AppConfig::from_env()),
    }
    .and_then(|config| config.validate().map(|_| config));

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            return;
        }
    };

    let at = match args.at.as_deref() {
        Some(value) => match parse_time_slot(value) {
            Some(slot) => Some(slot),
            None => {
                eprintln!("❌ --at expects HH:MM, got {}", value);
                return;
            }
        },
        None => None,
    };

    match build_funnel(config, FactoryOptions::default()) {
        Ok(funnel) => {
            let outcome = commands::run_nightly_at(&funnel, at).await;
            commands::print_nightly(&outcome);
        }
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
        }
    }
}
