use clap::Parser;
use sitevitrine::app::commands;
use sitevitrine::utils::logger::{self, LogFormat};
use sitevitrine::utils::validation::Validate;
use sitevitrine::Cli;

#[tokio::main]
async fn main() {
    // .env 不存在時直接略過
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // 初始化日誌
    logger::init_logger(LogFormat::from_json_flag(cli.json_logs), cli.verbose);

    tracing::info!("🚀 Starting sitevitrine {}", cli.command_name());

    // 驗證配置
    let config = match cli.validate().and_then(|_| cli.load_config()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration loading failed: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(e.exit_code().max(1));
        }
    };
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code().max(1));
    }

    if cli.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let result = match commands::funnel_for(&cli, config) {
        Ok(funnel) => commands::execute(&funnel, &cli).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        // 記錄詳細錯誤信息
        tracing::error!(
            "❌ {} failed: {} (Category: {:?}, Severity: {:?})",
            cli.command_name(),
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = e.exit_code();
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}
