//! Dispatch of the `sitevitrine` subcommands onto the funnel.

use crate::app::factory::{build_funnel, FactoryOptions};
use crate::app::funnel::{Funnel, RunOutcome};
use crate::app::nightly::{NightlyOutcome, NightlyRunner};
use crate::app::stages;
use crate::config::cli::{Cli, Command};
use crate::config::AppConfig;
use crate::domain::model::Prospect;
use crate::domain::ports::Storage;
use crate::utils::error::Result;
use chrono::{Local, Timelike};
use std::path::Path;

const PREVIEW_SIZE: usize = 5;

pub fn funnel_for(cli: &Cli, config: AppConfig) -> Result<Funnel<crate::adapters::LocalStorage>> {
    let dry_run = matches!(cli.command, Command::Sms { dry_run: true, .. });
    build_funnel(
        config,
        FactoryOptions {
            dry_run,
            monitor: cli.monitor,
        },
    )
}

pub async fn execute<S: Storage>(funnel: &Funnel<S>, cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::Fetch => {
            let prospects = funnel.fetch().await;
            println!("📋 {} prospects to process", prospects.len());
            for prospect in prospects.iter().take(PREVIEW_SIZE) {
                println!(
                    "  - {} ({})",
                    prospect
                        .first_text(&["nom", "raison_sociale"])
                        .unwrap_or_else(|| "Inconnu".to_string()),
                    prospect
                        .first_text(&["activite", "metier"])
                        .unwrap_or_else(|| "N/A".to_string())
                );
            }
        }
        Command::Generate => {
            let prospects = funnel.fetch().await;
            let sites = funnel.generate(prospects).await;
            println!("✅ {} sites generated", sites.len());
            for site in &sites {
                println!("  📁 {}", site.dir.display());
            }
        }
        Command::Deploy => {
            let sites = funnel.load_sites(stages::GENERATED_SITES).await?;
            let deployed = funnel.deploy(&sites).await?;
            println!("✅ {}/{} sites deployed", deployed.len(), sites.len());
            for site in &deployed {
                println!("  🌐 {}: {}", site.prospect.label(), site.public_url());
            }
        }
        Command::Email => {
            let sites = funnel.load_sites(stages::DEPLOYED_SITES).await?;
            let sent = funnel.email(&sites).await?;
            println!("📊 {}/{} emails sent", sent.len(), sites.len());
        }
        Command::Sms { batch, .. } => {
            let mut sites = funnel.load_sites(stages::DEPLOYED_SITES).await?;
            if sites.is_empty() {
                sites = funnel.load_sites(stages::PENDING_SMS).await?;
            }
            let batch = batch.unwrap_or(funnel.config().pipeline.sms_batch_size);
            let sent = funnel.sms(&sites, batch).await?;
            println!("📊 {}/{} SMS sent", sent.len(), sites.len().min(batch));
        }
        Command::Run => {
            let outcome = funnel.run().await?;
            match &outcome {
                RunOutcome::Completed(report) => {
                    println!("✅ Automation complete");
                    println!(
                        "📊 {} prospects, {} generated, {} deployed, {} emails",
                        report.prospects, report.generated, report.deployed, report.emails_sent
                    );
                }
                other => println!("⚠️ Run stopped: {}", other.reason()),
            }
        }
        Command::Nightly { .. } => {
            // 夜間模式由 run_nightly 處理
            let outcome = run_nightly_at(funnel, cli.nightly_time()?).await;
            print_nightly(&outcome);
        }
        Command::TestBatch { file } => {
            let prospects = load_prospects_file(file).await?;
            let deployed = funnel.test_batch(prospects).await?;
            println!("✅ {} sites deployed and saved for the SMS batch", deployed.len());
            for site in &deployed {
                println!("  🌐 {}: {}", site.prospect.label(), site.public_url());
            }
        }
    }
    Ok(())
}

/// Reads a JSON array of prospect records from disk.
pub async fn load_prospects_file(path: &Path) -> Result<Vec<Prospect>> {
    let data = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&data)?)
}

/// Scheduled check for `at`, or for the local wall clock.
pub async fn run_nightly_at<S: Storage>(
    funnel: &Funnel<S>,
    at: Option<(u32, u32)>,
) -> NightlyOutcome {
    let (hour, minute) = at.unwrap_or_else(|| {
        let now = Local::now();
        (now.hour(), now.minute())
    });
    NightlyRunner::new(funnel).run_at(hour, minute).await
}

pub fn print_nightly(outcome: &NightlyOutcome) {
    let mode = outcome.mode.map(|m| m.label()).unwrap_or("OUT_OF_RANGE");
    println!(
        "{} {} {}",
        if outcome.success { "✅" } else { "⚠️" },
        outcome.slot,
        mode
    );
}
