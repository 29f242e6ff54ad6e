use crate::config::AppConfig;
use crate::core::schedule::parse_time_slot;
use crate::utils::error::{FunnelError, Result};
use crate::utils::validation::{self, Validate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "sitevitrine")]
#[command(about = "Prospect-to-website funnel: sheet, enrichment, static sites, GitHub Pages, Brevo")]
#[command(version)]
pub struct Cli {
    /// TOML configuration file; without it the configuration comes from the environment
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Log CPU and memory usage after each stage
    #[arg(long, global = true)]
    pub monitor: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Fetch eligible prospects and snapshot them
    Fetch,
    /// Fetch, enrich and render the sites
    Generate,
    /// Publish the last generated sites
    Deploy,
    /// Email the prospects of the last deployed sites
    Email,
    /// SMS the prospects of the last deployed sites
    Sms {
        /// Maximum number of messages
        #[arg(long)]
        batch: Option<usize>,

        /// Log the messages instead of sending them
        #[arg(long)]
        dry_run: bool,
    },
    /// Full run: fetch, generate, deploy, email
    Run,
    /// Run the scheduled check for the current (or given) time
    Nightly {
        /// Pretend the clock reads HH:MM
        #[arg(long)]
        at: Option<String>,
    },
    /// Generate and deploy a local prospects file, keeping the result for a later SMS batch
    TestBatch {
        /// JSON array of prospect records
        file: PathBuf,
    },
}

impl Cli {
    pub fn command_name(&self) -> &'static str {
        match self.command {
            Command::Fetch => "fetch",
            Command::Generate => "generate",
            Command::Deploy => "deploy",
            Command::Email => "email",
            Command::Sms { .. } => "sms",
            Command::Run => "run",
            Command::Nightly { .. } => "nightly",
            Command::TestBatch { .. } => "test-batch",
        }
    }

    pub fn load_config(&self) -> Result<AppConfig> {
        match &self.config {
            Some(path) => AppConfig::from_file(path),
            None => Ok(AppConfig::from_env()),
        }
    }

    /// `--at HH:MM`, if given.
    pub fn nightly_time(&self) -> Result<Option<(u32, u32)>> {
        match &self.command {
            Command::Nightly { at: Some(at) } => parse_time_slot(at).map(Some).ok_or_else(|| {
                FunnelError::InvalidConfigValueError {
                    field: "--at".to_string(),
                    value: at.clone(),
                    reason: "expected HH:MM".to_string(),
                }
            }),
            _ => Ok(None),
        }
    }
}

impl Validate for Cli {
    fn validate(&self) -> Result<()> {
        if let Some(path) = &self.config {
            validation::validate_path("--config", &path.to_string_lossy())?;
        }
        if let Command::Sms {
            batch: Some(batch), ..
        } = &self.command
        {
            validation::validate_positive_number("--batch", *batch, 1)?;
        }
        if let Command::TestBatch { file } = &self.command {
            validation::validate_path("file", &file.to_string_lossy())?;
        }
        self.nightly_time()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sms_flags() {
        let cli = Cli::parse_from(["sitevitrine", "--verbose", "sms", "--batch", "3", "--dry-run"]);
        assert!(cli.verbose);
        assert_eq!(
            cli.command,
            Command::Sms {
                batch: Some(3),
                dry_run: true
            }
        );
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["sitevitrine", "run", "--monitor", "--config", "funnel.toml"]);
        assert!(cli.monitor);
        assert_eq!(cli.config, Some(PathBuf::from("funnel.toml")));
        assert_eq!(cli.command, Command::Run);
    }

    #[test]
    fn test_nightly_time() {
        let cli = Cli::parse_from(["sitevitrine", "nightly", "--at", "06:25"]);
        assert_eq!(cli.nightly_time().unwrap(), Some((6, 25)));

        let cli = Cli::parse_from(["sitevitrine", "nightly", "--at", "25:00"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_zero_batch_rejected() {
        let cli = Cli::parse_from(["sitevitrine", "sms", "--batch", "0"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_test_batch_file() {
        let cli = Cli::parse_from(["sitevitrine", "test-batch", "test-prospects.json"]);
        assert_eq!(
            cli.command,
            Command::TestBatch {
                file: PathBuf::from("test-prospects.json")
            }
        );
    }
}
