pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::Cli;

pub use adapters::LocalStorage;
pub use app::{Funnel, NightlyRunner, RunOutcome};
pub use config::AppConfig;
pub use utils::error::{FunnelError, Result};
