//! One module per funnel stage. Each stage logs and skips failing items and
//! never returns an error for a single record.

pub mod deploy;
pub mod enrich;
pub mod fetch;
pub mod generate;
pub mod notify;

use crate::config::PathsConfig;
use crate::utils::snapshot;
use std::time::Duration;

/// Sites written by the generate stage, read by `deploy`.
pub const GENERATED_SITES: &str = "generated-sites.json";
/// Sites published by the deploy stage, read by `email` and `sms`.
pub const DEPLOYED_SITES: &str = "deployed-sites.json";
/// Sites deployed by test runs and waiting for a manual SMS batch.
pub const PENDING_SMS: &str = "pending-sms-test.json";
pub const SAMPLE_PROSPECTS: &str = "sample-prospects.json";
pub const ENRICHED_SAMPLE: &str = "enriched-sample.json";

pub fn logs_file(paths: &PathsConfig, name: &str) -> String {
    snapshot::join(&paths.logs_dir, name)
}

/// Fixed delay between two external calls; zero disables it.
pub(crate) async fn pause(ms: u64) {
    if ms > 0 {
        tracing::debug!("⏳ Waiting {} ms", ms);
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}
