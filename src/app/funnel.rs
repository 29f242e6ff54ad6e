use crate::app::stages::{self, deploy, fetch, generate, notify};
use crate::config::AppConfig;
use crate::core::records::derive_id;
use crate::domain::model::{Prospect, ReportedSite, RunReport, SendReceipt, Site};
use crate::domain::ports::{Enricher, Messenger, ProspectSource, SitePublisher, Storage};
use crate::utils::error::{FunnelError, Result};
use crate::utils::journal::RunJournal;
use crate::utils::monitor::StageMonitor;
use crate::utils::snapshot;
use chrono::Utc;

/// A test batch deploys at most this many sites.
pub const TEST_BATCH_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(RunReport),
    /// The sheet (and every snapshot) had nothing eligible.
    NoProspects,
    /// Every generation attempt failed.
    GenerationFailed,
}

impl RunOutcome {
    pub fn reason(&self) -> &'static str {
        match self {
            RunOutcome::Completed(_) => "completed",
            RunOutcome::NoProspects => "no_prospects",
            RunOutcome::GenerationFailed => "generation_failed",
        }
    }
}

/// The funnel engine: each stage on its own, or the full daily run.
///
/// Publisher and messenger are optional so that `fetch`/`generate` work
/// without GitHub or Brevo credentials; stages that need them fail with
/// [`FunnelError::MissingConfigError`].
pub struct Funnel<S: Storage> {
    storage: S,
    config: AppConfig,
    source: Box<dyn ProspectSource>,
    enricher: Box<dyn Enricher>,
    publisher: Option<Box<dyn SitePublisher>>,
    messenger: Option<Box<dyn Messenger>>,
    monitor: StageMonitor,
}

impl<S: Storage> Funnel<S> {
    pub fn new(
        storage: S,
        config: AppConfig,
        source: Box<dyn ProspectSource>,
        enricher: Box<dyn Enricher>,
    ) -> Self {
        Self {
            storage,
            config,
            source,
            enricher,
            publisher: None,
            messenger: None,
            monitor: StageMonitor::new(false),
        }
    }

    pub fn with_publisher(mut self, publisher: Box<dyn SitePublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn with_messenger(mut self, messenger: Box<dyn Messenger>) -> Self {
        self.messenger = Some(messenger);
        self
    }

    pub fn with_monitoring(mut self, enabled: bool) -> Self {
        self.monitor = StageMonitor::new(enabled);
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn enricher(&self) -> &dyn Enricher {
        self.enricher.as_ref()
    }

    pub fn publisher(&self) -> Result<&dyn SitePublisher> {
        self.publisher
            .as_deref()
            .ok_or_else(|| FunnelError::MissingConfigError {
                field: "github.token".to_string(),
            })
    }

    pub fn messenger(&self) -> Result<&dyn Messenger> {
        self.messenger
            .as_deref()
            .ok_or_else(|| FunnelError::MissingConfigError {
                field: "brevo.api_key".to_string(),
            })
    }

    pub fn logs_file(&self, name: &str) -> String {
        stages::logs_file(&self.config.paths, name)
    }

    /// Reads a list of sites saved by an earlier stage; a missing file is an empty list.
    pub async fn load_sites(&self, name: &str) -> Result<Vec<Site>> {
        let path = self.logs_file(name);
        if !self.storage.exists(&path).await {
            tracing::warn!("⚠️ {} not found", path);
            return Ok(Vec::new());
        }
        snapshot::read_json(&self.storage, &path).await
    }

    pub async fn save_sites(&self, name: &str, sites: &[Site]) -> Result<()> {
        snapshot::write_json(&self.storage, &self.logs_file(name), sites).await
    }

    pub async fn fetch(&self) -> Vec<Prospect> {
        let prospects =
            fetch::fetch_prospects(&self.storage, self.source.as_ref(), &self.config.paths).await;
        self.monitor.log_stage("fetch");
        prospects
    }

    pub async fn generate(&self, prospects: Vec<Prospect>) -> Vec<Site> {
        let sites = generate::generate_sites(
            &self.storage,
            self.enricher.as_ref(),
            &self.config,
            prospects,
        )
        .await;
        self.monitor.log_stage("generate");
        sites
    }

    /// Deploys and saves the published list for the notification stages.
    pub async fn deploy(&self, sites: &[Site]) -> Result<Vec<Site>> {
        let publisher = self.publisher()?;
        let deployed =
            deploy::deploy_sites(publisher, sites, self.config.pipeline.deploy_delay_ms).await;
        self.save_sites(stages::DEPLOYED_SITES, &deployed).await?;
        self.monitor.log_stage("deploy");
        Ok(deployed)
    }

    pub async fn email(&self, sites: &[Site]) -> Result<Vec<SendReceipt>> {
        let receipts =
            notify::send_notification_emails(self.messenger()?, &self.config, sites).await;
        self.monitor.log_stage("email");
        Ok(receipts)
    }

    pub async fn sms(&self, sites: &[Site], batch_size: usize) -> Result<Vec<SendReceipt>> {
        let receipts =
            notify::send_sms_batch(self.messenger()?, &self.config, sites, batch_size).await;
        self.monitor.log_stage("sms");
        Ok(receipts)
    }

    /// Generates and deploys hand-picked prospects, then keeps the published
    /// sites as the pending SMS list. Records without `_id` get one derived.
    pub async fn test_batch(&self, prospects: Vec<Prospect>) -> Result<Vec<Site>> {
        self.publisher()?;
        let journal = RunJournal::new(&self.storage, self.logs_file("test-run.log"));
        journal
            .log(format!("📥 {} test prospects loaded", prospects.len()))
            .await;
        if prospects.len() > TEST_BATCH_LIMIT {
            journal
                .log(format!("✂️ Keeping the first {}", TEST_BATCH_LIMIT))
                .await;
        }

        let now = Utc::now().timestamp_millis();
        let prospects: Vec<Prospect> = prospects
            .into_iter()
            .take(TEST_BATCH_LIMIT)
            .enumerate()
            .map(|(i, mut prospect)| {
                if prospect.id.trim().is_empty() {
                    prospect.id = derive_id(&prospect, i, now);
                }
                prospect
            })
            .collect();

        journal.log("🎨 Generating sites").await;
        let sites = self.generate(prospects).await;
        journal.log(format!("✅ {} sites generated", sites.len())).await;

        journal.log("🚀 Deploying to GitHub Pages").await;
        let deployed = self.deploy(&sites).await?;
        journal.log(format!("✅ {} sites deployed", deployed.len())).await;

        self.save_sites(stages::PENDING_SMS, &deployed).await?;
        journal.log("💾 Sites saved for the SMS batch").await;
        for site in &deployed {
            journal
                .log(format!("   🌐 {}: {}", site.prospect.label(), site.public_url()))
                .await;
        }
        Ok(deployed)
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        // 缺少憑證時在抓取前就失敗
        self.publisher()?;
        self.messenger()?;

        let name = format!("cron-{}.log", Utc::now().format("%Y-%m-%d"));
        let journal = RunJournal::new(&self.storage, self.logs_file(&name));
        journal.log("🚀 Starting SiteVitrine run").await;

        journal.log("📥 Step 1: fetching prospects").await;
        let prospects = self.fetch().await;
        if prospects.is_empty() {
            journal.log("⚠️ No prospect to process").await;
            return Ok(RunOutcome::NoProspects);
        }
        let prospect_count = prospects.len();
        journal
            .log(format!("✅ {} prospects fetched", prospect_count))
            .await;

        journal.log("🎨 Step 2: generating sites").await;
        let sites = self.generate(prospects).await;
        if sites.is_empty() {
            journal.log("❌ No site generated").await;
            return Ok(RunOutcome::GenerationFailed);
        }
        journal.log(format!("✅ {} sites generated", sites.len())).await;

        journal.log("🚀 Step 3: deploying to GitHub Pages").await;
        let deployed = self.deploy(&sites).await?;
        journal.log(format!("✅ {} sites deployed", deployed.len())).await;

        journal.log("📧 Step 4: sending notifications").await;
        let sent = self.email(&deployed).await?;
        journal.log(format!("✅ {} emails sent", sent.len())).await;

        let report = RunReport {
            date: Utc::now(),
            prospects: prospect_count,
            generated: sites.len(),
            deployed: deployed.len(),
            emails_sent: sent.len(),
            sites: deployed
                .iter()
                .map(|site| ReportedSite {
                    id: site.id.clone(),
                    url: site.public_url().to_string(),
                    prospect: site.prospect.text("email"),
                })
                .collect(),
        };

        let report_path = self.logs_file(&format!(
            "report-{}.json",
            report.date.timestamp_millis()
        ));
        snapshot::write_json(&self.storage, &report_path, &report).await?;
        journal
            .log(format!("✅ Run complete, report saved to {}", report_path))
            .await;
        self.monitor.log_final_stats();

        Ok(RunOutcome::Completed(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::brevo::DryRunMessenger;
    use crate::adapters::storage::LocalStorage;
    use crate::app::stages::enrich::PassthroughEnricher;
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct Rows(Vec<Vec<String>>);

    #[async_trait]
    impl ProspectSource for Rows {
        async fn fetch_rows(&self) -> Result<Vec<Vec<String>>> {
            Ok(self.0.clone())
        }

        fn describe(&self) -> String {
            "fixture".to_string()
        }
    }

    struct InstantPublisher;

    #[async_trait]
    impl SitePublisher for InstantPublisher {
        async fn publish(&self, site: &Site) -> Result<Site> {
            let mut out = site.clone();
            out.deployed_url = Some(format!("{}/", site.url));
            out.deployed_at = Some(Utc::now());
            Ok(out)
        }
    }

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.pipeline.generate_delay_ms = 0;
        config.pipeline.deploy_delay_ms = 0;
        config.pipeline.email_delay_ms = 0;
        config
    }

    fn funnel(storage: LocalStorage, rows: Vec<Vec<String>>) -> Funnel<LocalStorage> {
        Funnel::new(
            storage,
            config(),
            Box::new(Rows(rows)),
            Box::new(PassthroughEnricher),
        )
        .with_publisher(Box::new(InstantPublisher))
        .with_messenger(Box::new(DryRunMessenger))
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[tokio::test]
    async fn test_run_writes_report() {
        let temp_dir = TempDir::new().unwrap();
        let funnel = funnel(
            LocalStorage::new(temp_dir.path()),
            vec![
                row(&["id", "raison_sociale", "email", "site_web"]),
                row(&["10", "Fleurs", "f@example.fr", ""]),
                row(&["11", "Boulangerie", "", ""]),
            ],
        );

        let outcome = funnel.run().await.unwrap();
        let RunOutcome::Completed(report) = outcome else {
            panic!("run did not complete");
        };
        assert_eq!(report.prospects, 2);
        assert_eq!(report.generated, 2);
        assert_eq!(report.deployed, 2);
        assert_eq!(report.emails_sent, 1);
        assert_eq!(report.sites[0].prospect.as_deref(), Some("f@example.fr"));
        assert_eq!(report.sites[1].prospect, None);

        let logs = funnel.storage().list_dir("logs").await.unwrap();
        assert!(logs.iter().any(|n| n.starts_with("report-")));
        assert!(logs.iter().any(|n| n.starts_with("cron-")));
        assert!(logs.contains(&"deployed-sites.json".to_string()));
        assert_eq!(funnel.load_sites(stages::DEPLOYED_SITES).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_run_without_eligible_prospects() {
        let temp_dir = TempDir::new().unwrap();
        let funnel = funnel(
            LocalStorage::new(temp_dir.path()),
            vec![row(&["id", "site_web"]), row(&["1", "https://deja.fr"])],
        );

        let outcome = funnel.run().await.unwrap();
        assert_eq!(outcome, RunOutcome::NoProspects);
        assert_eq!(outcome.reason(), "no_prospects");
    }

    #[tokio::test]
    async fn test_batch_saves_pending_sms() {
        let temp_dir = TempDir::new().unwrap();
        let funnel = funnel(LocalStorage::new(temp_dir.path()), Vec::new());
        let prospects: Vec<Prospect> = serde_json::from_value(serde_json::json!([
            {"siret": "123 456", "raison_sociale": "Coiffure Martin", "telephone": "+33612345678"},
            {"_id": "test-002", "raison_sociale": "Institut Sophie"}
        ]))
        .unwrap();

        let deployed = funnel.test_batch(prospects).await.unwrap();

        let ids: Vec<&str> = deployed.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["123-456", "test-002"]);
        let pending = funnel.load_sites(stages::PENDING_SMS).await.unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].deployed_url, deployed[0].deployed_url);
        assert!(temp_dir.path().join("logs/test-run.log").exists());
    }

    #[tokio::test]
    async fn test_batch_is_capped() {
        let temp_dir = TempDir::new().unwrap();
        let funnel = funnel(LocalStorage::new(temp_dir.path()), Vec::new());
        let prospects: Vec<Prospect> = (1..=5)
            .map(|i| Prospect::new(format!("t-{}", i), serde_json::Map::new()))
            .collect();

        let deployed = funnel.test_batch(prospects).await.unwrap();

        let ids: Vec<&str> = deployed.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["t-1", "t-2", "t-3"]);
        assert_eq!(deployed.len(), TEST_BATCH_LIMIT);
    }

    #[tokio::test]
    async fn test_run_requires_credentials() {
        let temp_dir = TempDir::new().unwrap();
        let funnel = Funnel::new(
            LocalStorage::new(temp_dir.path()),
            config(),
            Box::new(Rows(Vec::new())),
            Box::new(PassthroughEnricher),
        );

        let err = funnel.run().await.unwrap_err();
        assert!(matches!(err, FunnelError::MissingConfigError { .. }));
        assert!(funnel.load_sites(stages::DEPLOYED_SITES).await.unwrap().is_empty());
    }
}
