//! Hour-keyed test runner fired by cron: each hour of the night exercises one
//! stage in isolation, the morning slots summarize what the night produced.

use crate::app::funnel::{Funnel, RunOutcome};
use crate::app::stages::{self, generate, notify};
use crate::core::phone::contact_phone;
use crate::core::schedule::{time_slot, RunMode, Schedule};
use crate::domain::model::{Prospect, Site};
use crate::domain::ports::Storage;
use crate::utils::error::Result;
use crate::utils::journal::RunJournal;
use crate::utils::snapshot;

/// Hours whose journals the morning wake inspects.
const NIGHT_HOURS: std::ops::RangeInclusive<u32> = 0..=5;
const SAMPLE_SIZE: usize = 3;
const END_MARKER: &str = "========== END";

#[derive(Debug, Clone, PartialEq)]
pub struct NightlyOutcome {
    pub slot: String,
    pub mode: Option<RunMode>,
    pub success: bool,
}

pub fn journal_name(hour: u32) -> String {
    format!("nightly-{:02}.log", hour)
}

/// True when the last closing line of a nightly journal reports OK.
pub fn journal_ended_ok(content: &str) -> bool {
    content
        .lines()
        .rev()
        .find(|line| line.contains(END_MARKER))
        .is_some_and(|line| line.contains("- OK"))
}

pub struct NightlyRunner<'a, S: Storage> {
    funnel: &'a Funnel<S>,
    schedule: Schedule,
}

impl<'a, S: Storage> NightlyRunner<'a, S> {
    pub fn new(funnel: &'a Funnel<S>) -> Self {
        let schedule = Schedule::new(funnel.config().schedule.slots.clone());
        Self { funnel, schedule }
    }

    /// Runs whatever the schedule maps `hour:minute` to. Never fails: problems
    /// end up in the journal and in `success`.
    pub async fn run_at(&self, hour: u32, minute: u32) -> NightlyOutcome {
        let slot = time_slot(hour, minute);
        let mode = self.schedule.resolve(hour, minute);
        let journal = RunJournal::new(
            self.funnel.storage(),
            self.funnel.logs_file(&journal_name(hour)),
        )
        .with_tag(format!("RUN-{}", slot));

        let label = mode.map(|m| m.label()).unwrap_or("OUT_OF_RANGE");
        journal
            .log(format!("========== START {} - MODE: {} ==========", slot, label))
            .await;

        let success = match mode {
            Some(mode) => match self.run_mode(mode, &journal).await {
                Ok(success) => success,
                Err(e) => {
                    journal.log(format!("❌ Error: {}", e)).await;
                    false
                }
            },
            None => {
                journal.log("⏸️ Outside the schedule, skipping").await;
                false
            }
        };

        journal
            .log(format!(
                "{} {} - {} ==========",
                END_MARKER,
                slot,
                if success { "OK" } else { "WARN" }
            ))
            .await;

        NightlyOutcome {
            slot,
            mode,
            success,
        }
    }

    async fn run_mode(&self, mode: RunMode, journal: &RunJournal<'_, S>) -> Result<bool> {
        match mode {
            RunMode::FetchCheck => self.fetch_check(journal).await,
            RunMode::ScraperCheck => self.scraper_check(journal).await,
            RunMode::GenerateCheck => self.generate_check(journal).await,
            RunMode::DeployCheck => self.deploy_check(journal).await,
            RunMode::SmsCheck => self.sms_check(journal).await,
            RunMode::EndToEndCheck => self.end_to_end_check(journal).await,
            RunMode::MorningWake => self.morning_wake(journal).await,
            RunMode::MorningBatch => self.morning_batch(journal).await,
            RunMode::FullRun => {
                let outcome = self.funnel.run().await?;
                journal
                    .log(format!("📊 Full run: {}", outcome.reason()))
                    .await;
                Ok(matches!(outcome, RunOutcome::Completed(_)))
            }
        }
    }

    fn storage(&self) -> &S {
        self.funnel.storage()
    }

    fn logs_file(&self, name: &str) -> String {
        self.funnel.logs_file(name)
    }

    async fn fetch_check(&self, journal: &RunJournal<'_, S>) -> Result<bool> {
        journal.log("🔍 FETCH CHECK: reading the prospect sheet").await;
        let prospects = self.funnel.fetch().await;
        journal
            .log(format!("✅ {} prospects fetched", prospects.len()))
            .await;

        let sample: Vec<&Prospect> = prospects.iter().take(SAMPLE_SIZE).collect();
        snapshot::write_json(
            self.storage(),
            &self.logs_file(stages::SAMPLE_PROSPECTS),
            &sample,
        )
        .await?;
        journal.log("📁 Sample saved").await;
        Ok(true)
    }

    async fn scraper_check(&self, journal: &RunJournal<'_, S>) -> Result<bool> {
        journal.log("🔎 SCRAPER CHECK: map listing enrichment").await;
        let path = self.logs_file(stages::SAMPLE_PROSPECTS);
        if !self.storage().exists(&path).await {
            journal.log("⚠️ No sample prospects - SKIP").await;
            return Ok(false);
        }

        let sample: Vec<Prospect> = snapshot::read_json(self.storage(), &path).await?;
        let Some(first) = sample.into_iter().next() else {
            journal.log("⚠️ Sample is empty - SKIP").await;
            return Ok(false);
        };

        let enriched = self.funnel.enricher().enrich(first).await;
        journal
            .log(format!(
                "✅ Enriched: {} photos, rating: {}",
                enriched.photos().len(),
                enriched.text("rating").as_deref().unwrap_or("N/A")
            ))
            .await;
        snapshot::write_json(
            self.storage(),
            &self.logs_file(stages::ENRICHED_SAMPLE),
            &enriched,
        )
        .await?;
        Ok(true)
    }

    async fn generate_check(&self, journal: &RunJournal<'_, S>) -> Result<bool> {
        journal.log("🎨 GENERATE CHECK: rendering the enriched sample").await;
        let path = self.logs_file(stages::ENRICHED_SAMPLE);
        if !self.storage().exists(&path).await {
            journal.log("⚠️ No enriched sample - SKIP").await;
            return Ok(false);
        }

        let prospect: Prospect = snapshot::read_json(self.storage(), &path).await?;
        let site =
            generate::render_enriched(self.storage(), self.funnel.config(), prospect).await?;
        journal.log(format!("✅ Site generated: {}", site.id)).await;
        journal
            .log(format!("📁 File: {}/index.html", site.dir.display()))
            .await;

        let html = self
            .storage()
            .read_file(&snapshot::join(
                &snapshot::join(&self.funnel.config().paths.generated_dir, &site.id),
                "index.html",
            ))
            .await?;
        journal
            .log(format!("📊 Size: {:.2} KB", html.len() as f64 / 1024.0))
            .await;
        Ok(true)
    }

    async fn deploy_check(&self, journal: &RunJournal<'_, S>) -> Result<bool> {
        journal.log("🚀 DEPLOY CHECK: GitHub Pages").await;
        let generated_dir = &self.funnel.config().paths.generated_dir;
        let dirs = self.storage().list_dir(generated_dir).await?;
        let Some(id) = dirs.first() else {
            journal.log("⚠️ No generated site - SKIP").await;
            return Ok(false);
        };

        let site = generate::load_generated_site(self.storage(), self.funnel.config(), id).await?;
        let deployed = self.funnel.publisher()?.publish(&site).await?;
        journal
            .log(format!("✅ Deployed: {}", deployed.public_url()))
            .await;

        let mut pending = self.funnel.load_sites(stages::PENDING_SMS).await?;
        pending.push(deployed);
        self.funnel.save_sites(stages::PENDING_SMS, &pending).await?;
        Ok(true)
    }

    async fn load_pending(&self, journal: &RunJournal<'_, S>) -> Result<Option<Vec<Site>>> {
        if !self
            .storage()
            .exists(&self.logs_file(stages::PENDING_SMS))
            .await
        {
            journal.log("⚠️ No site waiting for SMS - SKIP").await;
            return Ok(None);
        }
        Ok(Some(self.funnel.load_sites(stages::PENDING_SMS).await?))
    }

    async fn sms_check(&self, journal: &RunJournal<'_, S>) -> Result<bool> {
        journal.log("📱 SMS CHECK: readiness only, nothing is sent").await;
        let Some(sites) = self.load_pending(journal).await? else {
            return Ok(false);
        };
        journal
            .log(format!("📊 {} sites waiting for SMS", sites.len()))
            .await;

        let ready = notify::sms_ready(&sites);
        for site in &sites {
            let name = site.prospect.label();
            match contact_phone(&site.prospect) {
                Some(phone) if ready.iter().any(|r| r.id == site.id) => {
                    journal.log(format!("  ✅ {}: {}", name, phone)).await
                }
                _ => journal.log(format!("  ⚠️ {}: no phone", name)).await,
            }
        }

        journal
            .log(format!("✅ {}/{} SMS can be sent", ready.len(), sites.len()))
            .await;
        journal
            .log("💡 To send: sitevitrine sms --batch 5")
            .await;
        Ok(true)
    }

    async fn end_to_end_check(&self, journal: &RunJournal<'_, S>) -> Result<bool> {
        journal.log("🧪 E2E CHECK: artifact checklist").await;
        let generated = self
            .storage()
            .list_dir(&self.funnel.config().paths.generated_dir)
            .await?;

        let checks = [
            (
                "prospects",
                self.storage()
                    .exists(&self.logs_file(stages::SAMPLE_PROSPECTS))
                    .await,
            ),
            (
                "enriched",
                self.storage()
                    .exists(&self.logs_file(stages::ENRICHED_SAMPLE))
                    .await,
            ),
            ("sites", !generated.is_empty()),
            (
                "deployed",
                self.storage()
                    .exists(&self.logs_file(stages::PENDING_SMS))
                    .await,
            ),
        ];

        journal.log("📋 Checklist:").await;
        for (name, ok) in &checks {
            journal
                .log(format!("  {} {}", if *ok { "✅" } else { "❌" }, name))
                .await;
        }

        let all_ok = checks.iter().all(|(_, ok)| *ok);
        if all_ok {
            journal.log("✅ Everything is ready for the SMS batch").await;
        } else {
            journal
                .log("⚠️ Some artifacts are missing, rerun the failed slots")
                .await;
        }
        Ok(all_ok)
    }

    async fn morning_wake(&self, journal: &RunJournal<'_, S>) -> Result<bool> {
        journal.log("☀️ MORNING WAKE: checking the night").await;

        let mut all_ok = true;
        for hour in NIGHT_HOURS {
            let name = journal_name(hour);
            let path = self.logs_file(&name);
            let (exists, ok) = if self.storage().exists(&path).await {
                let content = self.storage().read_file(&path).await?;
                (true, journal_ended_ok(&String::from_utf8_lossy(&content)))
            } else {
                (false, false)
            };
            all_ok &= ok;

            let state = match (exists, ok) {
                (false, _) => "MISSING",
                (true, true) => "OK",
                (true, false) => "WARN",
            };
            journal
                .log(format!("{} {}: {}", if ok { "✅" } else { "⚠️" }, name, state))
                .await;
        }

        journal
            .log(if all_ok {
                "✅ Night OK - ready for the day"
            } else {
                "⚠️ Some night runs failed"
            })
            .await;
        Ok(all_ok)
    }

    async fn morning_batch(&self, journal: &RunJournal<'_, S>) -> Result<bool> {
        journal.log("🚀 MORNING BATCH: sites ready for SMS").await;
        let Some(sites) = self.load_pending(journal).await? else {
            return Ok(false);
        };

        let ready = notify::sms_ready(&sites);
        journal
            .log(format!(
                "📦 {} sites deployed, {} ready for SMS",
                sites.len(),
                ready.len()
            ))
            .await;
        for site in ready.iter().take(SAMPLE_SIZE) {
            journal
                .log(format!("  🌐 {}: {}", site.prospect.label(), site.public_url()))
                .await;
        }
        Ok(true)
    }
}
