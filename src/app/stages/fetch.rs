use crate::config::PathsConfig;
use crate::core::records::rows_to_prospects;
use crate::domain::model::Prospect;
use crate::domain::ports::{ProspectSource, Storage};
use crate::utils::error::Result;
use crate::utils::snapshot;
use chrono::Utc;

/// Pulls the sheet, keeps the eligible prospects and snapshots them under the prospects directory.
///
/// Any failure falls back to the newest snapshot, then to an empty list.
pub async fn fetch_prospects<S: Storage>(
    storage: &S,
    source: &dyn ProspectSource,
    paths: &PathsConfig,
) -> Vec<Prospect> {
    tracing::info!("🔍 Fetching prospects from {}", source.describe());

    match fetch_and_snapshot(storage, source, paths).await {
        Ok(prospects) => prospects,
        Err(e) => {
            tracing::error!("❌ Prospect fetch failed: {}", e);
            load_latest_snapshot(storage, &paths.prospects_dir).await
        }
    }
}

async fn fetch_and_snapshot<S: Storage>(
    storage: &S,
    source: &dyn ProspectSource,
    paths: &PathsConfig,
) -> Result<Vec<Prospect>> {
    let rows = source.fetch_rows().await?;
    if rows.is_empty() {
        tracing::warn!("⚠️ Sheet returned no rows");
        return Ok(Vec::new());
    }

    let now = Utc::now().timestamp_millis();
    let all = rows_to_prospects(&rows, now);
    let total = all.len();
    let eligible: Vec<Prospect> = all.into_iter().filter(Prospect::is_eligible).collect();

    let path = snapshot::join(&paths.prospects_dir, &format!("prospects_{}.json", now));
    snapshot::write_json(storage, &path, &eligible).await?;

    tracing::info!("✅ {} prospects to process ({} total)", eligible.len(), total);
    tracing::info!("📁 Saved to {}", path);
    Ok(eligible)
}

/// Newest `prospects_*.json`, or nothing.
pub async fn load_latest_snapshot<S: Storage>(storage: &S, dir: &str) -> Vec<Prospect> {
    let latest = match snapshot::latest_snapshot(storage, dir).await {
        Ok(Some(path)) => path,
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::warn!("⚠️ Could not list {}: {}", dir, e);
            return Vec::new();
        }
    };

    tracing::info!("📂 Fallback: reading latest snapshot {}", latest);
    match snapshot::read_json(storage, &latest).await {
        Ok(prospects) => prospects,
        Err(e) => {
            tracing::warn!("⚠️ Snapshot {} unreadable: {}", latest, e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::LocalStorage;
    use crate::utils::error::FunnelError;
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct StaticSource(Vec<Vec<String>>);

    #[async_trait]
    impl ProspectSource for StaticSource {
        async fn fetch_rows(&self) -> Result<Vec<Vec<String>>> {
            Ok(self.0.clone())
        }

        fn describe(&self) -> String {
            "static rows".to_string()
        }
    }

    struct FailingSource;

    #[async_trait]
    impl ProspectSource for FailingSource {
        async fn fetch_rows(&self) -> Result<Vec<Vec<String>>> {
            Err(FunnelError::service("Google Sheets", 503, "unavailable"))
        }

        fn describe(&self) -> String {
            "failing source".to_string()
        }
    }

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[tokio::test]
    async fn test_filters_eligible_and_snapshots() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());
        let source = StaticSource(rows(&[
            &["id", "nom", "site_web", "statut"],
            &["1", "Sans site", "", ""],
            &["2", "Avec site", "https://exemple.fr", ""],
            &["3", "Déjà contacté", "NULL", "contacted"],
            &["4", "Site NULL", "NULL", "new"],
            &["5", "Créé", "", "site_created"],
        ]));

        let prospects = fetch_prospects(&storage, &source, &PathsConfig::default()).await;
        let ids: Vec<&str> = prospects.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "4"]);

        let names = storage.list_dir("prospects").await.unwrap();
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("prospects_") && names[0].ends_with(".json"));
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_latest_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());

        let old = vec![Prospect::new("old", serde_json::Map::new())];
        let new = vec![Prospect::new("new", serde_json::Map::new())];
        snapshot::write_json(&storage, "prospects/prospects_1000.json", &old)
            .await
            .unwrap();
        snapshot::write_json(&storage, "prospects/prospects_2000.json", &new)
            .await
            .unwrap();

        let prospects = fetch_prospects(&storage, &FailingSource, &PathsConfig::default()).await;
        assert_eq!(prospects.len(), 1);
        assert_eq!(prospects[0].id, "new");
    }

    #[tokio::test]
    async fn test_hand_written_snapshot_with_numeric_ids() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());
        storage
            .write_file(
                "prospects/prospects_1.json",
                br#"[{"_id": 17, "nom": "A"}, {"_id": "b-2", "nom": "B"}]"#,
            )
            .await
            .unwrap();

        let prospects = load_latest_snapshot(&storage, "prospects").await;
        let ids: Vec<&str> = prospects.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["17", "b-2"]);
    }

    #[tokio::test]
    async fn test_failure_without_snapshot_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());
        let prospects = fetch_prospects(&storage, &FailingSource, &PathsConfig::default()).await;
        assert!(prospects.is_empty());
    }
}
