use super::{logs_file, pause, GENERATED_SITES};
use crate::config::AppConfig;
use crate::core::render::render_site;
use crate::domain::model::{Prospect, Site};
use crate::domain::ports::{Enricher, Storage};
use crate::utils::error::{FunnelError, Result};
use crate::utils::snapshot;
use chrono::Utc;

fn site_dir(config: &AppConfig, id: &str) -> String {
    snapshot::join(&config.paths.generated_dir, id)
}

/// Enriches one prospect, renders it and writes `index.html` plus `prospect.json`.
pub async fn generate_site<S: Storage>(
    storage: &S,
    enricher: &dyn Enricher,
    config: &AppConfig,
    prospect: Prospect,
) -> Result<Site> {
    if prospect.id.trim().is_empty() {
        return Err(FunnelError::ValidationError {
            message: "prospect has no identifier".to_string(),
        });
    }
    tracing::info!("🎨 Generating site for {}", prospect.label());

    let enriched = enricher.enrich(prospect).await;
    render_enriched(storage, config, enriched).await
}

/// Renders an already enriched prospect (nightly checks replay the stored sample).
pub async fn render_enriched<S: Storage>(
    storage: &S,
    config: &AppConfig,
    prospect: Prospect,
) -> Result<Site> {
    let html = render_site(&prospect, &config.site, Utc::now());

    let dir = site_dir(config, &prospect.id);
    storage
        .write_file(&snapshot::join(&dir, "index.html"), html.as_bytes())
        .await?;
    snapshot::write_json(storage, &snapshot::join(&dir, "prospect.json"), &prospect).await?;

    let repo = config.github.repo_name(&prospect.id);
    let site = Site {
        id: prospect.id.clone(),
        dir: storage.resolve(&dir),
        url: config.github.pages_url(&repo),
        prospect,
        deployed_url: None,
        deployed_at: None,
    };
    tracing::info!("✅ Site generated: {}", site.dir.display());
    Ok(site)
}

/// Up to `prospects_per_run` sites, one at a time; failures are logged and skipped.
///
/// The resulting list is saved for the deploy stage.
pub async fn generate_sites<S: Storage>(
    storage: &S,
    enricher: &dyn Enricher,
    config: &AppConfig,
    prospects: Vec<Prospect>,
) -> Vec<Site> {
    let batch: Vec<Prospect> = prospects
        .into_iter()
        .take(config.pipeline.prospects_per_run)
        .collect();
    let total = batch.len();
    tracing::info!("🚀 Generating {} sites", total);

    let mut sites = Vec::with_capacity(total);
    for (i, prospect) in batch.into_iter().enumerate() {
        let id = prospect.id.clone();
        match generate_site(storage, enricher, config, prospect).await {
            Ok(site) => sites.push(site),
            Err(e) => tracing::error!("❌ Generation failed for {}: {}", id, e),
        }
        if i + 1 < total {
            pause(config.pipeline.generate_delay_ms).await;
        }
    }

    tracing::info!("✅ {}/{} sites generated", sites.len(), total);

    let path = logs_file(&config.paths, GENERATED_SITES);
    if let Err(e) = snapshot::write_json(storage, &path, &sites).await {
        tracing::warn!("⚠️ Could not save {}: {}", path, e);
    }
    sites
}

/// Rebuilds a [`Site`] from a generated directory and its `prospect.json`.
pub async fn load_generated_site<S: Storage>(
    storage: &S,
    config: &AppConfig,
    id: &str,
) -> Result<Site> {
    let dir = site_dir(config, id);
    let prospect: Prospect =
        snapshot::read_json(storage, &snapshot::join(&dir, "prospect.json")).await?;
    Ok(Site {
        id: id.to_string(),
        dir: storage.resolve(&dir),
        url: config.github.pages_url(&config.github.repo_name(id)),
        prospect,
        deployed_url: None,
        deployed_at: None,
    })
}
