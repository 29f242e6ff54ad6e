use super::pause;
use crate::domain::model::Site;
use crate::domain::ports::SitePublisher;

/// Publishes sites one by one with `delay_ms` between them.
///
/// Sites without an identifier are rejected before reaching the publisher.
pub async fn deploy_sites(publisher: &dyn SitePublisher, sites: &[Site], delay_ms: u64) -> Vec<Site> {
    tracing::info!("🚀 Deploying {} sites", sites.len());

    let mut deployed = Vec::with_capacity(sites.len());
    for (i, site) in sites.iter().enumerate() {
        if site.id.trim().is_empty() {
            tracing::error!("❌ Site in {} has no identifier, skipped", site.dir.display());
            continue;
        }

        match publisher.publish(site).await {
            Ok(published) => {
                tracing::info!("✅ Deployed: {}", published.public_url());
                deployed.push(published);
            }
            Err(e) => tracing::error!("❌ Deployment failed for {}: {}", site.id, e),
        }

        if i + 1 < sites.len() {
            pause(delay_ms).await;
        }
    }

    tracing::info!("✅ {}/{} sites deployed", deployed.len(), sites.len());
    deployed
}
