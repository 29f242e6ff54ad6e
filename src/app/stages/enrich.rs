use crate::core::extract::extract_listing;
use crate::domain::model::Prospect;
use crate::domain::ports::{Enricher, PageRenderer};
use crate::utils::error::{FunnelError, Result};
use async_trait::async_trait;
use chrono::Utc;
use url::Url;

/// `<raison_sociale|nom> <ville|code_postal>`, or `None` when both parts are missing.
pub fn search_query(prospect: &Prospect) -> Option<String> {
    let parts: Vec<String> = [
        prospect.display_name(),
        prospect.first_text(&["ville", "code_postal"]),
    ]
    .into_iter()
    .flatten()
    .collect();

    (!parts.is_empty()).then(|| parts.join(" "))
}

/// Map search URL with the query as a single percent-encoded path segment.
pub fn search_url(maps_base: &str, query: &str) -> Result<String> {
    let mut url = Url::parse(maps_base).map_err(|e| FunnelError::ScrapeError {
        message: format!("invalid maps base {}: {}", maps_base, e),
    })?;
    url.path_segments_mut()
        .map_err(|_| FunnelError::ScrapeError {
            message: format!("maps base {} cannot take a path", maps_base),
        })?
        .pop_if_empty()
        .push(query);
    Ok(url.to_string())
}

/// Looks the business up on the map service and merges what the listing shows.
pub struct MapsEnricher {
    renderer: Box<dyn PageRenderer>,
    maps_base: String,
    max_photos: usize,
}

impl MapsEnricher {
    pub fn new(renderer: Box<dyn PageRenderer>, maps_base: impl Into<String>, max_photos: usize) -> Self {
        Self {
            renderer,
            maps_base: maps_base.into(),
            max_photos,
        }
    }

    async fn try_enrich(&self, prospect: &Prospect) -> Result<Option<crate::domain::model::Enrichment>> {
        let Some(query) = search_query(prospect) else {
            return Ok(None);
        };
        let url = search_url(&self.maps_base, &query)?;
        tracing::debug!("Rendering {}", url);

        let html = self.renderer.render(&url).await?;
        extract_listing(&html, self.max_photos).map(Some)
    }
}

#[async_trait]
impl Enricher for MapsEnricher {
    async fn enrich(&self, prospect: Prospect) -> Prospect {
        tracing::info!("🔍 Enriching {}", prospect.label());

        match self.try_enrich(&prospect).await {
            Ok(Some(enrichment)) => {
                tracing::info!(
                    "✅ Enriched: {} photos, rating: {}",
                    enrichment.photos.len(),
                    enrichment.rating.as_deref().unwrap_or("N/A")
                );
                prospect.with_enrichment(enrichment, Utc::now())
            }
            Ok(None) => {
                tracing::warn!("⚠️ Nothing to search for {}, skipping enrichment", prospect.id);
                prospect
            }
            Err(e) => {
                tracing::error!("❌ Enrichment failed for {}: {}", prospect.id, e);
                prospect
            }
        }
    }
}

/// Used when scraping is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughEnricher;

#[async_trait]
impl Enricher for PassthroughEnricher {
    async fn enrich(&self, prospect: Prospect) -> Prospect {
        tracing::debug!("Enrichment disabled, {} unchanged", prospect.id);
        prospect
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FixtureRenderer(Result<String>);

    #[async_trait]
    impl PageRenderer for FixtureRenderer {
        async fn render(&self, _url: &str) -> Result<String> {
            match &self.0 {
                Ok(html) => Ok(html.clone()),
                Err(_) => Err(FunnelError::ScrapeError {
                    message: "browser down".to_string(),
                }),
            }
        }
    }

    fn prospect() -> Prospect {
        serde_json::from_value(json!({
            "_id": "7",
            "raison_sociale": "Plomberie Dupont",
            "ville": "Saint-Étienne"
        }))
        .unwrap()
    }

    #[test]
    fn test_search_url_encoding() {
        let query = search_query(&prospect()).unwrap();
        assert_eq!(query, "Plomberie Dupont Saint-Étienne");
        let url = search_url("https://www.google.com/maps/search/", &query).unwrap();
        assert_eq!(
            url,
            "https://www.google.com/maps/search/Plomberie%20Dupont%20Saint-%C3%89tienne"
        );
    }

    #[test]
    fn test_search_query_postal_code_fallback() {
        let p: Prospect = serde_json::from_value(json!({"_id": "1", "nom": "Léa", "code_postal": "69001"})).unwrap();
        assert_eq!(search_query(&p).as_deref(), Some("Léa 69001"));
        assert_eq!(search_query(&Prospect::new("x", Default::default())), None);
    }

    #[tokio::test]
    async fn test_enrich_merges_listing() {
        let html = r#"<div role="img" aria-label="4,7 étoiles"></div>
            <button aria-label="123 avis">123 avis</button>
            <div data-item-id="address">1 rue de la Paix</div>"#;
        let enricher = MapsEnricher::new(
            Box::new(FixtureRenderer(Ok(html.to_string()))),
            "https://www.google.com/maps/search/",
            3,
        );

        let enriched = enricher.enrich(prospect()).await;
        assert!(enriched.is_enriched());
        assert_eq!(enriched.text("rating").as_deref(), Some("4.7"));
        assert_eq!(enriched.text("review_count").as_deref(), Some("123"));
        assert_eq!(enriched.text("address").as_deref(), Some("1 rue de la Paix"));
        assert!(enriched.fields.get("phone").is_none());
    }

    #[tokio::test]
    async fn test_enrich_error_returns_record_unchanged() {
        let enricher = MapsEnricher::new(
            Box::new(FixtureRenderer(Err(FunnelError::ScrapeError {
                message: String::new(),
            }))),
            "https://www.google.com/maps/search/",
            3,
        );
        let original = prospect();
        assert_eq!(enricher.enrich(original.clone()).await, original);
    }
}
