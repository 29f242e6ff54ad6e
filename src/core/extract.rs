//! DOM extraction of a map listing page into an [`Enrichment`].

use crate::domain::model::Enrichment;
use crate::utils::error::{FunnelError, Result};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

const RATING_SELECTOR: &str = r#"[role="img"][aria-label*="étoile"]"#;
const REVIEWS_SELECTOR: &str = r#"button[aria-label*="avis"]"#;
const ADDRESS_SELECTOR: &str = r#"[data-item-id="address"]"#;
const PHONE_SELECTOR: &str = r#"[data-tooltip="Copier le numéro de téléphone"]"#;
const PHOTO_SELECTOR: &str = r#"img[src*="googleusercontent"], img[src*="ggpht"]"#;

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| FunnelError::ScrapeError {
        message: format!("invalid selector {}: {}", css, e),
    })
}

fn pattern(re: &str) -> Result<Regex> {
    Regex::new(re).map_err(|e| FunnelError::ScrapeError {
        message: format!("invalid pattern {}: {}", re, e),
    })
}

fn element_text(element: ElementRef<'_>) -> Option<String> {
    let text = element.text().collect::<String>();
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}

/// Pulls rating, review count, address, phone and up to `max_photos` photo URLs.
///
/// Fields that are not on the page stay `None`/empty.
pub fn extract_listing(html: &str, max_photos: usize) -> Result<Enrichment> {
    let document = Html::parse_document(html);
    let mut enrichment = Enrichment::default();

    let rating_re = pattern(r"\d+(?:[.,]\d+)?")?;
    if let Some(el) = document.select(&selector(RATING_SELECTOR)?).next() {
        enrichment.rating = el
            .value()
            .attr("aria-label")
            .and_then(|label| rating_re.find(label))
            .map(|m| m.as_str().replace(',', "."));
    }

    let count_re = pattern(r"\d[\d\s\u{a0}\u{202f}]*")?;
    if let Some(el) = document.select(&selector(REVIEWS_SELECTOR)?).next() {
        let text = el.text().collect::<String>();
        enrichment.review_count = count_re.find(&text).and_then(|m| {
            m.as_str()
                .chars()
                .filter(char::is_ascii_digit)
                .collect::<String>()
                .parse()
                .ok()
        });
    }

    enrichment.address = document
        .select(&selector(ADDRESS_SELECTOR)?)
        .next()
        .and_then(element_text);

    enrichment.phone = document
        .select(&selector(PHONE_SELECTOR)?)
        .next()
        .and_then(element_text);

    enrichment.photos = document
        .select(&selector(PHOTO_SELECTOR)?)
        .filter_map(|img| img.value().attr("src"))
        .map(str::to_string)
        .take(max_photos)
        .collect();

    Ok(enrichment)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
<html><body>
  <div role="main">
    <span role="img" aria-label="4,6 étoiles"></span>
    <button aria-label="128 avis">(1 284)</button>
    <button data-item-id="address"><div>  12 Rue de la République,
        69002 Lyon </div></button>
    <button data-tooltip="Copier le numéro de téléphone">04 72 00 00 00</button>
    <img src="https://lh5.googleusercontent.com/p/one=w400">
    <img src="https://maps.gstatic.com/icon.png">
    <img src="https://lh3.ggpht.com/two">
    <img src="https://lh3.googleusercontent.com/three">
    <img src="https://lh3.googleusercontent.com/four">
  </div>
</body></html>
"#;

    #[test]
    fn test_extract_full_listing() {
        let enrichment = extract_listing(LISTING, 3).unwrap();

        assert_eq!(enrichment.rating.as_deref(), Some("4.6"));
        assert_eq!(enrichment.review_count, Some(1284));
        assert_eq!(
            enrichment.address.as_deref(),
            Some("12 Rue de la République, 69002 Lyon")
        );
        assert_eq!(enrichment.phone.as_deref(), Some("04 72 00 00 00"));
        assert_eq!(
            enrichment.photos,
            vec![
                "https://lh5.googleusercontent.com/p/one=w400".to_string(),
                "https://lh3.ggpht.com/two".to_string(),
                "https://lh3.googleusercontent.com/three".to_string(),
            ]
        );
    }

    #[test]
    fn test_extract_empty_page() {
        let enrichment = extract_listing("<html><body><p>Aucun résultat</p></body></html>", 3).unwrap();
        assert!(enrichment.is_empty());
    }
}
