use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Placeholder the sheet uses for empty cells.
pub const NULL_MARKER: &str = "NULL";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProspectStatus {
    New,
    Contacted,
    SiteCreated,
}

impl ProspectStatus {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "contacted" => ProspectStatus::Contacted,
            "site_created" => ProspectStatus::SiteCreated,
            _ => ProspectStatus::New,
        }
    }
}

/// A business record imported from the spreadsheet, keyed by normalized header names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prospect {
    #[serde(rename = "_id", default, deserialize_with = "scalar_string")]
    pub id: String,
    #[serde(
        rename = "_rowIndex",
        default,
        deserialize_with = "scalar_index",
        skip_serializing_if = "Option::is_none"
    )]
    pub row_index: Option<usize>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Hand-edited prospect files may carry numeric ids.
fn scalar_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

fn scalar_index<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<usize>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

impl Prospect {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            row_index: None,
            fields,
        }
    }

    /// Returns the trimmed value of `key` when it carries real content.
    ///
    /// Empty strings and the sheet's `NULL` marker count as missing.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            Value::String(s) => {
                let s = s.trim();
                if s.is_empty() || s == NULL_MARKER {
                    None
                } else {
                    Some(s.to_string())
                }
            }
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// First key of `keys` that has content.
    pub fn first_text(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| self.text(key))
    }

    pub fn display_name(&self) -> Option<String> {
        self.first_text(&["raison_sociale", "nom"])
    }

    /// Name for log lines, never empty.
    pub fn label(&self) -> String {
        self.display_name().unwrap_or_else(|| self.id.clone())
    }

    pub fn status(&self) -> ProspectStatus {
        self.text("statut")
            .map(|s| ProspectStatus::parse(&s))
            .unwrap_or(ProspectStatus::New)
    }

    pub fn has_website(&self) -> bool {
        self.text("site_web").is_some()
    }

    /// Prospects without a website that nobody has contacted yet.
    pub fn is_eligible(&self) -> bool {
        !self.has_website() && self.status() == ProspectStatus::New
    }

    pub fn photos(&self) -> Vec<String> {
        match self.fields.get("photos") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn is_enriched(&self) -> bool {
        matches!(self.fields.get("_enriched"), Some(Value::Bool(true)))
    }

    /// Merges the fields found by the scraper; fields it did not find are left alone.
    pub fn with_enrichment(mut self, enrichment: Enrichment, at: DateTime<Utc>) -> Self {
        if !enrichment.photos.is_empty() {
            self.fields
                .insert("photos".to_string(), Value::from(enrichment.photos));
        }
        if let Some(rating) = enrichment.rating {
            self.fields.insert("rating".to_string(), Value::String(rating));
        }
        if let Some(count) = enrichment.review_count {
            self.fields
                .insert("review_count".to_string(), Value::from(count));
        }
        if let Some(address) = enrichment.address {
            self.fields.insert("address".to_string(), Value::String(address));
        }
        if let Some(phone) = enrichment.phone {
            self.fields.insert("phone".to_string(), Value::String(phone));
        }
        self.fields.insert("_enriched".to_string(), Value::Bool(true));
        self.fields
            .insert("_enrichedAt".to_string(), Value::String(at.to_rfc3339()));
        self
    }
}

/// Data scraped from a map listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Enrichment {
    pub photos: Vec<String>,
    pub rating: Option<String>,
    pub review_count: Option<u32>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

impl Enrichment {
    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
            && self.rating.is_none()
            && self.review_count.is_none()
            && self.address.is_none()
            && self.phone.is_none()
    }
}

/// A generated site and, once published, where it lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: String,
    pub dir: PathBuf,
    #[serde(default)]
    pub url: String,
    pub prospect: Prospect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployed_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployed_at: Option<DateTime<Utc>>,
}

impl Site {
    pub fn is_deployed(&self) -> bool {
        self.deployed_url.is_some()
    }

    pub fn public_url(&self) -> &str {
        self.deployed_url.as_deref().unwrap_or(&self.url)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Sms,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub sender_name: String,
    pub sender_email: String,
    pub to_email: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmsMessage {
    pub sender: String,
    pub recipient: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReceipt {
    pub site: String,
    pub channel: Channel,
    pub recipient: String,
    pub message_id: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportedSite {
    pub id: String,
    pub url: String,
    pub prospect: Option<String>,
}

/// Summary written after a full funnel run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub date: DateTime<Utc>,
    pub prospects: usize,
    pub generated: usize,
    pub deployed: usize,
    pub emails_sent: usize,
    pub sites: Vec<ReportedSite>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn prospect(value: Value) -> Prospect {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_text_treats_null_marker_as_missing() {
        let p = prospect(json!({"_id": "p1", "nom": "NULL", "raison_sociale": "  ", "ville": " Lyon "}));
        assert_eq!(p.text("nom"), None);
        assert_eq!(p.text("raison_sociale"), None);
        assert_eq!(p.text("ville").as_deref(), Some("Lyon"));
        assert_eq!(p.label(), "p1");
    }

    #[test]
    fn test_eligibility() {
        assert!(prospect(json!({"_id": "a", "site_web": ""})).is_eligible());
        assert!(prospect(json!({"_id": "b", "site_web": "NULL", "statut": "new"})).is_eligible());
        assert!(!prospect(json!({"_id": "c", "site_web": "https://x.fr"})).is_eligible());
        assert!(!prospect(json!({"_id": "d", "statut": "contacted"})).is_eligible());
        assert!(!prospect(json!({"_id": "e", "statut": "site_created"})).is_eligible());
    }

    #[test]
    fn test_numeric_id_and_row_index_are_accepted() {
        let p = prospect(json!({"_id": 17, "_rowIndex": "4", "nom": "A"}));
        assert_eq!(p.id, "17");
        assert_eq!(p.row_index, Some(4));
        assert_eq!(p.text("nom").as_deref(), Some("A"));

        let p = prospect(json!({"_id": null, "nom": "B"}));
        assert_eq!(p.id, "");
        assert_eq!(p.row_index, None);
    }

    #[test]
    fn test_snapshot_keeps_underscore_keys() {
        let p = prospect(json!({"_id": "42", "_rowIndex": 3, "nom": "Dupont"}));
        assert_eq!(p.id, "42");
        assert_eq!(p.row_index, Some(3));
        assert!(!p.fields.contains_key("_id"));

        let back = serde_json::to_value(&p).unwrap();
        assert_eq!(back["_id"], "42");
        assert_eq!(back["_rowIndex"], 3);
        assert_eq!(back["nom"], "Dupont");
    }

    #[test]
    fn test_with_enrichment_omits_missing_fields() {
        let p = prospect(json!({"_id": "1", "adresse": "1 rue de la Paix"}));
        let enrichment = Enrichment {
            rating: Some("4.6".to_string()),
            ..Default::default()
        };
        let enriched = p.with_enrichment(enrichment, Utc::now());

        assert_eq!(enriched.text("rating").as_deref(), Some("4.6"));
        assert!(!enriched.fields.contains_key("address"));
        assert!(!enriched.fields.contains_key("photos"));
        assert!(enriched.is_enriched());
        assert_eq!(enriched.text("adresse").as_deref(), Some("1 rue de la Paix"));
    }

    #[test]
    fn test_site_snapshot_uses_camel_case() {
        let site = Site {
            id: "1".to_string(),
            dir: PathBuf::from("generated/1"),
            url: "https://owner.github.io/sitevitrine-1".to_string(),
            prospect: Prospect::new("1", Map::new()),
            deployed_url: Some("https://owner.github.io/sitevitrine-1/".to_string()),
            deployed_at: None,
        };
        let value = serde_json::to_value(&site).unwrap();
        assert_eq!(value["deployedUrl"], "https://owner.github.io/sitevitrine-1/");
        assert!(value.get("deployedAt").is_none());
        assert_eq!(site.public_url(), "https://owner.github.io/sitevitrine-1/");
    }
}
