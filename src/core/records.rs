//! Mapping of raw sheet rows to prospects.

use crate::domain::model::Prospect;
use serde_json::{Map, Value};

/// "Raison  Sociale" -> "raison_sociale".
pub fn normalize_header(header: &str) -> String {
    header
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Keeps `[A-Za-z0-9_-]`, replacing anything else with `-`, so the id is safe
/// as a directory and repository name.
pub fn sanitize_id(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// `id`, then `siret`, then `prospect_<millis>_<index>`.
pub fn derive_id(prospect: &Prospect, index: usize, now_millis: i64) -> String {
    prospect
        .first_text(&["id", "siret"])
        .map(|raw| sanitize_id(&raw))
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| format!("prospect_{}_{}", now_millis, index))
}

/// First row is the header row. Short rows are padded with empty strings.
///
/// `_rowIndex` is the 1-based sheet row (the header is row 1).
pub fn rows_to_prospects(rows: &[Vec<String>], now_millis: i64) -> Vec<Prospect> {
    let Some((headers, data)) = rows.split_first() else {
        return Vec::new();
    };
    let keys: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();

    data.iter()
        .enumerate()
        .map(|(index, row)| {
            let mut fields = Map::new();
            for (i, key) in keys.iter().enumerate() {
                if key.is_empty() {
                    continue;
                }
                let cell = row.get(i).cloned().unwrap_or_default();
                fields.insert(key.clone(), Value::String(cell));
            }
            let mut prospect = Prospect::new(String::new(), fields);
            prospect.row_index = Some(index + 2);
            prospect.id = derive_id(&prospect, index, now_millis);
            prospect
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("Raison Sociale"), "raison_sociale");
        assert_eq!(normalize_header("  Code   Postal "), "code_postal");
        assert_eq!(normalize_header("SIRET"), "siret");
    }

    #[test]
    fn test_rows_to_prospects() {
        let rows = vec![
            row(&["ID", "Raison Sociale", "Ville", "Site Web"]),
            row(&["17", "Fleurs & Co", "Nantes"]),
            row(&["", "Sans Id", "Brest", ""]),
        ];

        let prospects = rows_to_prospects(&rows, 1_700_000_000_000);
        assert_eq!(prospects.len(), 2);

        assert_eq!(prospects[0].id, "17");
        assert_eq!(prospects[0].row_index, Some(2));
        assert_eq!(prospects[0].text("raison_sociale").as_deref(), Some("Fleurs & Co"));
        assert_eq!(prospects[0].fields.get("site_web"), Some(&Value::String(String::new())));

        assert_eq!(prospects[1].id, "prospect_1700000000000_1");
        assert_eq!(prospects[1].row_index, Some(3));
    }

    #[test]
    fn test_siret_id_is_sanitized() {
        let rows = vec![row(&["siret"]), row(&["123 456 789 00011"])];
        let prospects = rows_to_prospects(&rows, 0);
        assert_eq!(prospects[0].id, "123-456-789-00011");
    }

    #[test]
    fn test_no_rows() {
        assert!(rows_to_prospects(&[], 0).is_empty());
        assert!(rows_to_prospects(&[row(&["id"])], 0).is_empty());
    }
}
