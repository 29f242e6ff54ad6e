use crate::domain::model::Prospect;

/// Display copy for one business category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryProfile {
    pub key: &'static str,
    pub title: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
    pub services: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateFamily {
    Artisan,
    Commerce,
    Services,
}

pub const DEFAULT_PROFILE: CategoryProfile = CategoryProfile {
    key: "default",
    title: "Artisan",
    icon: "🛠️",
    color: "#10b981",
    services: &[
        "Service personnalisé",
        "Devis gratuit",
        "Intervention rapide",
        "Garantie décennale",
    ],
};

pub const PROFILES: &[CategoryProfile] = &[
    CategoryProfile {
        key: "electricien",
        title: "Électricien",
        icon: "⚡",
        color: "#f59e0b",
        services: &[
            "Installation électrique",
            "Dépannage urgent",
            "Mise aux normes",
            "Tableau électrique",
        ],
    },
    CategoryProfile {
        key: "plombier",
        title: "Plombier",
        icon: "🔧",
        color: "#3b82f6",
        services: &[
            "Dépannage urgent",
            "Installation sanitaire",
            "Chauffage",
            "Débouchage",
        ],
    },
    CategoryProfile {
        key: "fleuriste",
        title: "Fleuriste",
        icon: "🌸",
        color: "#ec4899",
        services: &["Bouquets personnalisés", "Mariage", "Deuil", "Plantes"],
    },
    DEFAULT_PROFILE,
];

const FAMILIES: &[(&str, TemplateFamily)] = &[
    ("electricien", TemplateFamily::Artisan),
    ("plombier", TemplateFamily::Artisan),
    ("fleuriste", TemplateFamily::Commerce),
    ("boulanger", TemplateFamily::Commerce),
    ("coiffeur", TemplateFamily::Services),
];

/// Lowercase, trimmed, with French accents folded: "Électricien " -> "electricien".
pub fn normalize_category(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'à' | 'â' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'î' | 'ï' => 'i',
            'ô' | 'ö' => 'o',
            'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

/// Category key from `activite`, then `metier`, else `default`.
pub fn infer_category(prospect: &Prospect) -> String {
    prospect
        .first_text(&["activite", "metier"])
        .map(|raw| normalize_category(&raw))
        .unwrap_or_else(|| DEFAULT_PROFILE.key.to_string())
}

pub fn profile_for(category: &str) -> &'static CategoryProfile {
    PROFILES
        .iter()
        .find(|profile| profile.key == category)
        .unwrap_or(&DEFAULT_PROFILE)
}

pub fn family_for(category: &str) -> TemplateFamily {
    FAMILIES
        .iter()
        .find(|(key, _)| *key == category)
        .map(|(_, family)| *family)
        .unwrap_or(TemplateFamily::Artisan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_infer_category_fallbacks() {
        let p: Prospect = serde_json::from_value(json!({"_id": "1", "activite": "", "metier": "Plombier"})).unwrap();
        assert_eq!(infer_category(&p), "plombier");

        let p: Prospect = serde_json::from_value(json!({"_id": "2"})).unwrap();
        assert_eq!(infer_category(&p), "default");
    }

    #[test]
    fn test_accented_category_resolves() {
        assert_eq!(profile_for(&normalize_category("Électricien")).title, "Électricien");
    }

    #[test]
    fn test_unknown_category_uses_default_profile() {
        assert_eq!(profile_for("coiffeur"), &DEFAULT_PROFILE);
        assert_eq!(family_for("coiffeur"), TemplateFamily::Services);
        assert_eq!(family_for("boulanger"), TemplateFamily::Commerce);
        assert_eq!(family_for("taxidermiste"), TemplateFamily::Artisan);
    }
}
