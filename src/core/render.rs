//! Pure rendering of a prospect into a complete static HTML page.
//!
//! Nothing here touches the network or the file system: the generate stage feeds
//! an (enriched) prospect in and writes the returned string to disk.

use crate::config::SiteConfig;
use crate::core::category::{self, CategoryProfile, TemplateFamily, DEFAULT_PROFILE};
use crate::domain::model::Prospect;
use chrono::{DateTime, Datelike, Utc};

const DEFAULT_YEARS_EXPERIENCE: i32 = 10;
/// Founding years further back than this are treated as typos.
const MAX_YEARS_EXPERIENCE: i32 = 200;
const ABOUT_PHOTOS: usize = 2;

const STYLE: &str = r#"
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body { font-family: 'Inter', sans-serif; line-height: 1.6; color: #333; }
        .hero { background: linear-gradient(135deg, __ACCENT__22 0%, __ACCENT__11 100%); padding: 80px 20px; text-align: center; }
        .hero-icon { font-size: 64px; margin-bottom: 20px; }
        .hero h1 { font-size: 2.5rem; font-weight: 700; color: #1f2937; margin-bottom: 16px; }
        .hero p { font-size: 1.25rem; color: #6b7280; max-width: 600px; margin: 0 auto 32px; }
        .btn { display: inline-block; padding: 16px 32px; background: __ACCENT__; color: white; text-decoration: none; border-radius: 8px; font-weight: 600; transition: transform 0.2s; }
        .btn:hover { transform: translateY(-2px); }
        .section { padding: 64px 20px; max-width: 1200px; margin: 0 auto; }
        .section h2 { font-size: 2rem; text-align: center; margin-bottom: 48px; color: #1f2937; }
        .services { display: grid; grid-template-columns: repeat(auto-fit, minmax(250px, 1fr)); gap: 24px; }
        .service-card { background: white; padding: 32px; border-radius: 12px; box-shadow: 0 4px 6px rgba(0,0,0,0.1); border-left: 4px solid __ACCENT__; }
        .service-card h3 { font-size: 1.25rem; margin-bottom: 12px; color: #1f2937; }
        .service-card p { color: #6b7280; }
        .about { background: #f9fafb; }
        .about-content { display: grid; grid-template-columns: 1fr 1fr; gap: 48px; align-items: center; }
        .about-text h3 { font-size: 1.5rem; margin-bottom: 16px; }
        .stats { display: flex; gap: 32px; margin-top: 24px; }
        .stat { text-align: center; }
        .stat-number { font-size: 2rem; font-weight: 700; color: __ACCENT__; }
        .stat-label { font-size: 0.875rem; color: #6b7280; }
        .photos { display: grid; grid-template-columns: repeat(auto-fit, minmax(300px, 1fr)); gap: 16px; margin-top: 32px; }
        .photo { border-radius: 12px; overflow: hidden; aspect-ratio: 16/9; }
        .photo img { width: 100%; height: 100%; object-fit: cover; }
        .contact { background: #1f2937; color: white; text-align: center; }
        .contact h2 { color: white; }
        .contact a { color: white; }
        .contact-info { display: flex; flex-wrap: wrap; justify-content: center; gap: 32px; margin-top: 32px; }
        .contact-item { padding: 24px; background: rgba(255,255,255,0.1); border-radius: 12px; }
        .contact-item strong { display: block; margin-bottom: 8px; color: __ACCENT__; }
        .cta { background: __ACCENT__; padding: 64px 20px; text-align: center; color: white; }
        .cta h2 { color: white; margin-bottom: 24px; }
        .cta p { font-size: 1.25rem; margin-bottom: 24px; opacity: 0.9; }
        .btn-white { background: white; color: __ACCENT__; }
        footer { padding: 32px; text-align: center; background: #111827; color: #9ca3af; font-size: 0.875rem; }
        footer a { color: __ACCENT__; }
        .badge { display: inline-block; padding: 4px 12px; background: __ACCENT__22; color: __ACCENT__; border-radius: 20px; font-size: 0.875rem; font-weight: 500; margin-bottom: 16px; }
        .rating { display: inline-flex; align-items: center; gap: 8px; background: white; padding: 8px 16px; border-radius: 20px; font-weight: 600; }
        .stars { color: #fbbf24; }
        @media (max-width: 768px) {
            .hero h1 { font-size: 1.875rem; }
            .about-content { grid-template-columns: 1fr; }
            .stats { flex-direction: column; gap: 16px; }
        }
"#;

/// Template data: every value already resolved through its fallback chain.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteContent {
    pub name: String,
    pub category: String,
    pub family: TemplateFamily,
    pub title: String,
    pub icon: String,
    pub color: String,
    pub services: Vec<String>,
    pub description: String,
    pub address: String,
    pub phone: String,
    pub phone_href: Option<String>,
    pub email: String,
    pub photos: Vec<String>,
    pub rating: Option<String>,
    pub review_count: Option<String>,
    pub years_experience: i32,
    pub siret: Option<String>,
    pub seo_title: String,
    pub seo_description: String,
    pub year: i32,
}

impl SiteContent {
    pub fn from_prospect(prospect: &Prospect, now: DateTime<Utc>) -> Self {
        let category = category::infer_category(prospect);
        let profile = category::profile_for(&category);
        let family = category::family_for(&category);
        Self::with_profile(prospect, profile, family, category, now)
    }

    pub fn with_profile(
        prospect: &Prospect,
        profile: &CategoryProfile,
        family: TemplateFamily,
        category: String,
        now: DateTime<Utc>,
    ) -> Self {
        let year = now.year();
        let name = prospect
            .display_name()
            .unwrap_or_else(|| "Votre Entreprise".to_string());
        let city = prospect.text("ville");
        let phone = prospect.first_text(&["phone", "telephone", "portable"]);
        let services: Vec<String> = profile.services.iter().map(|s| s.to_string()).collect();

        let years_experience = prospect
            .text("annee_creation")
            .and_then(|raw| raw.parse::<i32>().ok())
            .and_then(|founded| year.checked_sub(founded))
            .filter(|years| (0..=MAX_YEARS_EXPERIENCE).contains(years))
            .unwrap_or(DEFAULT_YEARS_EXPERIENCE);

        let seo_title = match &city {
            Some(city) => format!("{} {} - {}", profile.title, city, name),
            None => format!("{} - {}", profile.title, name),
        };
        let seo_description = format!(
            "{} professionnel à {}. {}. Devis gratuit.",
            profile.title,
            city.as_deref().unwrap_or("votre service"),
            services.join(", ")
        );

        Self {
            description: prospect
                .text("description")
                .unwrap_or_else(|| format!("{} professionnel à votre service", profile.title)),
            address: prospect
                .first_text(&["address", "adresse", "ville"])
                .unwrap_or_else(|| "Sur rendez-vous".to_string()),
            phone_href: phone.as_deref().map(tel_href),
            phone: phone.unwrap_or_else(|| "Contactez-nous".to_string()),
            email: prospect
                .text("email")
                .unwrap_or_else(|| "contact@example.com".to_string()),
            photos: prospect.photos(),
            rating: prospect.text("rating"),
            review_count: prospect.text("review_count"),
            siret: prospect.text("siret"),
            title: profile.title.to_string(),
            icon: profile.icon.to_string(),
            color: if is_hex_color(profile.color) {
                profile.color.to_string()
            } else {
                DEFAULT_PROFILE.color.to_string()
            },
            name,
            category,
            family,
            services,
            years_experience,
            seo_title,
            seo_description,
            year,
        }
    }
}

/// Renders the page for `prospect`, inferring its category.
pub fn render_site(prospect: &Prospect, site: &SiteConfig, now: DateTime<Utc>) -> String {
    render_html(&SiteContent::from_prospect(prospect, now), site)
}

pub fn render_html(content: &SiteContent, site: &SiteConfig) -> String {
    let mut html = String::with_capacity(16 * 1024);
    html.push_str("<!DOCTYPE html>\n<html lang=\"fr\">\n<head>\n");
    html.push_str("    <meta charset=\"UTF-8\">\n");
    html.push_str(
        "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
    );
    html.push_str(&format!("    <title>{}</title>\n", escape_html(&content.seo_title)));
    html.push_str(&format!(
        "    <meta name=\"description\" content=\"{}\">\n",
        escape_html(&content.seo_description)
    ));
    html.push_str("    <meta name=\"robots\" content=\"noindex, nofollow\">\n");
    html.push_str("    <link href=\"https://fonts.googleapis.com/css2?family=Inter:wght@300;400;500;600;700&amp;display=swap\" rel=\"stylesheet\">\n");
    html.push_str("    <style>");
    html.push_str(&STYLE.replace("__ACCENT__", &content.color));
    html.push_str("    </style>\n</head>\n<body>\n");

    hero(&mut html, content);
    services(&mut html, content);
    about(&mut html, content);
    contact(&mut html, content);
    call_to_action(&mut html, content);
    footer(&mut html, content, site);

    html.push_str("</body>\n</html>\n");
    html
}

fn phone_link(content: &SiteContent) -> String {
    match &content.phone_href {
        Some(href) => escape_html(href),
        None => "#contact".to_string(),
    }
}

fn hero(html: &mut String, content: &SiteContent) {
    html.push_str("    <section class=\"hero\">\n");
    html.push_str(&format!(
        "        <div class=\"hero-icon\">{}</div>\n",
        escape_html(&content.icon)
    ));
    html.push_str(&format!(
        "        <span class=\"badge\">{} Professionnel</span>\n",
        escape_html(&content.title)
    ));
    html.push_str(&format!("        <h1>{}</h1>\n", escape_html(&content.name)));
    html.push_str(&format!("        <p>{}</p>\n", escape_html(&content.description)));
    if let Some(rating) = &content.rating {
        html.push_str(&format!(
            "        <div class=\"rating\"><span class=\"stars\">★★★★★</span> {}/5 ({} avis)</div>\n",
            escape_html(rating),
            escape_html(content.review_count.as_deref().unwrap_or("plusieurs"))
        ));
    }
    html.push_str("        <br><br>\n");
    html.push_str(&format!(
        "        <a href=\"{}\" class=\"btn\">📞 {}</a>\n",
        phone_link(content),
        escape_html(&content.phone)
    ));
    html.push_str("    </section>\n\n");
}

fn services(html: &mut String, content: &SiteContent) {
    html.push_str("    <section class=\"section\">\n        <h2>Nos Services</h2>\n");
    html.push_str("        <div class=\"services\">\n");
    for service in &content.services {
        html.push_str("            <div class=\"service-card\">\n");
        html.push_str(&format!("                <h3>{}</h3>\n", escape_html(service)));
        html.push_str("                <p>Service professionnel et de qualité, réalisé par des experts qualifiés.</p>\n");
        html.push_str("            </div>\n");
    }
    html.push_str("        </div>\n    </section>\n\n");
}

fn photo_grid(html: &mut String, photos: &[String], alt: &str) {
    html.push_str("            <div class=\"photos\">\n");
    for photo in photos {
        html.push_str(&format!(
            "                <div class=\"photo\"><img src=\"{}\" alt=\"{}\" loading=\"lazy\"></div>\n",
            escape_html(photo),
            escape_html(alt)
        ));
    }
    html.push_str("            </div>\n");
}

fn about(html: &mut String, content: &SiteContent) {
    let years = content.years_experience;
    html.push_str("    <section class=\"section about\">\n");
    html.push_str("        <div class=\"about-content\">\n");
    html.push_str("            <div class=\"about-text\">\n");
    html.push_str("                <h3>À propos de nous</h3>\n");
    html.push_str(&format!(
        "                <p>Fort de {} ans d'expérience, nous mettons notre expertise au service de nos clients. {}</p>\n",
        years,
        family_pitch(content.family)
    ));
    html.push_str("                <div class=\"stats\">\n");
    for (number, label) in [
        (format!("{}+", years), "Années d'expérience"),
        ("500+".to_string(), "Clients satisfaits"),
        ("24/7".to_string(), "Disponibilité"),
    ] {
        html.push_str(&format!(
            "                    <div class=\"stat\"><div class=\"stat-number\">{}</div><div class=\"stat-label\">{}</div></div>\n",
            number, label
        ));
    }
    html.push_str("                </div>\n            </div>\n");
    if !content.photos.is_empty() {
        let shown = content.photos.len().min(ABOUT_PHOTOS);
        photo_grid(html, &content.photos[..shown], &content.name);
    }
    html.push_str("        </div>\n    </section>\n\n");
}

fn contact(html: &mut String, content: &SiteContent) {
    html.push_str("    <section class=\"section contact\" id=\"contact\">\n");
    html.push_str("        <h2>Contactez-nous</h2>\n        <div class=\"contact-info\">\n");
    html.push_str(&format!(
        "            <div class=\"contact-item\"><strong>📍 Adresse</strong>{}</div>\n",
        escape_html(&content.address)
    ));
    html.push_str(&format!(
        "            <div class=\"contact-item\"><strong>📞 Téléphone</strong><a href=\"{}\">{}</a></div>\n",
        phone_link(content),
        escape_html(&content.phone)
    ));
    html.push_str(&format!(
        "            <div class=\"contact-item\"><strong>✉️ Email</strong><a href=\"mailto:{}\">{}</a></div>\n",
        escape_html(&content.email),
        escape_html(&content.email)
    ));
    html.push_str("        </div>\n");
    if content.photos.len() > ABOUT_PHOTOS {
        photo_grid(html, &content.photos[ABOUT_PHOTOS..], &content.name);
    }
    html.push_str("    </section>\n\n");
}

fn call_to_action(html: &mut String, content: &SiteContent) {
    let (heading, tagline, button) = match content.family {
        TemplateFamily::Artisan => (
            format!("Besoin d'un {} ?", content.title),
            "Devis gratuit et sans engagement",
            "📞 Appelez maintenant",
        ),
        TemplateFamily::Commerce => (
            "Envie de nous rendre visite ?".to_string(),
            "Commandez ou passez en boutique",
            "📞 Appelez la boutique",
        ),
        TemplateFamily::Services => (
            "Envie de prendre rendez-vous ?".to_string(),
            "Réservez votre créneau en un appel",
            "📞 Prendre rendez-vous",
        ),
    };
    html.push_str("    <section class=\"cta\">\n");
    html.push_str(&format!("        <h2>{}</h2>\n", escape_html(&heading)));
    html.push_str(&format!("        <p>{}</p>\n", tagline));
    html.push_str(&format!(
        "        <a href=\"{}\" class=\"btn btn-white\">{}</a>\n",
        phone_link(content),
        button
    ));
    html.push_str("    </section>\n\n");
}

fn footer(html: &mut String, content: &SiteContent, site: &SiteConfig) {
    html.push_str("    <footer>\n");
    html.push_str(&format!(
        "        <p>© {} {} - Tous droits réservés</p>\n",
        content.year,
        escape_html(&content.name)
    ));
    html.push_str(&format!(
        "        <p>SIRET: {}</p>\n",
        escape_html(content.siret.as_deref().unwrap_or("N/A"))
    ));
    html.push_str(&format!(
        "        <p>Site créé avec ❤️ via <a href=\"{}\">{}</a></p>\n",
        escape_html(&site.brand_url),
        escape_html(&site.brand_name)
    ));
    html.push_str("    </footer>\n");
}

fn family_pitch(family: TemplateFamily) -> &'static str {
    match family {
        TemplateFamily::Artisan => "Notre mission : vous offrir un travail de qualité, dans les règles de l'art, avec un service client irréprochable.",
        TemplateFamily::Commerce => "Notre mission : des produits choisis avec soin et des conseils personnalisés à chaque visite.",
        TemplateFamily::Services => "Notre mission : un accueil chaleureux et une prestation adaptée à chacun.",
    }
}

/// `tel:` target with spaces and separators removed.
fn tel_href(phone: &str) -> String {
    let compact: String = phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();
    format!("tel:{}", compact)
}

pub fn is_hex_color(value: &str) -> bool {
    let Some(hex) = value.strip_prefix('#') else {
        return false;
    };
    matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
}

/// Escapes text for element content and double-quoted attributes.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn prospect(value: serde_json::Value) -> Prospect {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_empty_record_renders_placeholders() {
        let html = render_site(&prospect(json!({"_id": "x"})), &SiteConfig::default(), now());

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.trim_end().ends_with("</html>"));
        assert!(html.contains("<h1>Votre Entreprise</h1>"));
        assert!(html.contains("Sur rendez-vous"));
        assert!(html.contains("Contactez-nous"));
        assert!(html.contains("contact@example.com"));
        assert!(html.contains("Artisan professionnel à votre service"));
        assert!(html.contains("Fort de 10 ans"));
        assert!(html.contains("SIRET: N/A"));
        assert!(html.contains("href=\"#contact\""));
        assert!(!html.contains("class=\"rating\""));
        assert!(!html.contains("class=\"photos\""));
        assert_eq!(html.matches("<section").count(), html.matches("</section>").count());
    }

    #[test]
    fn test_full_record() {
        let p = prospect(json!({
            "_id": "123",
            "raison_sociale": "Plomberie Moreau",
            "activite": "plombier",
            "ville": "Bordeaux",
            "telephone": "06 55 54 44 33",
            "email": "moreau@example.fr",
            "annee_creation": "2006",
            "siret": "12345678900011",
            "rating": "4.7",
            "review_count": 38,
            "photos": ["https://lh3.googleusercontent.com/a", "https://lh3.googleusercontent.com/b", "https://lh3.googleusercontent.com/c"]
        }));
        let html = render_site(&p, &SiteConfig::default(), now());

        assert!(html.contains("<title>Plombier Bordeaux - Plomberie Moreau</title>"));
        assert!(html.contains("Plombier professionnel à Bordeaux. Dépannage urgent, Installation sanitaire, Chauffage, Débouchage. Devis gratuit."));
        assert!(html.contains("4.7/5 (38 avis)"));
        assert!(html.contains("href=\"tel:0655544433\""));
        assert!(html.contains("Fort de 20 ans"));
        assert!(html.contains("#3b82f6"));
        assert!(html.contains("Besoin d&#39;un Plombier ?"));
        assert!(html.contains("SIRET: 12345678900011"));
        assert_eq!(html.matches("class=\"photo\"").count(), 3);
        assert_eq!(html.matches("class=\"photos\"").count(), 2);
    }

    #[test]
    fn test_scraped_fields_win_over_sheet_fields() {
        let p = prospect(json!({
            "_id": "1",
            "adresse": "Adresse du fichier",
            "address": "12 rue Scrapée, Lyon",
            "telephone": "0611111111",
            "phone": "04 72 00 00 00"
        }));
        let content = SiteContent::from_prospect(&p, now());
        assert_eq!(content.address, "12 rue Scrapée, Lyon");
        assert_eq!(content.phone, "04 72 00 00 00");
    }

    #[test]
    fn test_rating_without_review_count() {
        let p = prospect(json!({"_id": "1", "rating": "4.2"}));
        let html = render_site(&p, &SiteConfig::default(), now());
        assert!(html.contains("4.2/5 (plusieurs avis)"));
    }

    #[test]
    fn test_markup_in_fields_is_escaped() {
        let p = prospect(json!({
            "_id": "1",
            "nom": "<script>alert(1)</script>",
            "description": "Tom & \"Jerry\""
        }));
        let html = render_site(&p, &SiteConfig::default(), now());
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains("Tom &amp; &quot;Jerry&quot;"));
    }

    #[test]
    fn test_invalid_creation_year_falls_back() {
        let p = prospect(json!({"_id": "1", "annee_creation": "inconnue"}));
        assert_eq!(SiteContent::from_prospect(&p, now()).years_experience, 10);

        let p = prospect(json!({"_id": "1", "annee_creation": "2099"}));
        assert_eq!(SiteContent::from_prospect(&p, now()).years_experience, 10);
    }

    #[test]
    fn test_extreme_creation_year_does_not_overflow() {
        for raw in ["-2147483648", "2147483647", "-5"] {
            let p = prospect(json!({"_id": "1", "annee_creation": raw}));
            assert_eq!(SiteContent::from_prospect(&p, now()).years_experience, 10);
            assert!(render_site(&p, &SiteConfig::default(), now()).contains("</html>"));
        }
    }

    #[test]
    fn test_family_copy() {
        let p = prospect(json!({"_id": "1", "activite": "Fleuriste"}));
        let html = render_site(&p, &SiteConfig::default(), now());
        assert!(html.contains("Envie de nous rendre visite ?"));
        assert!(html.contains("🌸"));
    }

    #[test]
    fn test_is_hex_color() {
        assert!(is_hex_color("#10b981"));
        assert!(is_hex_color("#fff"));
        assert!(!is_hex_color("red"));
        assert!(!is_hex_color("#12345"));
        assert!(!is_hex_color("#10b98180"));
    }
}
