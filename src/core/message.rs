//! Email and SMS bodies announcing a published site.

use crate::config::SiteConfig;
use crate::core::render::escape_html;
use crate::domain::model::Site;

pub const EMAIL_SUBJECT: &str = "🌟 Votre site internet professionnel est prêt !";

/// HTML email pointing at the deployed site and the activation page.
pub fn render_email(site: &Site, branding: &SiteConfig, sender_name: &str, year: i32) -> String {
    let prospect = &site.prospect;
    let business = prospect.label();
    let greeting = prospect
        .text("nom")
        .unwrap_or_else(|| "Madame, Monsieur".to_string());
    let activation_url = format!("{}?prospect={}", branding.pricing_url, site.id);

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Votre site est prêt</title>
  <style>
    body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px; }}
    .header {{ background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); padding: 40px 20px; text-align: center; color: white; border-radius: 12px 12px 0 0; }}
    .header h1 {{ margin: 0; font-size: 28px; }}
    .content {{ background: #f9fafb; padding: 40px 30px; border-radius: 0 0 12px 12px; }}
    .highlight {{ background: #fef3c7; padding: 20px; border-radius: 8px; margin: 20px 0; border-left: 4px solid #f59e0b; }}
    .cta-button {{ display: inline-block; background: #10b981; color: white; padding: 16px 32px; text-decoration: none; border-radius: 8px; font-weight: bold; margin: 20px 0; }}
    .preview-box {{ background: white; padding: 20px; border-radius: 8px; box-shadow: 0 4px 6px rgba(0,0,0,0.1); margin: 20px 0; text-align: center; }}
    .footer {{ margin-top: 40px; padding-top: 20px; border-top: 1px solid #e5e7eb; font-size: 12px; color: #6b7280; text-align: center; }}
    .emoji {{ font-size: 48px; }}
  </style>
</head>
<body>
  <div class="header">
    <div class="emoji">🎉</div>
    <h1>{business}</h1>
    <p>Votre site internet professionnel est prêt !</p>
  </div>

  <div class="content">
    <p>Bonjour {greeting},</p>

    <p>Nous avons créé <strong>gratuitement</strong> un aperçu de votre futur site internet professionnel. Voyez par vous-même :</p>

    <div class="preview-box">
      <p style="font-size: 18px; margin-bottom: 16px;">👆 Cliquez ci-dessous pour voir votre site</p>
      <a href="{site_url}" class="cta-button" style="background: #3b82f6;">🌐 Voir mon site</a>
    </div>

    <div class="highlight">
      <strong>✨ Ce que vous obtenez :</strong>
      <ul style="margin: 10px 0; padding-left: 20px;">
        <li>Site responsive (mobile, tablette, desktop)</li>
        <li>Référencement Google optimisé</li>
        <li>Photos et avis clients intégrés</li>
        <li>Formulaire de contact</li>
        <li>Hébergement inclus</li>
      </ul>
    </div>

    <p><strong>Offre limitée :</strong> Ce site peut être activé dès maintenant pour seulement <strong>{price}/mois</strong> (sans engagement).</p>

    <div style="text-align: center;">
      <a href="{activation_url}" class="cta-button">🚀 Activer mon site</a>
    </div>

    <p style="margin-top: 30px;">Des questions ? Répondez simplement à cet email ou appelez-nous au <strong>{support_phone}</strong>.</p>

    <p>Bien cordialement,<br>
    <strong>L'équipe {brand}</strong></p>
  </div>

  <div class="footer">
    <p>Vous recevez cet email car vous êtes référencé comme professionnel.</p>
    <p>© {year} {sender} - Tous droits réservés</p>
    <p style="margin-top: 10px;"><a href="{legal_url}">Mentions légales</a></p>
  </div>
</body>
</html>
"#,
        business = escape_html(&business),
        greeting = escape_html(&greeting),
        site_url = escape_html(site.public_url()),
        price = escape_html(&branding.monthly_price),
        activation_url = escape_html(&activation_url),
        support_phone = escape_html(&branding.support_phone),
        brand = escape_html(&branding.brand_name),
        year = year,
        sender = escape_html(sender_name),
        legal_url = escape_html(&branding.legal_url),
    )
}

/// One-line SMS; the URL is shown without its scheme to save characters.
pub fn sms_content(site: &Site, branding: &SiteConfig, signature: &str) -> String {
    let name = site
        .prospect
        .display_name()
        .unwrap_or_else(|| "Votre entreprise".to_string());
    let short_url = strip_scheme(site.public_url());

    format!(
        "🌟 {}, votre site internet est prêt ! Découvrez-le ici: {} - Activer pour {}/mois: {} - {}",
        name, short_url, branding.monthly_price, branding.brand_url, signature
    )
}

fn strip_scheme(url: &str) -> &str {
    url.strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Prospect;
    use serde_json::json;
    use std::path::PathBuf;

    fn site() -> Site {
        let prospect: Prospect = serde_json::from_value(json!({
            "_id": "42",
            "raison_sociale": "Coiffure Martin",
            "nom": "Martin",
            "email": "martin@example.fr"
        }))
        .unwrap();
        Site {
            id: "42".to_string(),
            dir: PathBuf::from("generated/42"),
            url: "https://nadir-dna.github.io/sitevitrine-42".to_string(),
            prospect,
            deployed_url: Some("https://nadir-dna.github.io/sitevitrine-42/".to_string()),
            deployed_at: None,
        }
    }

    #[test]
    fn test_email_links_deployed_site() {
        let html = render_email(&site(), &SiteConfig::default(), "Amens Bien-Être", 2026);
        assert!(html.contains("<h1>Coiffure Martin</h1>"));
        assert!(html.contains("Bonjour Martin,"));
        assert!(html.contains("href=\"https://nadir-dna.github.io/sitevitrine-42/\""));
        assert!(html.contains("https://amens.fr/pricing?prospect=42"));
        assert!(html.contains("© 2026 Amens Bien-Être"));
    }

    #[test]
    fn test_sms_strips_scheme() {
        let content = sms_content(&site(), &SiteConfig::default(), "Amens Bien-Être");
        assert!(content.starts_with("🌟 Coiffure Martin, votre site internet est prêt !"));
        assert!(content.contains("ici: nadir-dna.github.io/sitevitrine-42/ -"));
        assert!(content.contains("29€/mois: https://amens.fr"));
        assert!(content.ends_with("- Amens Bien-Être"));
    }
}
