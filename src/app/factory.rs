use crate::adapters::brevo::{BrevoClient, DryRunMessenger};
use crate::adapters::browser::renderer_from_config;
use crate::adapters::git::GitCli;
use crate::adapters::github::GithubPagesPublisher;
use crate::adapters::sheets::source_from_config;
use crate::adapters::storage::LocalStorage;
use crate::app::funnel::Funnel;
use crate::app::stages::enrich::{MapsEnricher, PassthroughEnricher};
use crate::config::AppConfig;
use crate::domain::ports::{Enricher, Messenger, SitePublisher};
use crate::utils::error::Result;

#[derive(Debug, Clone, Copy, Default)]
pub struct FactoryOptions {
    /// Log messages instead of calling Brevo.
    pub dry_run: bool,
    pub monitor: bool,
}

pub fn build_enricher(config: &AppConfig) -> Result<Box<dyn Enricher>> {
    if !config.scraper.enabled {
        tracing::info!("ℹ️ Scraper disabled, prospects are used as-is");
        return Ok(Box::new(PassthroughEnricher));
    }
    Ok(Box::new(MapsEnricher::new(
        renderer_from_config(&config.scraper)?,
        config.scraper.maps_base.clone(),
        config.scraper.max_photos,
    )))
}

/// `None` when no GitHub token is configured.
pub fn build_publisher(config: &AppConfig) -> Result<Option<Box<dyn SitePublisher>>> {
    let Ok(token) = config.github_token() else {
        tracing::debug!("No GitHub token, deployment unavailable");
        return Ok(None);
    };
    let git = GitCli::new(&config.github.author_name, &config.github.author_email);
    let publisher = GithubPagesPublisher::new(
        config.github.clone(),
        token,
        git,
        config.paths.scratch_dir.clone(),
    )?;
    Ok(Some(Box::new(publisher)))
}

/// `None` when no Brevo key is configured, unless running dry.
pub fn build_messenger(config: &AppConfig, dry_run: bool) -> Option<Box<dyn Messenger>> {
    if dry_run {
        return Some(Box::new(DryRunMessenger));
    }
    match config.brevo_api_key() {
        Ok(key) => Some(Box::new(BrevoClient::new(&config.brevo, key))),
        Err(_) => {
            tracing::debug!("No Brevo API key, notifications unavailable");
            None
        }
    }
}

/// Funnel over the local data directory with every adapter the configuration allows.
pub fn build_funnel(config: AppConfig, options: FactoryOptions) -> Result<Funnel<LocalStorage>> {
    let storage = LocalStorage::new(&config.paths.data_dir);
    let source = source_from_config(&config.sheet);
    let enricher = build_enricher(&config)?;
    let publisher = build_publisher(&config)?;
    let messenger = build_messenger(&config, options.dry_run);

    let mut funnel = Funnel::new(storage, config, source, enricher).with_monitoring(options.monitor);
    if let Some(publisher) = publisher {
        funnel = funnel.with_publisher(publisher);
    }
    if let Some(messenger) = messenger {
        funnel = funnel.with_messenger(messenger);
    }
    Ok(funnel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::FunnelError;

    #[test]
    fn test_funnel_without_credentials() {
        let mut config = AppConfig::default();
        config.scraper.enabled = false;

        let funnel = build_funnel(config, FactoryOptions::default()).unwrap();
        assert!(matches!(
            funnel.publisher(),
            Err(FunnelError::MissingConfigError { .. })
        ));
        assert!(funnel.messenger().is_err());
    }

    #[test]
    fn test_dry_run_messenger_needs_no_key() {
        let config = AppConfig::default();
        let funnel = build_funnel(
            config,
            FactoryOptions {
                dry_run: true,
                monitor: false,
            },
        )
        .unwrap();
        assert!(funnel.messenger().is_ok());
    }

    #[test]
    fn test_publisher_with_token() {
        let mut config = AppConfig::default();
        config.github.token = Some("ghp_x".to_string());
        assert!(build_publisher(&config).unwrap().is_some());
    }
}
