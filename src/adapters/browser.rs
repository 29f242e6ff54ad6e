use crate::config::{RendererKind, ScraperConfig};
use crate::domain::ports::PageRenderer;
use crate::utils::error::{FunnelError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Headless Chrome exposed over HTTP (browserless `/content`).
///
/// The service navigates, waits for the network to go idle, lets the page
/// settle and returns the rendered DOM.
pub struct BrowserlessRenderer {
    client: Client,
    config: ScraperConfig,
}

impl BrowserlessRenderer {
    pub fn new(config: ScraperConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn payload(&self, url: &str) -> serde_json::Value {
        json!({
            "url": url,
            "gotoOptions": {
                "waitUntil": "networkidle2",
                "timeout": self.config.navigation_timeout_secs * 1000,
            },
            "waitForTimeout": self.config.settle_ms,
            "viewport": {
                "width": self.config.viewport_width,
                "height": self.config.viewport_height,
            },
        })
    }
}

#[async_trait]
impl PageRenderer for BrowserlessRenderer {
    async fn render(&self, url: &str) -> Result<String> {
        let endpoint = format!("{}/content", self.config.endpoint.trim_end_matches('/'));
        let mut request = self
            .client
            .post(&endpoint)
            .timeout(Duration::from_secs(
                self.config.navigation_timeout_secs + self.config.settle_ms / 1000 + 15,
            ))
            .json(&self.payload(url));
        if let Some(token) = &self.config.token {
            request = request.query(&[("token", token)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FunnelError::service("browserless", status.as_u16(), body));
        }
        Ok(response.text().await?)
    }
}

/// Plain GET with a desktop user agent. Scripts do not run, so listings that
/// build their DOM client-side come back mostly empty.
pub struct DirectRenderer {
    client: Client,
}

impl DirectRenderer {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(Duration::from_secs(config.navigation_timeout_secs))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageRenderer for DirectRenderer {
    async fn render(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header("Accept-Language", "fr-FR,fr;q=0.9")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FunnelError::ScrapeError {
                message: format!("GET {} returned HTTP {}", url, status.as_u16()),
            });
        }
        Ok(response.text().await?)
    }
}

pub fn renderer_from_config(config: &ScraperConfig) -> Result<Box<dyn PageRenderer>> {
    Ok(match config.renderer {
        RendererKind::Browserless => Box::new(BrowserlessRenderer::new(config.clone())),
        RendererKind::Direct => Box::new(DirectRenderer::new(config)?),
    })
}
