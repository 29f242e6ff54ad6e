#[cfg(feature = "cli")]
pub mod cli;

use crate::core::schedule::{default_slots, ScheduleSlot};
use crate::utils::error::{FunnelError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub sheet: SheetConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub brevo: BrevoConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: String,
    pub prospects_dir: String,
    pub generated_dir: String,
    pub logs_dir: String,
    pub scratch_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: ".".to_string(),
            prospects_dir: "prospects".to_string(),
            generated_dir: "generated".to_string(),
            logs_dir: "logs".to_string(),
            scratch_dir: std::env::temp_dir().to_string_lossy().into_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetSourceKind {
    /// Sheets v4 `values.get`.
    #[default]
    Api,
    /// Public CSV export of the sheet.
    Csv,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetConfig {
    pub source: SheetSourceKind,
    pub spreadsheet_id: String,
    pub range: String,
    pub api_key: Option<String>,
    pub access_token: Option<String>,
    pub api_base: String,
    pub export_base: String,
    pub gid: Option<String>,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            source: SheetSourceKind::Api,
            spreadsheet_id: String::new(),
            range: "Prospects!A:Z".to_string(),
            api_key: None,
            access_token: None,
            api_base: "https://sheets.googleapis.com".to_string(),
            export_base: "https://docs.google.com".to_string(),
            gid: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    /// Headless Chrome behind a browserless-style `/content` endpoint.
    #[default]
    Browserless,
    /// Plain HTTP GET, no script execution.
    Direct,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub enabled: bool,
    pub renderer: RendererKind,
    pub endpoint: String,
    pub token: Option<String>,
    pub maps_base: String,
    pub navigation_timeout_secs: u64,
    pub settle_ms: u64,
    pub max_photos: usize,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            renderer: RendererKind::Browserless,
            endpoint: "http://localhost:3000".to_string(),
            token: None,
            maps_base: "https://www.google.com/maps/search/".to_string(),
            navigation_timeout_secs: 30,
            settle_ms: 3000,
            max_photos: 3,
            viewport_width: 1280,
            viewport_height: 800,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub brand_name: String,
    pub brand_url: String,
    pub pricing_url: String,
    pub legal_url: String,
    pub monthly_price: String,
    pub support_phone: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            brand_name: "Amens".to_string(),
            brand_url: "https://amens.fr".to_string(),
            pricing_url: "https://amens.fr/pricing".to_string(),
            legal_url: "https://amens.fr/legal".to_string(),
            monthly_price: "29€".to_string(),
            support_phone: "01 23 45 67 89".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    pub token: Option<String>,
    pub owner: String,
    pub api_base: String,
    pub git_host: String,
    pub pages_domain: String,
    pub repo_prefix: String,
    pub branch: String,
    pub commit_message: String,
    pub author_name: String,
    pub author_email: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: None,
            owner: "Nadir-DNA".to_string(),
            api_base: "https://api.github.com".to_string(),
            git_host: "github.com".to_string(),
            pages_domain: "github.io".to_string(),
            repo_prefix: "sitevitrine-".to_string(),
            branch: "main".to_string(),
            commit_message: "Mise à jour site vitrine".to_string(),
            author_name: "SiteVitrine".to_string(),
            author_email: "sitevitrine@users.noreply.github.com".to_string(),
        }
    }
}

impl GithubConfig {
    pub fn repo_name(&self, site_id: &str) -> String {
        format!("{}{}", self.repo_prefix, site_id)
    }

    /// Clone/push URL with the token embedded as basic-auth user.
    pub fn remote_url(&self, repo: &str, token: &str) -> String {
        format!("https://{}@{}/{}/{}.git", token, self.git_host, self.owner, repo)
    }

    /// `https://<owner>.<pages_domain>/<repo>`; page hosts are lowercase.
    pub fn pages_url(&self, repo: &str) -> String {
        format!(
            "https://{}.{}/{}",
            self.owner.to_lowercase(),
            self.pages_domain,
            repo
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrevoConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub sender_email: String,
    pub sender_name: String,
    pub sender_sms: String,
}

impl Default for BrevoConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: "https://api.brevo.com".to_string(),
            sender_email: "contact@amens.fr".to_string(),
            sender_name: "Amens Bien-Être".to_string(),
            sender_sms: "Amens".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub prospects_per_run: usize,
    pub generate_delay_ms: u64,
    pub deploy_delay_ms: u64,
    pub email_delay_ms: u64,
    pub sms_delay_ms: u64,
    pub sms_batch_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            prospects_per_run: 5,
            generate_delay_ms: 2000,
            deploy_delay_ms: 3000,
            email_delay_ms: 30_000,
            sms_delay_ms: 10_000,
            sms_batch_size: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub slots: Vec<ScheduleSlot>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            slots: default_slots(),
        }
    }
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(FunnelError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| FunnelError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GITHUB_TOKEN})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| FunnelError::ConfigError {
            message: format!("env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Defaults overridden by the process environment (`.env` included when loaded).
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(dir) = env_string("SITEVITRINE_DATA_DIR") {
            config.paths.data_dir = dir;
        }

        if let Some(id) = env_string("GOOGLE_SHEET_ID") {
            config.sheet.spreadsheet_id = id;
        }
        if let Some(range) = env_string("GOOGLE_SHEET_RANGE") {
            config.sheet.range = range;
        }
        config.sheet.api_key = env_string("GOOGLE_SHEETS_API_KEY");
        config.sheet.access_token = env_string("GOOGLE_ACCESS_TOKEN");
        if let Some(source) = env_string("SHEET_SOURCE") {
            if source.eq_ignore_ascii_case("csv") {
                config.sheet.source = SheetSourceKind::Csv;
            }
        }

        if let Some(endpoint) = env_string("BROWSERLESS_URL") {
            config.scraper.endpoint = endpoint;
        }
        config.scraper.token = env_string("BROWSERLESS_TOKEN");
        if let Some(enabled) = env_string("SCRAPER_ENABLED") {
            config.scraper.enabled = !matches!(enabled.as_str(), "0" | "false" | "no");
        }

        config.github.token = env_string("GITHUB_TOKEN");
        if let Some(owner) = env_string("GITHUB_REPO_OWNER") {
            config.github.owner = owner;
        }

        config.brevo.api_key = env_string("BREVO_API_KEY");
        if let Some(email) = env_string("BREVO_SENDER_EMAIL") {
            config.brevo.sender_email = email;
        }
        if let Some(name) = env_string("BREVO_SENDER_NAME") {
            config.brevo.sender_name = name;
        }
        if let Some(sender) = env_string("BREVO_SENDER_SMS") {
            config.brevo.sender_sms = sender;
        }

        if let Some(limit) = env_parse::<usize>("PROSPECTS_PER_RUN") {
            config.pipeline.prospects_per_run = limit;
        }
        if let Some(delay) = env_parse::<u64>("DELAY_BETWEEN_EMAILS") {
            config.pipeline.email_delay_ms = delay;
        }

        config
    }

    pub fn github_token(&self) -> Result<&str> {
        validation::validate_required_field("github.token", &self.github.token).map(String::as_str)
    }

    pub fn brevo_api_key(&self) -> Result<&str> {
        validation::validate_required_field("brevo.api_key", &self.brevo.api_key)
            .map(String::as_str)
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("paths.data_dir", &self.paths.data_dir)?;
        validation::validate_path("paths.prospects_dir", &self.paths.prospects_dir)?;
        validation::validate_path("paths.generated_dir", &self.paths.generated_dir)?;
        validation::validate_path("paths.logs_dir", &self.paths.logs_dir)?;
        validation::validate_path("paths.scratch_dir", &self.paths.scratch_dir)?;

        validation::validate_url("sheet.api_base", &self.sheet.api_base)?;
        validation::validate_url("sheet.export_base", &self.sheet.export_base)?;
        validation::validate_non_empty_string("sheet.range", &self.sheet.range)?;

        if self.scraper.enabled {
            validation::validate_url("scraper.maps_base", &self.scraper.maps_base)?;
            if self.scraper.renderer == RendererKind::Browserless {
                validation::validate_url("scraper.endpoint", &self.scraper.endpoint)?;
            }
        }

        validation::validate_url("github.api_base", &self.github.api_base)?;
        validation::validate_non_empty_string("github.owner", &self.github.owner)?;
        validation::validate_non_empty_string("github.branch", &self.github.branch)?;
        validation::validate_repo_prefix("github.repo_prefix", &self.github.repo_prefix)?;
        validation::validate_url("brevo.api_base", &self.brevo.api_base)?;
        validation::validate_email("brevo.sender_email", &self.brevo.sender_email)?;
        validation::validate_sms_sender("brevo.sender_sms", &self.brevo.sender_sms)?;

        validation::validate_positive_number(
            "pipeline.prospects_per_run",
            self.pipeline.prospects_per_run,
            1,
        )?;
        validation::validate_positive_number(
            "pipeline.sms_batch_size",
            self.pipeline.sms_batch_size,
            1,
        )?;

        for slot in &self.schedule.slots {
            validation::validate_range("schedule.slots.hour", slot.hour, 0, 23)?;
            validation::validate_range("schedule.slots.from_minute", slot.from_minute, 0, 59)?;
        }

        Ok(())
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_string(name).and_then(|v| v.parse().ok())
}
