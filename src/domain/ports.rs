use crate::domain::model::{EmailMessage, Prospect, Site, SmsMessage};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// File access for snapshots, generated sites and journals, relative to a base directory.
pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn append_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Entry names directly under `path`, sorted; a missing directory lists as empty.
    fn list_dir(&self, path: &str)
        -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
    /// Absolute location of `path`, for collaborators that need a real directory.
    fn resolve(&self, path: &str) -> PathBuf;
}

/// Tabular prospect source: the first row holds the headers.
#[async_trait]
pub trait ProspectSource: Send + Sync {
    async fn fetch_rows(&self) -> Result<Vec<Vec<String>>>;
    fn describe(&self) -> String;
}

/// Turns a URL into page HTML, after scripts have run when the backend supports it.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &str) -> Result<String>;
}

/// Adds scraped business data to a prospect. Never fails: on error the record comes back unchanged.
#[async_trait]
pub trait Enricher: Send + Sync {
    async fn enrich(&self, prospect: Prospect) -> Prospect;
}

#[async_trait]
pub trait SitePublisher: Send + Sync {
    async fn publish(&self, site: &Site) -> Result<Site>;
}

/// Transactional email/SMS provider. Returns the provider message id.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_email(&self, message: &EmailMessage) -> Result<String>;
    async fn send_sms(&self, message: &SmsMessage) -> Result<String>;
}

#[async_trait]
pub trait GitClient: Send + Sync {
    async fn clone_repo(&self, url: &str, dest: &Path) -> Result<()>;
    /// Stages everything and commits; returns false when there was nothing to commit.
    async fn commit_all(&self, repo: &Path, message: &str) -> Result<bool>;
    async fn push(&self, repo: &Path, remote: &str, branch: &str) -> Result<()>;
}
