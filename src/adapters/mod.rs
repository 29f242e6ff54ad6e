// Adapters layer: concrete implementations of the domain ports (storage, sheets, browser, GitHub, git, Brevo)

pub mod brevo;
pub mod browser;
pub mod git;
pub mod github;
pub mod sheets;
pub mod storage;

pub use brevo::{BrevoClient, DryRunMessenger};
pub use browser::{BrowserlessRenderer, DirectRenderer};
pub use git::GitCli;
pub use github::{GithubClient, GithubPagesPublisher};
pub use sheets::{CsvExportSource, SheetsApiSource};
pub use storage::LocalStorage;
