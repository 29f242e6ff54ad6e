use crate::config::GithubConfig;
use crate::domain::model::Site;
use crate::domain::ports::{GitClient, SitePublisher};
use crate::utils::error::{FunnelError, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde_json::json;
use std::path::{Path, PathBuf};

const SERVICE: &str = "GitHub";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoCreation {
    Created,
    AlreadyExists,
}

/// Minimal GitHub REST client: repository creation and Pages activation.
pub struct GithubClient {
    client: Client,
    api_base: String,
    owner: String,
    token: String,
}

impl GithubClient {
    pub fn new(config: &GithubConfig, token: impl Into<String>) -> Result<Self> {
        let client = Client::builder().user_agent("sitevitrine").build()?;
        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            owner: config.owner.clone(),
            token: token.into(),
        })
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}{}", self.api_base, path))
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github.v3+json")
    }

    /// `POST /user/repos`. HTTP 422 means the name is taken, which for us means
    /// the repository from an earlier run is still there.
    pub async fn create_repo(&self, name: &str) -> Result<RepoCreation> {
        let response = self
            .post("/user/repos")
            .json(&json!({
                "name": name,
                "private": false,
                "auto_init": true,
            }))
            .send()
            .await?;

        match response.status() {
            StatusCode::CREATED => Ok(RepoCreation::Created),
            StatusCode::UNPROCESSABLE_ENTITY => Ok(RepoCreation::AlreadyExists),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(FunnelError::service(SERVICE, status.as_u16(), body))
            }
        }
    }

    /// `POST /repos/{owner}/{repo}/pages`, serving `branch` from the root.
    pub async fn enable_pages(&self, repo: &str, branch: &str) -> Result<()> {
        let response = self
            .post(&format!("/repos/{}/{}/pages", self.owner, repo))
            .json(&json!({ "source": { "branch": branch, "path": "/" } }))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(FunnelError::service(SERVICE, status.as_u16(), body))
    }
}

/// Publishes each site to its own `<owner>/<prefix><id>` repository served by GitHub Pages.
pub struct GithubPagesPublisher<G: GitClient> {
    api: GithubClient,
    git: G,
    config: GithubConfig,
    token: String,
    scratch_dir: PathBuf,
}

impl<G: GitClient> GithubPagesPublisher<G> {
    pub fn new(
        config: GithubConfig,
        token: impl Into<String>,
        git: G,
        scratch_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let token = token.into();
        Ok(Self {
            api: GithubClient::new(&config, token.clone())?,
            git,
            config,
            token,
            scratch_dir: scratch_dir.into(),
        })
    }

    async fn checkout(&self, repo: &str, remote: &str, workdir: &Path) -> Result<()> {
        if let Err(e) = self.git.clone_repo(remote, workdir).await {
            tracing::info!("📦 Clone of {} failed ({}), creating repository", repo, e);
            match self.api.create_repo(repo).await? {
                RepoCreation::Created => tracing::info!("✅ Repository {} created", repo),
                RepoCreation::AlreadyExists => {
                    tracing::info!("ℹ️ Repository {} already exists", repo)
                }
            }
            remove_dir_if_exists(workdir).await?;
            self.git.clone_repo(remote, workdir).await?;
        }
        Ok(())
    }

    async fn push_site(&self, site: &Site, repo: &str, remote: &str, workdir: &Path) -> Result<()> {
        remove_dir_if_exists(workdir).await?;
        self.checkout(repo, remote, workdir).await?;

        copy_dir(&site.dir, workdir).await?;

        let committed = self
            .git
            .commit_all(workdir, &self.config.commit_message)
            .await?;
        if committed {
            self.git
                .push(workdir, "origin", &self.config.branch)
                .await?;
        } else {
            tracing::info!("ℹ️ {} unchanged, nothing to push", repo);
        }
        Ok(())
    }
}

#[async_trait]
impl<G: GitClient> SitePublisher for GithubPagesPublisher<G> {
    async fn publish(&self, site: &Site) -> Result<Site> {
        let repo = self.config.repo_name(&site.id);
        let remote = self.config.remote_url(&repo, &self.token);
        let workdir = self.scratch_dir.join(&repo);

        tracing::info!("🚀 Publishing {} to {}/{}", site.id, self.config.owner, repo);

        let pushed = self.push_site(site, &repo, &remote, &workdir).await;
        // 失敗時也要清掉 clone，remote URL 內含 token
        let cleaned = remove_dir_if_exists(&workdir).await;
        pushed?;
        cleaned?;

        if let Err(e) = self.api.enable_pages(&repo, &self.config.branch).await {
            tracing::debug!("Pages activation for {} skipped: {}", repo, e);
        }

        let mut deployed = site.clone();
        deployed.deployed_url = Some(format!("{}/", self.config.pages_url(&repo)));
        deployed.deployed_at = Some(Utc::now());
        Ok(deployed)
    }
}

async fn remove_dir_if_exists(path: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Recursive copy of `src` into `dest`, overwriting files; `.git` is skipped.
pub async fn copy_dir(src: &Path, dest: &Path) -> Result<()> {
    let mut pending = vec![(src.to_path_buf(), dest.to_path_buf())];

    while let Some((from, to)) = pending.pop() {
        tokio::fs::create_dir_all(&to).await?;
        let mut entries = tokio::fs::read_dir(&from).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if name == ".git" {
                continue;
            }
            let target = to.join(&name);
            if entry.file_type().await?.is_dir() {
                pending.push((entry.path(), target));
            } else {
                tokio::fs::copy(entry.path(), &target).await?;
            }
        }
    }
    Ok(())
}
