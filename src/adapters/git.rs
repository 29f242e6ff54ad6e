//! `git` shelled out through [`tokio::process::Command`].
//!
//! Remote URLs carry the push token as basic-auth user, so everything that
//! ends up in an error or a log line goes through [`redact`] first.

use crate::domain::ports::GitClient;
use crate::utils::error::{FunnelError, Result};
use async_trait::async_trait;
use regex::Regex;
use std::path::Path;
use std::process::Stdio;
use std::sync::OnceLock;
use tokio::process::Command;

/// Replaces the userinfo part of any URL in `text` with `***`.
pub fn redact(text: &str) -> String {
    static CREDENTIALS: OnceLock<Option<Regex>> = OnceLock::new();
    match CREDENTIALS.get_or_init(|| Regex::new(r"(https?://)[^/@\s]+@").ok()) {
        Some(re) => re.replace_all(text, "${1}***@").into_owned(),
        None => text.to_string(),
    }
}

pub struct GitCli {
    author_name: String,
    author_email: String,
}

impl GitCli {
    pub fn new(author_name: impl Into<String>, author_email: impl Into<String>) -> Self {
        Self {
            author_name: author_name.into(),
            author_email: author_email.into(),
        }
    }

    async fn run(&self, label: &str, cwd: Option<&Path>, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new("git");
        if let Some(dir) = cwd {
            cmd.arg("-C").arg(dir);
        }
        cmd.args(args);
        cmd.env("GIT_TERMINAL_PROMPT", "0");
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("spawning git {}", label);

        let output = cmd.output().await.map_err(|e| FunnelError::GitError {
            command: label.to_string(),
            message: format!("failed to spawn git: {}", e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FunnelError::GitError {
                command: label.to_string(),
                message: redact(&format!("status {}: {}", output.status, stderr.trim())),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl GitClient for GitCli {
    async fn clone_repo(&self, url: &str, dest: &Path) -> Result<()> {
        let dest = dest.to_string_lossy();
        self.run("clone", None, &["clone", url, dest.as_ref()]).await?;
        Ok(())
    }

    async fn commit_all(&self, repo: &Path, message: &str) -> Result<bool> {
        self.run("add", Some(repo), &["add", "-A"]).await?;

        let status = self
            .run("status", Some(repo), &["status", "--porcelain"])
            .await?;
        if status.trim().is_empty() {
            tracing::debug!("nothing to commit in {}", repo.display());
            return Ok(false);
        }

        let name = format!("user.name={}", self.author_name);
        let email = format!("user.email={}", self.author_email);
        self.run(
            "commit",
            Some(repo),
            &["-c", &name, "-c", &email, "commit", "-m", message],
        )
        .await?;
        Ok(true)
    }

    async fn push(&self, repo: &Path, remote: &str, branch: &str) -> Result<()> {
        self.run("push", Some(repo), &["push", remote, branch]).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_token() {
        let msg = "fatal: repository 'https://ghp_abc123@github.com/acme/site.git/' not found";
        let redacted = redact(msg);
        assert!(!redacted.contains("ghp_abc123"));
        assert!(redacted.contains("https://***@github.com/acme/site.git"));
    }

    #[test]
    fn test_redact_leaves_plain_urls() {
        assert_eq!(redact("https://github.com/acme"), "https://github.com/acme");
    }
}
