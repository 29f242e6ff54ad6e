use crate::domain::ports::Storage;
use chrono::Utc;

/// Human-readable run log, echoed to tracing and appended to a file under the logs directory.
///
/// Journal write failures are reported through tracing and otherwise ignored.
pub struct RunJournal<'a, S: Storage> {
    storage: &'a S,
    path: String,
    tag: Option<String>,
}

impl<'a, S: Storage> RunJournal<'a, S> {
    pub fn new(storage: &'a S, path: impl Into<String>) -> Self {
        Self {
            storage,
            path: path.into(),
            tag: None,
        }
    }

    /// Prefix every line with `[tag]`, e.g. `RUN-03:00`.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub async fn log(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        let line = match &self.tag {
            Some(tag) => format!("[{}] [{}] {}", Utc::now().to_rfc3339(), tag, message),
            None => format!("[{}] {}", Utc::now().to_rfc3339(), message),
        };
        tracing::info!("{}", message);

        if let Err(e) = self
            .storage
            .append_file(&self.path, format!("{}\n", line).as_bytes())
            .await
        {
            tracing::warn!("⚠️ Could not write journal {}: {}", self.path, e);
        }
    }
}
