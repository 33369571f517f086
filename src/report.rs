use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};

use crate::config::ReportConfig;

/// The assembled digest for one day. Written once, never edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub generated_at: NaiveDate,
    pub body: String,
}

impl Report {
    pub fn new(generated_at: NaiveDate, body: impl Into<String>) -> Self {
        Self { generated_at, body: body.into() }
    }

    pub fn today(body: impl Into<String>) -> Self {
        Self::new(Local::now().date_naive(), body)
    }

    fn date_str(&self) -> String {
        self.generated_at.format("%Y-%m-%d").to_string()
    }

    pub fn file_name(&self, prefix: &str) -> String {
        format!("{}_{}.md", prefix, self.date_str())
    }

    /// Fixed header followed by the body verbatim.
    pub fn render(&self, title: &str) -> String {
        format!("# {}\n\n**Date**: {}\n\n---\n\n{}", title, self.date_str(), self.body)
    }

    pub async fn write(&self, cfg: &ReportConfig) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&cfg.output_dir)
            .await
            .with_context(|| format!("create output dir {}", cfg.output_dir.display()))?;
        let path = cfg.output_dir.join(self.file_name(&cfg.file_prefix));
        tokio::fs::write(&path, self.render(&cfg.title))
            .await
            .with_context(|| format!("write report {}", path.display()))?;
        Ok(path)
    }
}
