use serde::Serialize;

/// One raw item as it came out of a feed document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub summary: Option<String>,
}

/// A feed item tagged with the name of the source it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsEntry {
    pub source: String,
    pub title: String,
    pub link: String,
    pub summary: String,
}

/// Per-source outcome of one aggregation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceOutcome {
    pub source: String,
    pub fetched: usize,
    pub kept: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceOutcome {
    pub fn is_ok(&self) -> bool { self.error.is_none() }
}

#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub entries: Vec<NewsEntry>,
    pub sources: Vec<SourceOutcome>,
}

impl Aggregation {
    pub fn failed_sources(&self) -> usize {
        self.sources.iter().filter(|s| !s.is_ok()).count()
    }
}
