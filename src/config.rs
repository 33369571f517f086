use std::path::PathBuf;

use clap::Args;
use url::Url;

use crate::llm::OpenAiClientConfig;

pub const DEFAULT_MAX_ITEMS_PER_FEED: usize = 75;
pub const DEFAULT_CHUNK_SIZE: usize = 25;
const DEFAULT_LANGUAGE: &str = "Chinese";
const DEFAULT_REPORT_TITLE: &str = "AI News Digest";
const DEFAULT_REPORT_PREFIX: &str = "AI_News_Digest";

const DEFAULT_FEEDS: &[(&str, &str)] = &[
    ("HackerNews", "https://news.ycombinator.com/rss"),
    ("OpenAI", "https://openai.com/news/rss.xml"),
    ("arXiv cs.AI", "https://rss.arxiv.org/rss/cs.AI"),
    ("arXiv cs.LG", "https://rss.arxiv.org/rss/cs.LG"),
];

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("feed entry {0:?} is not of the form Name=URL")]
    MalformedFeed(String),
    #[error("feed {name:?} has an invalid url: {url}")]
    InvalidFeedUrl { name: String, url: String },
    #[error("no feeds configured")]
    NoFeeds,
    #[error("{key} must be a non-negative integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
    #[error("chunk size must be at least 1")]
    ZeroChunkSize,
}

/// One named RSS source, in configuration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSpec {
    pub name: String,
    pub url: String,
}

impl FeedSpec {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self { name: name.into(), url: url.into() }
    }
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub title: String,
    pub file_prefix: String,
    pub output_dir: PathBuf,
}

impl ReportConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Only the report variables; the client path needs nothing else.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(title) = lookup("DIGEST_REPORT_TITLE") { cfg.title = title; }
        if let Some(prefix) = lookup("DIGEST_REPORT_PREFIX") { cfg.file_prefix = prefix; }
        if let Some(dir) = lookup("DIGEST_OUTPUT_DIR") { cfg.output_dir = PathBuf::from(dir); }
        cfg
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_REPORT_TITLE.to_string(),
            file_prefix: DEFAULT_REPORT_PREFIX.to_string(),
            output_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DigestConfig {
    pub feeds: Vec<FeedSpec>,
    pub max_items_per_feed: usize,
    pub chunk_size: usize,
    pub language: String,
    pub llm: OpenAiClientConfig,
    pub report: ReportConfig,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            feeds: DEFAULT_FEEDS.iter().map(|(n, u)| FeedSpec::new(*n, *u)).collect(),
            max_items_per_feed: DEFAULT_MAX_ITEMS_PER_FEED,
            chunk_size: DEFAULT_CHUNK_SIZE,
            language: DEFAULT_LANGUAGE.to_string(),
            llm: OpenAiClientConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

/// Per-run overrides shared by `run` and `serve`.
#[derive(Args, Debug, Clone, Default)]
pub struct DigestArgs {
    /// Entries per LLM request
    #[arg(long)]
    pub chunk_size: Option<usize>,
    /// Maximum items taken from each feed
    #[arg(long)]
    pub max_items: Option<usize>,
    /// Model id sent to the completion endpoint
    #[arg(long)]
    pub model: Option<String>,
    /// Output language of the summaries
    #[arg(long)]
    pub language: Option<String>,
    /// Directory the dated report is written to
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
    /// Send every entry in one request (no chunking)
    #[arg(long, default_value_t = false)]
    pub single_batch: bool,
}

impl DigestConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self {
            llm: OpenAiClientConfig::from_lookup(&lookup),
            report: ReportConfig::from_lookup(&lookup),
            ..Self::default()
        };

        if let Some(raw) = lookup("DIGEST_FEEDS") {
            cfg.feeds = parse_feeds(&raw)?;
        }
        if let Some(raw) = lookup("DIGEST_MAX_ITEMS_PER_FEED") {
            cfg.max_items_per_feed = parse_usize("DIGEST_MAX_ITEMS_PER_FEED", &raw)?;
        }
        if let Some(raw) = lookup("DIGEST_CHUNK_SIZE") {
            cfg.chunk_size = parse_usize("DIGEST_CHUNK_SIZE", &raw)?;
        }
        if let Some(lang) = lookup("DIGEST_LANGUAGE") { cfg.language = lang; }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn apply_args(&mut self, args: &DigestArgs) -> Result<(), ConfigError> {
        if let Some(n) = args.chunk_size { self.chunk_size = n; }
        if let Some(n) = args.max_items { self.max_items_per_feed = n; }
        if let Some(model) = &args.model { self.llm.default_model = model.clone(); }
        if let Some(lang) = &args.language { self.language = lang.clone(); }
        if let Some(dir) = &args.output_dir { self.report.output_dir = dir.clone(); }
        if args.single_batch { self.chunk_size = usize::MAX; }
        self.validate()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 { return Err(ConfigError::ZeroChunkSize); }
        if self.feeds.is_empty() { return Err(ConfigError::NoFeeds); }
        Ok(())
    }
}

// "Name=URL;Name2=URL2"; empty segments are ignored
fn parse_feeds(raw: &str) -> Result<Vec<FeedSpec>, ConfigError> {
    let mut feeds = Vec::new();
    for part in raw.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        let Some((name, url)) = part.split_once('=') else {
            return Err(ConfigError::MalformedFeed(part.to_string()));
        };
        let (name, url) = (name.trim(), url.trim());
        if name.is_empty() { return Err(ConfigError::MalformedFeed(part.to_string())); }
        if Url::parse(url).is_err() {
            return Err(ConfigError::InvalidFeedUrl { name: name.to_string(), url: url.to_string() });
        }
        feeds.push(FeedSpec::new(name, url));
    }
    Ok(feeds)
}

fn parse_usize(key: &'static str, raw: &str) -> Result<usize, ConfigError> {
    raw.trim()
        .parse::<usize>()
        .map_err(|_| ConfigError::InvalidNumber { key, value: raw.to_string() })
}
