use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use tracing::Instrument;

use crate::config::FeedSpec;
use crate::telemetry::{self};
use crate::telemetry::ops::digest::Phase as DigestPhase;

mod fetch;
mod parse;
pub mod types;

pub use types::{Aggregation, FeedItem, NewsEntry, SourceOutcome};

/// Anything that can turn a feed URL into its items.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_items(&self, url: &str) -> Result<Vec<FeedItem>>;
}

/// Plain HTTP GET followed by RSS parsing.
#[derive(Clone)]
pub struct HttpFeedSource {
    client: Client,
}

impl HttpFeedSource {
    pub fn new() -> Result<Self> {
        Ok(Self { client: fetch::http_client()? })
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch_items(&self, url: &str) -> Result<Vec<FeedItem>> {
        let xml = fetch::fetch_rss(&self.client, url).await?;
        parse::parse_items(&xml)
    }
}

/// Query every feed in configuration order, keep at most `cap` items from
/// each, and concatenate. A failing feed is logged and recorded, never fatal.
pub async fn aggregate_entries(source: &dyn FeedSource, feeds: &[FeedSpec], cap: usize) -> Aggregation {
    let log = telemetry::digest();
    let span = log.span(&DigestPhase::Fetch);
    async move {
        let mut out = Aggregation::default();
        for feed in feeds {
            let fs = log.span_kv(&DigestPhase::Source, [("source", feed.name.clone()), ("url", feed.url.clone())]);
            let items = match source.fetch_items(&feed.url).instrument(fs).await {
                Ok(items) => items,
                Err(err) => {
                    let reason = format!("{err:#}");
                    log.source_failed(&feed.name, &reason);
                    out.sources.push(SourceOutcome { source: feed.name.clone(), fetched: 0, kept: 0, error: Some(reason) });
                    continue;
                }
            };

            let fetched = items.len();
            let before = out.entries.len();
            for item in items.into_iter().take(cap) {
                let Some(link) = item.link else {
                    log.debug_kv("↩️ skip", [("source", feed.name.clone()), ("reason", "no-link".to_string())]);
                    continue;
                };
                out.entries.push(NewsEntry {
                    source: feed.name.clone(),
                    title: item.title.unwrap_or_default(),
                    link,
                    summary: item.summary.unwrap_or_default(),
                });
            }
            let kept = out.entries.len() - before;
            log.source_summary(&feed.name, fetched, kept);
            out.sources.push(SourceOutcome { source: feed.name.clone(), fetched, kept, error: None });
        }
        out
    }
    .instrument(span)
    .await
}


#[cfg(test)]
mod tests {
    use super::*;
    use super::stub::StaticFeedSource;

    fn specs(names: &[&str]) -> Vec<FeedSpec> {
        names.iter().map(|n| FeedSpec::new(*n, format!("https://{n}.example/rss"))).collect()
    }

    #[tokio::test]
    async fn concatenates_in_configuration_order_and_tags_source() {
        let feeds = specs(&["b", "a"]);
        let source = StaticFeedSource::new()
            .with_items("https://a.example/rss", 2)
            .with_items("https://b.example/rss", 3);

        let agg = aggregate_entries(&source, &feeds, 75).await;
        let tags: Vec<&str> = agg.entries.iter().map(|e| e.source.as_str()).collect();
        assert_eq!(tags, vec!["b", "b", "b", "a", "a"]);
        assert_eq!(agg.entries[0].link, "https://b.example/rss/0");
        assert_eq!(agg.entries[2].link, "https://b.example/rss/2");
        assert_eq!(agg.entries[3].title, "https://a.example/rss #0");
    }

    #[tokio::test]
    async fn truncates_each_source_to_cap() {
        let feeds = specs(&["a", "b"]);
        let source = StaticFeedSource::new()
            .with_items("https://a.example/rss", 10)
            .with_items("https://b.example/rss", 2);

        let agg = aggregate_entries(&source, &feeds, 4).await;
        assert_eq!(agg.entries.len(), 6);
        assert_eq!(agg.sources[0], SourceOutcome { source: "a".into(), fetched: 10, kept: 4, error: None });
        assert_eq!(agg.sources[1].kept, 2);
    }

    #[tokio::test]
    async fn failing_source_is_recorded_and_skipped() {
        let feeds = specs(&["a", "broken", "c"]);
        let source = StaticFeedSource::new()
            .with_items("https://a.example/rss", 10)
            .with_error("https://broken.example/rss", "connection reset")
            .with_items("https://c.example/rss", 5);

        let agg = aggregate_entries(&source, &feeds, 75).await;
        assert_eq!(agg.entries.len(), 15);
        assert_eq!(agg.failed_sources(), 1);
        assert_eq!(agg.sources[1].error.as_deref(), Some("connection reset"));
        assert_eq!(source.requested().len(), 3);
    }

    #[tokio::test]
    async fn all_sources_failing_yields_empty_list() {
        let feeds = specs(&["a", "b"]);
        let source = StaticFeedSource::new();
        let agg = aggregate_entries(&source, &feeds, 75).await;
        assert!(agg.entries.is_empty());
        assert_eq!(agg.failed_sources(), 2);
    }

    #[tokio::test]
    async fn items_without_link_are_dropped_after_the_cap() {
        let feeds = specs(&["a"]);
        let items = vec![
            FeedItem { title: Some("no link".into()), link: None, summary: None },
            FeedItem { title: None, link: Some("https://a.example/1".into()), summary: None },
            FeedItem { title: Some("third".into()), link: Some("https://a.example/2".into()), summary: None },
        ];
        let source = StaticFeedSource::new().with_raw("https://a.example/rss", items);

        let agg = aggregate_entries(&source, &feeds, 2).await;
        assert_eq!(agg.entries.len(), 1);
        assert_eq!(agg.entries[0].title, "");
        assert_eq!(agg.entries[0].summary, "");
        assert_eq!(agg.sources[0].fetched, 3);
        assert_eq!(agg.sources[0].kept, 1);
    }
}
