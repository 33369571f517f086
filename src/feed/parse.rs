use anyhow::{anyhow, Context, Result};
use rss::Channel;

use super::types::FeedItem;

/// RSS 2.0 via `rss`; anything else (Atom, RSS 1.0) via `feed-rs`.
pub fn parse_items(xml: &[u8]) -> Result<Vec<FeedItem>> {
    match Channel::read_from(xml) {
        Ok(channel) => Ok(rss_items(&channel)),
        Err(rss_err) => syndication_items(xml).with_context(|| format!("not an RSS 2.0 document ({rss_err})")),
    }
}

fn rss_items(channel: &Channel) -> Vec<FeedItem> {
    channel
        .items()
        .iter()
        .map(|item| FeedItem {
            title: item.title().map(str::to_string),
            link: item.link().map(str::to_string),
            // prefer the short description; fall back to full content
            summary: item.description().or_else(|| item.content()).map(str::to_string),
        })
        .collect()
}

fn syndication_items(xml: &[u8]) -> Result<Vec<FeedItem>> {
    let feed = feed_rs::parser::parse(xml).map_err(|e| anyhow!("failed to parse feed: {e}"))?;
    let items = feed
        .entries
        .into_iter()
        .map(|entry| FeedItem {
            title: entry.title.map(|t| t.content),
            link: entry.links.into_iter().next().map(|l| l.href),
            summary: entry.summary.map(|s| s.content).or_else(|| entry.content.and_then(|c| c.body)),
        })
        .collect();
    Ok(items)
}
