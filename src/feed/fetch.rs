use std::time::Duration;

use anyhow::{Context, Result};
use bytes::Bytes;
use reqwest::Client;

const FEED_TIMEOUT_SECS: u64 = 30;

pub fn http_client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!("ai-news-digest/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(FEED_TIMEOUT_SECS))
        .build()
        .context("build feed http client")
}

pub async fn fetch_rss(client: &Client, url: &str) -> Result<Bytes> {
    let bytes = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;
    Ok(bytes)
}
