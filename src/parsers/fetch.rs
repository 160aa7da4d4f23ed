//! Page fetching shared by HTML-scraping parsers.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::util::http::HttpClient;

/// Pages shorter than this are almost always a bot wall or a JS shell.
pub const MIN_CONTENT_LENGTH: usize = 500;

/// Fetch a page as text through the shared rate-limited client.
pub async fn fetch_page(http: &HttpClient, url: &str) -> Result<String> {
    let html = http
        .get_text(url)
        .await
        .with_context(|| format!("fetching {url}"))?;
    if html.len() < MIN_CONTENT_LENGTH {
        warn!(url, bytes = html.len(), "page content suspiciously small");
    } else {
        info!(url, bytes = html.len(), "page fetched");
    }
    Ok(html)
}
