//! Page content extraction
//!
//! Fetches a URL and reduces the page to its readable text: paragraphs,
//! headings and list items outside navigation chrome.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::core::text::collapse_whitespace;
use crate::core::{FetchConfig, QuaeroError, Result};
use crate::tools::FetchCapability;

/// Elements whose subtrees never contribute text
const SKIPPED_ANCESTORS: [&str; 6] = ["script", "style", "nav", "footer", "header", "noscript"];

/// Fragments this short are usually buttons or labels
const MIN_FRAGMENT_CHARS: usize = 20;

/// Content-extraction capability over plain HTTP
pub struct HttpFetcher {
    client: Client,
    min_delay_ms: u64,
    max_delay_ms: u64,
}

impl HttpFetcher {
    /// Create a fetcher from configuration
    pub fn from_config(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            min_delay_ms: config.min_delay_ms.min(config.max_delay_ms),
            max_delay_ms: config.max_delay_ms.max(config.min_delay_ms),
        })
    }

    /// Random pause between requests to the same sites
    async fn politeness_delay(&self) {
        if self.max_delay_ms == 0 {
            return;
        }
        let ms = rand::rng().random_range(self.min_delay_ms..=self.max_delay_ms);
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

/// Accept only absolute http(s) URLs with a host
pub fn validate_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(QuaeroError::fetch(format!("Invalid URL format: {}", raw)));
    }
    Ok(url)
}

fn is_textual(content_type: &str) -> bool {
    let content_type = content_type.to_lowercase();
    content_type.starts_with("text/")
        || content_type.contains("html")
        || content_type.contains("xml")
        || content_type.contains("json")
}

#[async_trait]
impl FetchCapability for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let url = validate_url(url)?;
        self.politeness_delay().await;

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                QuaeroError::fetch(format!("Timeout error when accessing {}", url))
            } else if e.is_connect() {
                QuaeroError::fetch(format!("Connection error when accessing {}", url))
            } else {
                QuaeroError::from(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(QuaeroError::fetch(format!(
                "HTTP error {} when accessing {}",
                status.as_u16(),
                url
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_string();
        if !is_textual(&content_type) {
            return Err(QuaeroError::fetch(format!(
                "Non-text content ({}) at {}",
                content_type, url
            )));
        }

        let body = response.text().await?;
        let text = if content_type.contains("html") {
            extract_text(&body)?
        } else {
            collapse_whitespace(&body)
        };

        debug!(url = %url, chars = text.len(), "page extracted");

        if text.is_empty() {
            return Err(QuaeroError::fetch(format!(
                "No readable content found at {}",
                url
            )));
        }
        Ok(text)
    }
}

/// Reduce an HTML document to its readable text
pub fn extract_text(html: &str) -> Result<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("p, h1, h2, h3, h4, h5, h6, li")
        .map_err(|e| QuaeroError::fetch(format!("bad selector: {:?}", e)))?;

    let fragments: Vec<String> = document
        .select(&selector)
        .filter(|element| {
            !element.ancestors().any(|node| {
                node.value()
                    .as_element()
                    .is_some_and(|e| SKIPPED_ANCESTORS.contains(&e.name()))
            })
        })
        .map(|element| collapse_whitespace(&element.text().collect::<Vec<_>>().join(" ")))
        .filter(|text| text.chars().count() > MIN_FRAGMENT_CHARS)
        .collect();

    Ok(fragments.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text_skips_chrome() {
        let html = r#"
            <html><head><style>p { color: red }</style></head><body>
              <header><p>Site header paragraph that is long enough</p></header>
              <nav><li>Navigation entry that is long enough to count</li></nav>
              <h1>Choosing a programming laptop</h1>
              <p>Memory matters more than   clock speed for compiling.</p>
              <p>Short one</p>
              <ul><li>Battery life above ten hours is common now</li></ul>
              <footer><p>Copyright notice that is definitely long</p></footer>
            </body></html>
        "#;

        let text = extract_text(html).unwrap();
        assert!(text.contains("Choosing a programming laptop"));
        assert!(text.contains("Memory matters more than clock speed for compiling."));
        assert!(text.contains("Battery life"));
        assert!(!text.contains("Short one"));
        assert!(!text.contains("header paragraph"));
        assert!(!text.contains("Navigation"));
        assert!(!text.contains("Copyright"));
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com/a").is_ok());
        assert!(validate_url("ftp://example.com").is_err());
        assert!(validate_url("example.com").is_err());
    }

    #[test]
    fn test_is_textual() {
        assert!(is_textual("text/html; charset=utf-8"));
        assert!(is_textual("application/xhtml+xml"));
        assert!(!is_textual("application/pdf"));
        assert!(!is_textual("image/png"));
    }

    #[tokio::test]
    async fn test_fetch_rejects_invalid_url_without_network() {
        let fetcher = HttpFetcher::from_config(&FetchConfig::default()).unwrap();
        let err = tokio_test::assert_err!(fetcher.fetch("not a url").await);
        assert!(matches!(err, QuaeroError::Url(_)));
    }
}
