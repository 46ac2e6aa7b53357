//! Web search via the DuckDuckGo HTML endpoint
//!
//! No API key needed. Result links are DuckDuckGo redirects; the real target
//! is carried in the `uddg` query parameter.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::core::text::collapse_whitespace;
use crate::core::{FetchConfig, QuaeroError, Result};
use crate::tools::{SearchCapability, SearchHit};

const ENDPOINT: &str = "https://html.duckduckgo.com/html/";

/// Search capability backed by DuckDuckGo
pub struct DuckDuckGoSearch {
    client: Client,
}

impl DuckDuckGoSearch {
    /// Create a search client from fetch configuration
    pub fn from_config(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl SearchCapability for DuckDuckGoSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let response = self
            .client
            .get(ENDPOINT)
            .query(&[("q", query)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(QuaeroError::search(format!(
                "HTTP {} from search endpoint",
                status
            )));
        }

        let html = response.text().await?;
        let hits = parse_results(&html, max_results)?;
        debug!(query, hits = hits.len(), "search results parsed");
        Ok(hits)
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| QuaeroError::search(format!("bad selector {}: {:?}", css, e)))
}

/// Extract search hits from a DuckDuckGo HTML results page
pub fn parse_results(html: &str, max_results: usize) -> Result<Vec<SearchHit>> {
    let document = Html::parse_document(html);
    let result_sel = selector("div.result")?;
    let link_sel = selector("a.result__a")?;
    let snippet_sel = selector(".result__snippet")?;

    let mut hits = Vec::new();
    for result in document.select(&result_sel) {
        if hits.len() >= max_results {
            break;
        }
        if result.value().classes().any(|c| c == "result--ad") {
            continue;
        }

        let Some(link) = result.select(&link_sel).next() else {
            continue;
        };
        let title = collapse_whitespace(&link.text().collect::<String>());
        let url = link
            .value()
            .attr("href")
            .and_then(resolve_link)
            .unwrap_or_default();
        if title.is_empty() || url.is_empty() {
            continue;
        }

        let snippet = result
            .select(&snippet_sel)
            .next()
            .map(|s| collapse_whitespace(&s.text().collect::<String>()))
            .unwrap_or_default();

        hits.push(SearchHit {
            title,
            url,
            snippet,
        });
    }

    Ok(hits)
}

/// Turn a result href into the target URL, unwrapping DuckDuckGo redirects
fn resolve_link(href: &str) -> Option<String> {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };

    let parsed = Url::parse(&absolute).ok()?;
    if parsed.path().starts_with("/l/") {
        return parsed
            .query_pairs()
            .find(|(key, _)| key == "uddg")
            .map(|(_, value)| value.into_owned());
    }

    matches!(parsed.scheme(), "http" | "https").then_some(absolute)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <div class="result results_links result--ad">
            <a class="result__a" href="https://ads.example.com">Sponsored</a>
          </div>
          <div class="result results_links">
            <h2><a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.rust-lang.org%2F&amp;rut=abc">
              Rust   Programming Language</a></h2>
            <a class="result__snippet">A language empowering <b>everyone</b>.</a>
          </div>
          <div class="result results_links">
            <a class="result__a" href="https://doc.rust-lang.org/book/">The Book</a>
            <div class="result__snippet">Learn Rust.</div>
          </div>
          <div class="result results_links">
            <a class="result__a" href="https://third.example.com/">Third</a>
          </div>
        </body></html>
    "#;

    #[test]
    fn test_parse_results_unwraps_redirects_and_skips_ads() {
        let hits = parse_results(PAGE, 5).unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].title, "Rust Programming Language");
        assert_eq!(hits[0].url, "https://www.rust-lang.org/");
        assert_eq!(hits[0].snippet, "A language empowering everyone.");
        assert_eq!(hits[1].url, "https://doc.rust-lang.org/book/");
        assert_eq!(hits[2].snippet, "");
    }

    #[test]
    fn test_parse_results_respects_limit() {
        let hits = parse_results(PAGE, 1).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_parse_results_empty_page() {
        assert!(parse_results("<html></html>", 5).unwrap().is_empty());
    }

    #[test]
    fn test_resolve_link_rejects_non_http() {
        assert_eq!(resolve_link("javascript:void(0)"), None);
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_live_search() {
        let search = DuckDuckGoSearch::from_config(&FetchConfig::default()).unwrap();
        let hits = search.search("rust programming language", 3).await.unwrap();
        assert!(hits.len() <= 3);
    }
}
