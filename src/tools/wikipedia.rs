//! Wikipedia search through the MediaWiki action API.

use super::{truncate_chars, SearchTool, MAX_QUERY_CHARS};
use crate::config::WikipediaSettings;
use crate::error::{DelveError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

const TOOL: &str = "wikipedia";

/// Encyclopedia search adapter.
pub struct WikipediaSearch {
    client: reqwest::Client,
    endpoint: String,
    top_k_results: usize,
    doc_content_chars_max: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    query: Option<ExtractQuery>,
}

#[derive(Debug, Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    missing: bool,
}

impl WikipediaSearch {
    pub fn new(client: reqwest::Client, settings: &WikipediaSettings) -> Self {
        Self {
            client,
            endpoint: settings.endpoint.clone(),
            top_k_results: settings.top_k_results,
            doc_content_chars_max: settings.doc_content_chars_max,
        }
    }

    fn search_url(&self, query: &str) -> Result<Url> {
        let query = truncate_chars(query, MAX_QUERY_CHARS);
        let limit = self.top_k_results.to_string();
        Ok(Url::parse_with_params(
            &self.endpoint,
            &[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query.as_str()),
                ("srlimit", limit.as_str()),
                ("format", "json"),
                ("formatversion", "2"),
            ],
        )?)
    }

    fn extract_url(&self, title: &str) -> Result<Url> {
        Ok(Url::parse_with_params(
            &self.endpoint,
            &[
                ("action", "query"),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", title),
                ("format", "json"),
                ("formatversion", "2"),
            ],
        )?)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        self.client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| DelveError::tool(TOOL, e))?
            .json::<T>()
            .await
            .map_err(|e| DelveError::tool(TOOL, e))
    }
}

#[async_trait]
impl SearchTool for WikipediaSearch {
    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<String>> {
        let response: SearchResponse = self.get_json(self.search_url(query)?).await?;
        let titles = titles_from(response, self.top_k_results);

        debug!("Wikipedia matched {} page(s)", titles.len());

        let mut snippets = Vec::with_capacity(titles.len());
        for title in titles {
            let response: ExtractResponse = self.get_json(self.extract_url(&title)?).await?;
            if let Some(snippet) = page_snippet(response) {
                snippets.push(truncate_chars(&snippet, self.doc_content_chars_max));
            }
        }

        Ok(snippets)
    }
}

fn titles_from(response: SearchResponse, limit: usize) -> Vec<String> {
    response
        .query
        .map(|q| q.search.into_iter().take(limit).map(|hit| hit.title).collect())
        .unwrap_or_default()
}

/// `Page: <title>\nSummary: <intro>` for the first existing page.
fn page_snippet(response: ExtractResponse) -> Option<String> {
    let page = response
        .query?
        .pages
        .into_iter()
        .find(|page| !page.missing)?;

    let summary = page.extract.unwrap_or_default();
    Some(format!("Page: {}\nSummary: {}", page.title, summary.trim()))
}
