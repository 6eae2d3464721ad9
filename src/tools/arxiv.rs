//! arXiv paper search over the Atom export API.

use super::{truncate_chars, SearchTool, MAX_QUERY_CHARS};
use crate::config::ArxivSettings;
use crate::error::{DelveError, Result};
use async_trait::async_trait;
use chrono::DateTime;
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, instrument};
use url::Url;

const TOOL: &str = "arxiv";

/// Paper search adapter.
pub struct ArxivSearch {
    client: reqwest::Client,
    endpoint: String,
    top_k_results: usize,
    doc_content_chars_max: usize,
}

/// One paper from the feed.
#[derive(Debug, Clone, PartialEq)]
pub struct ArxivEntry {
    pub title: String,
    pub authors: Vec<String>,
    pub summary: String,
    /// Last update date (YYYY-MM-DD).
    pub updated: String,
}

impl ArxivEntry {
    fn snippet(&self) -> String {
        format!(
            "Published: {}\nTitle: {}\nAuthors: {}\nSummary: {}",
            self.updated,
            self.title,
            self.authors.join(", "),
            self.summary
        )
    }
}

impl ArxivSearch {
    pub fn new(client: reqwest::Client, settings: &ArxivSettings) -> Self {
        Self {
            client,
            endpoint: settings.endpoint.clone(),
            top_k_results: settings.top_k_results,
            doc_content_chars_max: settings.doc_content_chars_max,
        }
    }

    /// Build the export API URL for a query.
    ///
    /// Queries made only of arXiv identifiers are looked up by id.
    fn query_url(&self, query: &str) -> Result<Url> {
        let query = truncate_chars(query, MAX_QUERY_CHARS);
        let max_results = self.top_k_results.to_string();

        let url = if is_arxiv_identifier(&query) {
            let ids = query.split_whitespace().collect::<Vec<_>>().join(",");
            Url::parse_with_params(
                &self.endpoint,
                &[("id_list", ids.as_str()), ("max_results", max_results.as_str())],
            )?
        } else {
            Url::parse_with_params(
                &self.endpoint,
                &[
                    ("search_query", query.as_str()),
                    ("start", "0"),
                    ("max_results", max_results.as_str()),
                ],
            )?
        };

        Ok(url)
    }
}

#[async_trait]
impl SearchTool for ArxivSearch {
    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<String>> {
        let url = self.query_url(query)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| DelveError::tool(TOOL, e))?;

        let body = response.text().await.map_err(|e| DelveError::tool(TOOL, e))?;
        let entries = parse_feed(&body);

        debug!("arXiv returned {} entries", entries.len());

        Ok(entries
            .iter()
            .take(self.top_k_results)
            .map(|entry| truncate_chars(&entry.snippet(), self.doc_content_chars_max))
            .collect())
    }
}

/// Whether every whitespace-separated word looks like an arXiv id.
fn is_arxiv_identifier(query: &str) -> bool {
    static ID: OnceLock<Regex> = OnceLock::new();
    let id = ID.get_or_init(|| Regex::new(r"^\d{2}(0[1-9]|1[0-2])\.\d{4,5}(v\d+)?$").expect("valid regex"));

    let mut words = query.split_whitespace().peekable();
    words.peek().is_some() && words.all(|word| id.is_match(word))
}

/// Parse the entries of an Atom feed returned by the export API.
pub fn parse_feed(xml: &str) -> Vec<ArxivEntry> {
    let mut entries = Vec::new();

    for block in xml.split("<entry>").skip(1) {
        let Some(end) = block.find("</entry>") else {
            continue;
        };
        let entry_xml = &block[..end];

        let Some(title) = extract_tag(entry_xml, "title") else {
            continue;
        };

        let authors = entry_xml
            .split("<author>")
            .skip(1)
            .filter_map(|author| extract_tag(author, "name"))
            .collect();

        let updated = extract_tag(entry_xml, "updated")
            .or_else(|| extract_tag(entry_xml, "published"))
            .map(|stamp| match DateTime::parse_from_rfc3339(&stamp) {
                Ok(parsed) => parsed.date_naive().to_string(),
                Err(_) => stamp,
            })
            .unwrap_or_default();

        entries.push(ArxivEntry {
            title,
            authors,
            summary: extract_tag(entry_xml, "summary").unwrap_or_default(),
            updated,
        });
    }

    entries
}

/// Text of the first `<tag ...>...</tag>` element, whitespace-collapsed and unescaped.
fn extract_tag(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{}", tag);
    let close = format!("</{}>", tag);

    let mut search_from = 0;
    while let Some(found) = xml[search_from..].find(&open) {
        let start = search_from + found;
        let after_name = &xml[start + open.len()..];

        // Skip longer tag names sharing the prefix (e.g. <name> vs <namespace>).
        if after_name.starts_with(|c: char| c == '>' || c.is_whitespace()) {
            let content_start = after_name.find('>')? + 1;
            let content = &after_name[content_start..];
            let content_end = content.find(&close)?;
            let text = content[..content_end].split_whitespace().collect::<Vec<_>>().join(" ");
            return Some(unescape_xml(&text));
        }

        search_from = start + open.len();
    }

    None
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
