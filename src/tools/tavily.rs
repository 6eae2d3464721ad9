//! Web search through the Tavily API.

use super::SearchTool;
use crate::config::TavilySettings;
use crate::error::{DelveError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const TOOL: &str = "tavily_search_results_json";

/// Web search adapter.
pub struct TavilySearch {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    max_results: usize,
    search_depth: String,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    max_results: usize,
    search_depth: &'a str,
    include_answer: bool,
    include_raw_content: bool,
    include_images: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    url: String,
    #[serde(default)]
    content: String,
}

/// Snippet shape handed to the model.
#[derive(Debug, Serialize)]
struct Snippet<'a> {
    url: &'a str,
    content: &'a str,
}

impl TavilySearch {
    pub fn new(client: reqwest::Client, settings: &TavilySettings, api_key: &str) -> Self {
        Self {
            client,
            endpoint: settings.endpoint.clone(),
            api_key: api_key.to_string(),
            max_results: settings.max_results,
            search_depth: settings.search_depth.clone(),
        }
    }

    fn request<'a>(&'a self, query: &'a str) -> SearchRequest<'a> {
        SearchRequest {
            query,
            max_results: self.max_results,
            search_depth: &self.search_depth,
            include_answer: false,
            include_raw_content: false,
            include_images: false,
        }
    }
}

#[async_trait]
impl SearchTool for TavilySearch {
    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<String>> {
        let response: SearchResponse = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request(query))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| DelveError::tool(TOOL, e))?
            .json()
            .await
            .map_err(|e| DelveError::tool(TOOL, e))?;

        debug!("Tavily returned {} result(s)", response.results.len());

        snippets_from(response, self.max_results)
    }
}

fn snippets_from(response: SearchResponse, limit: usize) -> Result<Vec<String>> {
    response
        .results
        .iter()
        .take(limit)
        .map(|result| {
            serde_json::to_string(&Snippet {
                url: &result.url,
                content: &result.content,
            })
            .map_err(DelveError::from)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body() {
        let search = TavilySearch::new(reqwest::Client::new(), &TavilySettings::default(), "tvly-key");
        let body = serde_json::to_value(search.request("SpaceX")).unwrap();

        assert_eq!(body["query"], "SpaceX");
        assert_eq!(body["max_results"], 5);
        assert_eq!(body["search_depth"], "advanced");
        assert!(body.get("api_key").is_none());
    }

    #[test]
    fn test_snippets_keep_url_and_content() {
        let response: SearchResponse = serde_json::from_str(
            r#"{"query":"SpaceX","results":[
                {"title":"SpaceX","url":"https://www.spacex.com/","content":"SpaceX designs rockets.","score":0.98},
                {"title":"Wiki","url":"https://en.wikipedia.org/wiki/SpaceX","content":"American company.","score":0.9}
            ]}"#,
        )
        .unwrap();

        let snippets = snippets_from(response, 1).unwrap();
        assert_eq!(
            snippets,
            vec![r#"{"url":"https://www.spacex.com/","content":"SpaceX designs rockets."}"#]
        );
    }

    #[test]
    fn test_missing_results_field() {
        let response: SearchResponse = serde_json::from_str(r#"{"query":"x"}"#).unwrap();
        assert!(snippets_from(response, 5).unwrap().is_empty());
    }
}
