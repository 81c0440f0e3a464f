//! MediaWiki Action API reader

use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{Document, DocumentLoader, LoaderError};
use crate::config::WikipediaConfig;

/// Fetches plain-text page extracts, resolving unknown titles by search
pub struct WikipediaReader {
    http: Client,
    api_url: String,
}

impl WikipediaReader {
    pub fn from_config(config: &WikipediaConfig) -> Result<Self, LoaderError> {
        debug!(language = %config.language, "WikipediaReader::from_config: called");
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            http,
            api_url: config.api_url(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, params: &[(&str, &str)]) -> Result<T, LoaderError> {
        debug!(?params, "WikipediaReader::get: called");
        let response = self.http.get(&self.api_url).query(params).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LoaderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| LoaderError::InvalidResponse(e.to_string()))
    }

    /// Fetch one page by exact title; `None` when it does not exist
    async fn fetch_page(&self, title: &str) -> Result<Option<Document>, LoaderError> {
        let params = page_params(title);
        let response: ApiResponse<PagesQuery> = self.get(&params).await?;
        parse_page(response)
    }

    /// Best search hit for `query`
    async fn search_title(&self, query: &str) -> Result<Option<String>, LoaderError> {
        let params = search_params(query);
        let response: ApiResponse<SearchQuery> = self.get(&params).await?;
        parse_search(response)
    }

    /// Fetch a page, falling back to the best search hit
    async fn load_page(&self, title: &str) -> Result<Option<Document>, LoaderError> {
        debug!(%title, "WikipediaReader::load_page: called");
        if let Some(doc) = self.fetch_page(title).await? {
            return Ok(Some(doc));
        }

        let Some(suggestion) = self.search_title(title).await? else {
            debug!(%title, "load_page: no search results");
            return Ok(None);
        };
        info!(requested = %title, resolved = %suggestion, "Resolved page title by search");
        self.fetch_page(&suggestion).await
    }
}

#[async_trait]
impl DocumentLoader for WikipediaReader {
    async fn load(&self, pages: &[String]) -> Result<Vec<Document>, LoaderError> {
        debug!(?pages, "WikipediaReader::load: called");
        let results = join_all(pages.iter().map(|title| self.load_page(title))).await;

        let mut documents = Vec::with_capacity(pages.len());
        for (title, result) in pages.iter().zip(results) {
            match result {
                Ok(Some(doc)) => {
                    debug!(%title, resolved = %doc.title, chars = doc.text.len(), "load: page loaded");
                    documents.push(doc);
                }
                Ok(None) => warn!(%title, "Wikipedia page not found, skipping"),
                Err(e) => warn!(%title, error = %e, "Failed to load Wikipedia page, skipping"),
            }
        }

        info!("Loaded {} of {} Wikipedia pages", documents.len(), pages.len());
        Ok(documents)
    }
}

fn page_params(title: &str) -> Vec<(&'static str, &str)> {
    vec![
        ("action", "query"),
        ("prop", "extracts|info"),
        ("inprop", "url"),
        ("explaintext", "1"),
        ("redirects", "1"),
        ("format", "json"),
        ("formatversion", "2"),
        ("titles", title),
    ]
}

fn search_params(query: &str) -> Vec<(&'static str, &str)> {
    vec![
        ("action", "query"),
        ("list", "search"),
        ("srlimit", "1"),
        ("srprop", ""),
        ("format", "json"),
        ("formatversion", "2"),
        ("srsearch", query),
    ]
}

fn check_error<T>(response: ApiResponse<T>) -> Result<Option<T>, LoaderError> {
    if let Some(err) = response.error {
        return Err(LoaderError::Query {
            code: err.code,
            info: err.info,
        });
    }
    Ok(response.query)
}

fn parse_page(response: ApiResponse<PagesQuery>) -> Result<Option<Document>, LoaderError> {
    let Some(query) = check_error(response)? else {
        return Ok(None);
    };

    let page = query
        .pages
        .into_iter()
        .find(|p| !p.missing && !p.invalid && p.pageid.is_some());

    Ok(page.and_then(|p| {
        let text = p.extract.unwrap_or_default();
        if text.trim().is_empty() {
            return None;
        }
        let id = p.pageid.map(|id| id.to_string()).unwrap_or_default();
        Some(Document {
            id,
            url: p.fullurl.unwrap_or_default(),
            title: p.title,
            text,
        })
    }))
}

fn parse_search(response: ApiResponse<SearchQuery>) -> Result<Option<String>, LoaderError> {
    Ok(check_error(response)?.and_then(|q| q.search.into_iter().next().map(|hit| hit.title)))
}

// MediaWiki API response types (formatversion=2)

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    query: Option<T>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    info: String,
}

#[derive(Debug, Deserialize)]
struct PagesQuery {
    #[serde(default)]
    pages: Vec<ApiPage>,
}

#[derive(Debug, Deserialize)]
struct ApiPage {
    pageid: Option<u64>,
    title: String,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    extract: Option<String>,
    fullurl: Option<String>,
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
