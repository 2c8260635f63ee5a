//! Client for the NCBI EUtils endpoints the proxy forwards to.
//!
//! Search uses the two-step history protocol: the first `esearch` call
//! creates a session on NCBI's history server (`usehistory=y`), the second
//! fetches the requested slice of the stored ID list. The two calls are
//! strictly sequential, and no retries are attempted anywhere.

use crate::config::AppConfig;
use crate::error::{ProxyError, Result};
use crate::paper::SourceDb;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

/// Upper bound NCBI accepts for a single page
pub const MAX_RETMAX: u32 = 10_000;

#[derive(Debug, Deserialize)]
struct ESearchResponse {
    esearchresult: ESearchResult,
}

#[derive(Debug, Deserialize)]
struct ESearchResult {
    count: Option<String>,
    webenv: Option<String>,
    #[serde(rename = "querykey")]
    query_key: Option<String>,
    #[serde(default)]
    idlist: Vec<String>,
    #[serde(rename = "ERROR")]
    error: Option<String>,
}

/// One page of search results plus the total hit count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPage {
    pub ids: Vec<String>,
    pub total: u64,
}

/// Client for the EUtils `esearch`/`efetch` endpoints
#[derive(Clone)]
pub struct EUtilsClient {
    client: Client,
    base_url: String,
}

impl EUtilsClient {
    pub fn new(config: &AppConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.effective_base_url().to_string(),
        }
    }

    /// Resolve a free-text term into one page of source-database IDs.
    ///
    /// Inputs are assumed validated by the caller; no upstream call is made
    /// for invalid parameters. When `retstart` lies past the result set the
    /// second call is skipped and an empty page with the real total is
    /// returned.
    #[instrument(skip(self, term), fields(db = %db, retstart = retstart, retmax = retmax))]
    pub async fn search_page(
        &self,
        db: SourceDb,
        term: &str,
        retstart: u64,
        retmax: u32,
    ) -> Result<SearchPage> {
        let url = format!(
            "{}/esearch.fcgi?db={}&term={}&retmode=json&usehistory=y",
            self.base_url,
            db,
            urlencoding::encode(term)
        );

        debug!("Making history-creating ESearch request");
        let first = self.get_esearch(&url).await?;

        let count: u64 = first
            .count
            .as_deref()
            .and_then(|c| c.parse().ok())
            .unwrap_or(0);
        let webenv = first.webenv.ok_or_else(|| ProxyError::UpstreamProtocol {
            message: "ESearch response did not include a WebEnv token".to_string(),
        })?;
        let query_key = first.query_key.ok_or_else(|| ProxyError::UpstreamProtocol {
            message: "ESearch response did not include a query key".to_string(),
        })?;

        if retstart >= count {
            debug!(count, "requested page starts past the result set");
            return Ok(SearchPage {
                ids: Vec::new(),
                total: count,
            });
        }

        let url = format!(
            "{}/esearch.fcgi?db={}&query_key={}&WebEnv={}&retstart={}&retmax={}&retmode=json",
            self.base_url,
            db,
            urlencoding::encode(&query_key),
            urlencoding::encode(&webenv),
            retstart,
            retmax
        );

        debug!("Making session-scoped ESearch request");
        let page = self.get_esearch(&url).await?;

        info!(
            total = count,
            returned = page.idlist.len(),
            "search page fetched"
        );

        Ok(SearchPage {
            ids: page.idlist,
            total: count,
        })
    }

    /// Fetch the raw XML document for a batch of IDs.
    #[instrument(skip(self, ids), fields(db = %db, ids_count = ids.len()))]
    pub async fn fetch_xml(&self, db: SourceDb, ids: &[String]) -> Result<String> {
        let url = format!(
            "{}/efetch.fcgi?db={}&id={}&retmode=xml",
            self.base_url,
            db,
            urlencoding::encode(&ids.join(","))
        );

        debug!("Making EFetch request");
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "EFetch request failed");
            return Err(ProxyError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.text().await?)
    }

    async fn get_esearch(&self, url: &str) -> Result<ESearchResult> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "ESearch request failed");
            return Err(ProxyError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ESearchResponse = response.json::<ESearchResponse>().await?;
        if let Some(message) = parsed.esearchresult.error {
            return Err(ProxyError::UpstreamProtocol {
                message: format!("NCBI ESearch error: {message}"),
            });
        }

        Ok(parsed.esearchresult)
    }
}
