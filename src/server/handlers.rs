//! Request handlers for the three inbound routes.
//!
//! All parameter validation happens here, before any upstream call; the
//! orchestration below each validation block is one or two sequential EUtils
//! calls, never more.

use super::{ApiError, SharedState};
use crate::enrich;
use crate::error::ProxyError;
use crate::eutils::MAX_RETMAX;
use crate::ids::sanitize_pmcid;
use crate::normalize;
use crate::paper::{PaperRecord, SourceDb};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::instrument;

pub async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    term: Option<String>,
    db: Option<String>,
    retstart: Option<String>,
    retmax: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    ids: Vec<String>,
    total: u64,
    retstart: u64,
    retmax: u32,
}

/// GET /api/search — paginated ID resolution via the history protocol.
#[instrument(skip(state, params))]
pub async fn search(
    State(state): State<SharedState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let term = params.term.as_deref().map(str::trim).unwrap_or("");
    if term.is_empty() {
        return Err(ProxyError::InvalidRequest("missing or empty term".into()).into());
    }
    let db: SourceDb = params.db.as_deref().unwrap_or("").parse()?;

    let retstart: u64 = match params.retstart.as_deref() {
        None | Some("") => 0,
        Some(raw) => raw.parse().map_err(|_| {
            ProxyError::InvalidRequest(format!(
                "retstart must be a non-negative integer, got {raw:?}"
            ))
        })?,
    };
    let retmax: u32 = match params.retmax.as_deref() {
        None | Some("") => 10,
        Some(raw) => raw.parse().map_err(|_| {
            ProxyError::InvalidRequest(format!("retmax must be a positive integer, got {raw:?}"))
        })?,
    };
    if retmax == 0 || retmax > MAX_RETMAX {
        return Err(
            ProxyError::InvalidRequest(format!("retmax must be between 1 and {MAX_RETMAX}")).into(),
        );
    }

    let page = state.eutils.search_page(db, term, retstart, retmax).await?;
    Ok(Json(SearchResponse {
        ids: page.ids,
        total: page.total,
        retstart,
        retmax,
    }))
}

#[derive(Debug, Deserialize)]
pub struct PapersRequest {
    ids: Option<Vec<String>>,
    db: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PapersResponse {
    papers: Vec<PaperRecord>,
    total: usize,
}

/// POST /api/papers — batch retrieval with the conditional PMC enrichment
/// pass for PubMed-sourced records.
#[instrument(skip(state, body))]
pub async fn papers(
    State(state): State<SharedState>,
    Json(body): Json<PapersRequest>,
) -> Result<Json<PapersResponse>, ApiError> {
    let db: SourceDb = body.db.as_deref().unwrap_or("").parse()?;
    let ids = body.ids.unwrap_or_default();
    if ids.is_empty() {
        return Err(ProxyError::InvalidRequest("missing or empty ids".into()).into());
    }

    let ids: Vec<String> = match db {
        SourceDb::Pmc => ids.iter().map(|id| sanitize_pmcid(id)).collect(),
        SourceDb::Pubmed => ids.iter().map(|id| id.trim().to_string()).collect(),
    };
    if ids.iter().any(String::is_empty) {
        return Err(
            ProxyError::InvalidRequest("one or more ids are empty after sanitization".into())
                .into(),
        );
    }

    let xml = state.eutils.fetch_xml(db, &ids).await?;
    let mut papers = normalize::normalize(&xml, db)?;
    if db == SourceDb::Pubmed {
        enrich::enrich_from_pmc(&state.eutils, &mut papers).await?;
    }

    let total = papers.len();
    Ok(Json(PapersResponse { papers, total }))
}

/// GET /api/paper/{id} — single-ID lookup, PubMed first, then PMC. The
/// response is the bare record without `authorsArray`.
#[instrument(skip(state))]
pub async fn paper(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<PaperRecord>, ApiError> {
    let id = id.trim().to_string();
    if id.is_empty() {
        return Err(ProxyError::InvalidRequest("missing paper id".into()).into());
    }

    let xml = state
        .eutils
        .fetch_xml(SourceDb::Pubmed, std::slice::from_ref(&id))
        .await?;
    let mut detail = upstream_error_text(&xml);
    let records = normalize::normalize(&xml, SourceDb::Pubmed)?;
    if let Some(record) = records.into_iter().next() {
        return Ok(Json(record.without_authors_array()));
    }

    let pmc_id = sanitize_pmcid(&id);
    if !pmc_id.is_empty() {
        let xml = state
            .eutils
            .fetch_xml(SourceDb::Pmc, std::slice::from_ref(&pmc_id))
            .await?;
        if let Some(text) = upstream_error_text(&xml) {
            detail = Some(text);
        }
        let records = normalize::normalize(&xml, SourceDb::Pmc)?;
        if let Some(record) = records.into_iter().next() {
            return Ok(Json(record.without_authors_array()));
        }
    }

    Err(ProxyError::NotFound {
        id,
        detail: detail.unwrap_or_default(),
    }
    .into())
}

/// EFetch reports failures as an `<ERROR>` element inside an otherwise-2xx
/// response body.
fn upstream_error_text(xml: &str) -> Option<String> {
    let text = xml.split("<ERROR>").nth(1)?.split("</ERROR>").next()?;
    Some(text.trim().to_string())
}
