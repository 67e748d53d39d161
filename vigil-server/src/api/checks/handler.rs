//! Check API Handlers
//!
//! Each handler decodes the request into the typed filter/update shapes,
//! dispatches to the service contract and re-encodes the result with its
//! decorations (attached labels, pagination links). Decode failures are
//! always classified `Invalid`; service errors pass through the single
//! taxonomy-to-status translation in [`crate::utils::error`].

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use vigil_core::{
    Check, CheckFilter, CheckUpdate, Error, FindOptions, Id, Label, CHECK_DEFAULT_PAGE_SIZE,
    CHECK_MAX_PAGE_SIZE,
};

use crate::core::AppState;
use crate::utils::{ApiError, ApiResult};

const CHECKS_PATH: &str = "/api/v2/checks";

/// Decode a path id segment; a blank segment means the url is missing it.
fn decode_id(raw: &str) -> Result<Id, ApiError> {
    if raw.trim().is_empty() {
        return Err(ApiError(Error::invalid("url missing id")));
    }
    raw.parse::<Id>().map_err(ApiError)
}

/// Decode a JSON body, classifying any parse failure as `Invalid`.
fn decode_body<T: serde::de::DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        ApiError(
            Error::invalid(format!("failed to decode request: {e}")).with_source(e),
        )
    })
}

// ========== GET /api/v2/checks ==========

#[derive(Debug, Default, Deserialize)]
pub struct ListChecksParams {
    limit: Option<String>,
    offset: Option<String>,
    descending: Option<String>,
    #[serde(rename = "orgID")]
    org_id: Option<String>,
    org: Option<String>,
}

fn decode_list_request(params: ListChecksParams) -> Result<(CheckFilter, FindOptions), ApiError> {
    let mut filter = CheckFilter::default();
    let mut opts = FindOptions::default();

    match params.limit {
        Some(raw) => {
            let limit: usize = raw
                .parse()
                .map_err(|e| ApiError(Error::invalid(format!("invalid limit: {e}"))))?;
            if limit < 1 || limit > CHECK_MAX_PAGE_SIZE {
                return Err(ApiError(Error::unprocessable(format!(
                    "limit must be between 1 and {CHECK_MAX_PAGE_SIZE}"
                ))));
            }
            filter.limit = limit;
            opts.limit = Some(limit);
        }
        None => {
            filter.limit = CHECK_DEFAULT_PAGE_SIZE;
            opts.limit = Some(CHECK_DEFAULT_PAGE_SIZE);
        }
    }

    if let Some(raw) = params.offset {
        opts.offset = raw
            .parse()
            .map_err(|e| ApiError(Error::invalid(format!("invalid offset: {e}"))))?;
    }
    if let Some(raw) = params.descending {
        opts.descending = raw
            .parse()
            .map_err(|e| ApiError(Error::invalid(format!("invalid descending: {e}"))))?;
    }

    if let Some(raw) = params.org_id {
        filter.org_id = Some(raw.parse::<Id>().map_err(ApiError)?);
    }
    filter.org = params.org;

    Ok((filter, opts))
}

/// Hypermedia links for a list page.
#[derive(Debug, Serialize)]
pub struct PaginationLinks {
    #[serde(rename = "self")]
    pub self_link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

fn page_link(opts: FindOptions, offset: usize) -> String {
    let mut link = format!("{CHECKS_PATH}?offset={offset}");
    if let Some(limit) = opts.limit {
        link.push_str(&format!("&limit={limit}"));
    }
    if opts.descending {
        link.push_str("&descending=true");
    }
    link
}

/// Compute self/prev/next from the slice position and the unsliced total.
fn pagination_links(opts: FindOptions, total: usize) -> PaginationLinks {
    let prev = (opts.offset > 0).then(|| {
        let step = opts.limit.unwrap_or(opts.offset);
        page_link(opts, opts.offset.saturating_sub(step))
    });
    let next = match opts.limit {
        Some(limit) if opts.offset + limit < total => Some(page_link(opts, opts.offset + limit)),
        _ => None,
    };
    PaginationLinks {
        self_link: page_link(opts, opts.offset),
        prev,
        next,
    }
}

#[derive(Debug, Serialize)]
pub struct ChecksResponse {
    pub links: PaginationLinks,
    pub checks: Vec<CheckResponse>,
}

/// GET /api/v2/checks - list checks with pagination links
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListChecksParams>,
) -> ApiResult<Json<ChecksResponse>> {
    let (filter, opts) = decode_list_request(params)?;

    let (checks, total) = state.checks.find_checks(filter, opts).await?;
    debug!(count = checks.len(), total, "checks retrieved");

    Ok(Json(ChecksResponse {
        links: pagination_links(opts, total),
        checks: checks
            .into_iter()
            .map(|c| CheckResponse::new(c, Vec::new()))
            .collect(),
    }))
}

// ========== POST /api/v2/checks ==========

/// Single-check response body: the entity plus its read-only decorations.
#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub links: CheckLinks,
    #[serde(flatten)]
    pub check: Check,
    pub labels: Vec<Label>,
}

#[derive(Debug, Serialize)]
pub struct CheckLinks {
    #[serde(rename = "self")]
    pub self_link: String,
    pub labels: String,
}

impl CheckResponse {
    pub fn new(check: Check, labels: Vec<Label>) -> Self {
        Self {
            links: CheckLinks {
                self_link: format!("{CHECKS_PATH}/{}", check.id),
                labels: format!("{CHECKS_PATH}/{}/labels", check.id),
            },
            check,
            labels,
        }
    }
}

/// POST /api/v2/checks - create a check
pub async fn create(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<CheckResponse>)> {
    let check: Check = decode_body(&body)?;
    if !check.org_id.valid() {
        return Err(ApiError(Error::invalid("check requires an organization")));
    }

    let created = state.checks.create_check(check).await?;
    debug!(check = %created.id, "check created");

    // A fresh check cannot have labels attached yet.
    Ok((
        StatusCode::CREATED,
        Json(CheckResponse::new(created, Vec::new())),
    ))
}

// ========== GET /api/v2/checks/{id} ==========

/// GET /api/v2/checks/{id} - fetch a single check with attached labels
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CheckResponse>> {
    let id = decode_id(&id)?;

    let check = state.checks.find_check_by_id(id).await?;
    let labels = state.labels.find_resource_labels(check.id).await?;
    debug!(check = %id, "check retrieved");

    Ok(Json(CheckResponse::new(check, labels)))
}

// ========== PATCH /api/v2/checks/{id} ==========

/// PATCH /api/v2/checks/{id} - partial update
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<CheckResponse>> {
    let id = decode_id(&id)?;
    let upd: CheckUpdate = decode_body(&body)?;

    let updated = state.checks.update_check(id, upd).await?;
    let labels = state.labels.find_resource_labels(updated.id).await?;
    debug!(check = %id, "check updated");

    Ok(Json(CheckResponse::new(updated, labels)))
}

// ========== DELETE /api/v2/checks/{id} ==========

/// DELETE /api/v2/checks/{id} - hard delete
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = decode_id(&id)?;

    state.checks.delete_check(id).await?;
    debug!(check = %id, "check deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(limit: Option<&str>, offset: Option<&str>) -> ListChecksParams {
        ListChecksParams {
            limit: limit.map(Into::into),
            offset: offset.map(Into::into),
            ..Default::default()
        }
    }

    #[test]
    fn list_request_defaults_the_page_size() {
        let (filter, opts) = decode_list_request(params(None, None)).unwrap();
        assert_eq!(filter.limit, CHECK_DEFAULT_PAGE_SIZE);
        assert_eq!(opts.limit, Some(CHECK_DEFAULT_PAGE_SIZE));
    }

    #[test]
    fn list_request_rejects_out_of_range_limits() {
        for raw in ["0", "501"] {
            let err = decode_list_request(params(Some(raw), None)).unwrap_err();
            assert_eq!(err.0.code(), vigil_core::ErrorCode::UnprocessableEntity);
        }
        let err = decode_list_request(params(Some("abc"), None)).unwrap_err();
        assert_eq!(err.0.code(), vigil_core::ErrorCode::Invalid);
    }

    #[test]
    fn list_request_decodes_org_filters() {
        let p = ListChecksParams {
            org_id: Some("020f755c3c083000".into()),
            org: Some("theorg".into()),
            ..Default::default()
        };
        let (filter, _) = decode_list_request(p).unwrap();
        assert_eq!(filter.org_id, Some("020f755c3c083000".parse().unwrap()));
        assert_eq!(filter.org.as_deref(), Some("theorg"));

        let bad = ListChecksParams {
            org_id: Some("not-an-id".into()),
            ..Default::default()
        };
        let err = decode_list_request(bad).unwrap_err();
        assert_eq!(err.0.code(), vigil_core::ErrorCode::Invalid);
    }

    #[test]
    fn pagination_links_cover_the_neighbor_pages() {
        let opts = FindOptions {
            offset: 20,
            limit: Some(20),
            descending: false,
        };
        let links = pagination_links(opts, 50);
        assert_eq!(links.self_link, "/api/v2/checks?offset=20&limit=20");
        assert_eq!(links.prev.as_deref(), Some("/api/v2/checks?offset=0&limit=20"));
        assert_eq!(links.next.as_deref(), Some("/api/v2/checks?offset=40&limit=20"));
    }

    #[test]
    fn last_page_has_no_next_link() {
        let opts = FindOptions {
            offset: 40,
            limit: Some(20),
            descending: false,
        };
        let links = pagination_links(opts, 50);
        assert!(links.next.is_none());
        assert!(links.prev.is_some());
    }

    #[test]
    fn blank_path_id_is_invalid() {
        let err = decode_id(" ").unwrap_err();
        assert_eq!(err.0, Error::invalid("url missing id"));
    }
}
