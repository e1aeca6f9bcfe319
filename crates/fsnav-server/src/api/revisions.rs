use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;

use fsnav_resolver::{Domain, RevisionSnapshot};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct BumpedRevision {
    domain: Domain,
    revision: u64,
}

pub(super) async fn get_revisions(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<RevisionSnapshot>> {
    ApiResponse::new(state.storefront.snapshot(), req_id)
}

/// `POST /api/v1/revisions/{domain}/bump`: invalidates every cache that
/// depends on `domain`.
pub(super) async fn bump_revision(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(domain): Path<String>,
) -> Result<Json<ApiResponse<BumpedRevision>>, ApiError> {
    let domain: Domain = domain
        .parse()
        .map_err(|e: String| ApiError::new(req_id.0.clone(), "validation_error", e))?;
    let revision = state.storefront.bump(domain);
    tracing::info!(%domain, revision, "revision bumped");
    Ok(ApiResponse::new(BumpedRevision { domain, revision }, req_id))
}
