use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use fsnav_core::LinkReference;

use crate::middleware::RequestId;

use super::{map_navigation_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct ResolveRequest {
    link: serde_json::Value,
    locale: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct ResolvedLink {
    route: Option<String>,
    external: bool,
}

pub(super) async fn resolve_link(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ResolveRequest>,
) -> Result<Json<ApiResponse<ResolvedLink>>, ApiError> {
    let Some(link) = LinkReference::from_json(&body.link) else {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "link must be a JSON object",
        ));
    };
    let locale = state.locale(body.locale.as_deref());
    let route = state
        .storefront
        .resolve_reference(&link, &locale)
        .await
        .map_err(|e| map_navigation_error(req_id.0.clone(), &e))?;
    Ok(ApiResponse::new(
        ResolvedLink {
            route,
            external: link.is_external(),
        },
        req_id,
    ))
}
