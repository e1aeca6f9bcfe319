//! `/getHandleById`: commerce id to storefront handle.
//!
//! This endpoint predates the `/api/v1` envelope and keeps its flat
//! `{handle}` / `{error}` bodies.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use fsnav_core::CatalogKind;

use super::AppState;

#[derive(Debug, Deserialize)]
pub(super) struct HandleQuery {
    id: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Serialize)]
struct HandleBody {
    handle: String,
}

#[derive(Debug, Serialize)]
struct HandleErrorBody {
    error: String,
}

fn handle_error(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(HandleErrorBody {
            error: error.into(),
        }),
    )
        .into_response()
}

pub(super) async fn get_handle_by_id(
    State(state): State<AppState>,
    Query(query): Query<HandleQuery>,
) -> Response {
    let Some(id) = query.id.filter(|id| !id.is_empty()) else {
        return handle_error(StatusCode::BAD_REQUEST, "ID is required");
    };
    let Some(kind) = query
        .kind
        .as_deref()
        .and_then(|kind| kind.parse::<CatalogKind>().ok())
    else {
        return handle_error(
            StatusCode::BAD_REQUEST,
            "Valid type is required (product, category, or content)",
        );
    };

    match state.shop.get_handle(&id, kind).await {
        Ok(Some(handle)) => (StatusCode::OK, Json(HandleBody { handle })).into_response(),
        Ok(None) => handle_error(StatusCode::NOT_FOUND, format!("{kind} not found")),
        Err(e) => {
            tracing::warn!(id = %id, %kind, error = %e, "handle lookup failed");
            handle_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to fetch {kind} handle"),
            )
        }
    }
}
