use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use fsnav_core::{PagePayload, PageTarget, Section};
use fsnav_resolver::extract_slot;
use fsnav_shopify::{language_code, ShopifyPage};

use crate::middleware::RequestId;

use super::navigation::LocaleQuery;
use super::{map_page_error, ApiError, ApiResponse, AppState};

const DEFAULT_SLOTS: [&str; 2] = ["stage", "content"];

#[derive(Debug, Deserialize)]
pub(super) struct BindRequest {
    target: PageTarget,
    #[serde(default)]
    slots: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub(super) struct BoundPage {
    target: PageTarget,
    payload: Option<PagePayload>,
    slots: BTreeMap<String, Vec<Section>>,
}

#[derive(Debug, Serialize)]
pub(super) struct CommercePage {
    page: ShopifyPage,
    #[serde(flatten)]
    bound: BoundPage,
}

async fn bind(
    state: &AppState,
    req_id: &RequestId,
    target: PageTarget,
    slots: &[String],
) -> Result<BoundPage, ApiError> {
    let payload = state
        .storefront
        .bind_page(&target)
        .await
        .map_err(|e| map_page_error(req_id.0.clone(), &e))?;
    let slots: BTreeMap<String, Vec<Section>> = payload
        .as_deref()
        .map(|payload| {
            slots
                .iter()
                .map(|name| (name.clone(), extract_slot(payload, name).to_vec()))
                .collect()
        })
        .unwrap_or_default();
    Ok(BoundPage {
        target,
        payload: payload.as_deref().cloned(),
        slots,
    })
}

fn requested_slots(slots: Option<Vec<String>>) -> Vec<String> {
    slots.unwrap_or_else(|| DEFAULT_SLOTS.iter().map(ToString::to_string).collect())
}

/// `POST /api/v1/pages/bind`: payload of a page target plus the sections of
/// the requested slots. A target that names no page yields a `null` payload.
pub(super) async fn bind_page(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<BindRequest>,
) -> Result<Json<ApiResponse<BoundPage>>, ApiError> {
    let slots = requested_slots(body.slots);
    let bound = bind(&state, &req_id, body.target, &slots).await?;
    Ok(ApiResponse::new(bound, req_id))
}

/// `GET /api/v1/pages/{handle}`: a Shopify online-store page and the CMS
/// content anchored to it.
pub(super) async fn get_commerce_page(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(handle): Path<String>,
    Query(query): Query<LocaleQuery>,
) -> Result<Json<ApiResponse<CommercePage>>, ApiError> {
    let locale = state.locale(query.locale.as_deref());
    let page = match state
        .shop
        .fetch_page_by_handle(&handle, &language_code(&locale))
        .await
    {
        Ok(Some(page)) => page,
        Ok(None) => {
            return Err(ApiError::new(
                req_id.0,
                "not_found",
                format!("page {handle} not found"),
            ))
        }
        Err(e) => {
            tracing::warn!(handle = %handle, error = %e, "commerce page lookup failed");
            return Err(ApiError::new(req_id.0, "bad_gateway", e.to_string()));
        }
    };

    let target = page.page_target(locale.cms());
    let bound = bind(&state, &req_id, target, &requested_slots(None)).await?;
    Ok(ApiResponse::new(CommercePage { page, bound }, req_id))
}
