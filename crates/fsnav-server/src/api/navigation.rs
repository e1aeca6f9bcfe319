use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;

use fsnav_core::{ExtraMenu, NavigationTree};
use fsnav_resolver::RouteDecision;

use crate::middleware::RequestId;

use super::{map_navigation_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct LocaleQuery {
    pub locale: Option<String>,
}

pub(super) async fn get_navigation(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<LocaleQuery>,
) -> Result<Json<ApiResponse<NavigationTree>>, ApiError> {
    let locale = state.locale(query.locale.as_deref());
    let tree = state
        .storefront
        .get_navigation(&locale)
        .await
        .map_err(|e| map_navigation_error(req_id.0.clone(), &e))?;
    Ok(ApiResponse::new(NavigationTree::clone(&tree), req_id))
}

pub(super) async fn get_extra_menu(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<LocaleQuery>,
) -> Result<Json<ApiResponse<ExtraMenu>>, ApiError> {
    let locale = state.locale(query.locale.as_deref());
    let menu = state
        .storefront
        .extra_menu(&locale)
        .await
        .map_err(|e| map_navigation_error(req_id.0.clone(), &e))?;
    Ok(ApiResponse::new(ExtraMenu::clone(&menu), req_id))
}

/// `GET /api/v1/routes/{*path}`: which CMS page renders a storefront path.
/// A locale prefix in the path wins over the `locale` query parameter.
pub(super) async fn decide_route(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(path): Path<String>,
    Query(query): Query<LocaleQuery>,
) -> Result<Json<ApiResponse<RouteDecision>>, ApiError> {
    let fallback = state.locale(query.locale.as_deref());
    let decision = state
        .storefront
        .decide_route(&path, Some(&fallback))
        .await
        .map_err(|e| map_navigation_error(req_id.0.clone(), &e))?;
    Ok(ApiResponse::new(decision, req_id))
}
