use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use fsnav_core::Locale;
use fsnav_resolver::{EditorEvent, SessionEffect};

use crate::middleware::RequestId;

use super::{ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct PreviewEffects {
    effects: Vec<SessionEffect>,
}

#[derive(Debug, Deserialize)]
pub(super) struct LocaleChange {
    locale: String,
}

#[derive(Debug, Serialize)]
pub(super) struct ActiveLocale {
    locale: Locale,
}

pub(super) async fn handle_event(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(event): Json<EditorEvent>,
) -> Json<ApiResponse<PreviewEffects>> {
    let effects = state.preview.handle(event).await;
    ApiResponse::new(PreviewEffects { effects }, req_id)
}

pub(super) async fn set_locale(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(change): Json<LocaleChange>,
) -> Json<ApiResponse<ActiveLocale>> {
    let locale = state.locale(Some(&change.locale));
    state.preview.set_locale(locale);
    ApiResponse::new(
        ActiveLocale {
            locale: state.preview.locale(),
        },
        req_id,
    )
}

pub(super) async fn route_changed(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<ActiveLocale>> {
    state.preview.route_changed();
    ApiResponse::new(
        ActiveLocale {
            locale: state.preview.locale(),
        },
        req_id,
    )
}
