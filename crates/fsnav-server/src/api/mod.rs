mod handle;
mod navigation;
mod pages;
mod preview;
mod resolve;
mod revisions;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use fsnav_caas::FrontendApiClient;
use fsnav_core::{AppConfig, Locale};
use fsnav_resolver::{
    NavigationError, PageError, PollConfig, PollError, PreviewSession, RevisionSnapshot,
    Storefront, TokioSleeper,
};
use fsnav_shopify::StorefrontClient;

use crate::middleware::{request_id, RequestId, REQUEST_ID_HEADER};

pub type AppStorefront = Storefront<FrontendApiClient, FrontendApiClient, StorefrontClient>;
pub type AppPreview = PreviewSession<FrontendApiClient, FrontendApiClient, StorefrontClient>;

#[derive(Clone)]
pub struct AppState {
    pub storefront: Arc<AppStorefront>,
    pub preview: Arc<AppPreview>,
    pub shop: Arc<StorefrontClient>,
}

impl AppState {
    pub fn new(
        caas: FrontendApiClient,
        shop: StorefrontClient,
        default_locale: Locale,
        poll_config: PollConfig,
        preview: bool,
    ) -> Self {
        let caas = Arc::new(caas);
        let shop = Arc::new(shop);
        let storefront = Arc::new(Storefront::new(
            Arc::clone(&caas),
            caas,
            Arc::clone(&shop),
            TokioSleeper,
            poll_config,
            default_locale,
        ));
        let preview = Arc::new(PreviewSession::new(Arc::clone(&storefront), preview));
        Self {
            storefront,
            preview,
            shop,
        }
    }

    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let caas = FrontendApiClient::with_user_agent(
            &config.ecom_api_url,
            config.request_timeout_secs,
            &config.user_agent,
        )?;
        let shop = StorefrontClient::from_config(config)?;
        Ok(Self::new(
            caas,
            shop,
            Locale::from_cms(&config.ecom_api_locale),
            PollConfig::from_config(config),
            config.preview,
        ))
    }

    /// Locale from a `locale` query/body value. Accepts both the CMS
    /// (`de_DE`) and commerce (`de-de`) forms; falls back to the default.
    pub(super) fn locale(&self, raw: Option<&str>) -> Locale {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            Some(tag) if tag.contains('_') => Locale::from_cms(tag),
            Some(tag) => Locale::from_commerce(tag),
            None => self.storefront.default_locale().clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
struct HealthData {
    status: &'static str,
    preview: bool,
    revisions: RevisionSnapshot,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(data: T, req_id: RequestId) -> Json<Self> {
        Json(Self {
            data,
            meta: ResponseMeta::new(req_id.0),
        })
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "bad_gateway" => StatusCode::BAD_GATEWAY,
            "unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_navigation_error(request_id: String, error: &NavigationError) -> ApiError {
    tracing::warn!(error = %error, "navigation unavailable");
    ApiError::new(request_id, "bad_gateway", error.to_string())
}

pub(super) fn map_page_error(request_id: String, error: &PageError) -> ApiError {
    match error {
        PageError::Navigation(e) => map_navigation_error(request_id, e),
        PageError::Poll(PollError::NotPresent { .. }) => {
            tracing::warn!(error = %error, "page not in navigation");
            ApiError::new(request_id, "not_found", error.to_string())
        }
        PageError::Poll(PollError::Cancelled { .. }) => {
            ApiError::new(request_id, "unavailable", error.to_string())
        }
        PageError::Fetch { .. } => {
            tracing::warn!(error = %error, "page fetch failed");
            ApiError::new(request_id, "bad_gateway", error.to_string())
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}

fn api_router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/navigation", get(navigation::get_navigation))
        .route("/api/v1/extra-menu", get(navigation::get_extra_menu))
        .route("/api/v1/routes/{*path}", get(navigation::decide_route))
        .route("/api/v1/resolve", post(resolve::resolve_link))
        .route("/api/v1/pages/bind", post(pages::bind_page))
        .route("/api/v1/pages/{handle}", get(pages::get_commerce_page))
        .route("/api/v1/revisions", get(revisions::get_revisions))
        .route(
            "/api/v1/revisions/{domain}/bump",
            post(revisions::bump_revision),
        )
        .route("/api/v1/preview/events", post(preview::handle_event))
        .route("/api/v1/preview/locale", post(preview::set_locale))
        .route(
            "/api/v1/preview/route-changed",
            post(preview::route_changed),
        )
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/getHandleById", get(handle::get_handle_by_id))
        .merge(api_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    ApiResponse::new(
        HealthData {
            status: "ok",
            preview: state.preview.is_preview(),
            revisions: state.storefront.snapshot(),
        },
        req_id,
    )
}


#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;
    use wiremock::MockServer;

    use super::test_support::{app, get, send, state};
    use super::*;

    #[test]
    fn api_error_codes_map_to_statuses() {
        let cases = [
            ("not_found", StatusCode::NOT_FOUND),
            ("validation_error", StatusCode::BAD_REQUEST),
            ("bad_gateway", StatusCode::BAD_GATEWAY),
            ("unavailable", StatusCode::SERVICE_UNAVAILABLE),
            ("anything_else", StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (code, status) in cases {
            let response = ApiError::new("req-1", code, "message").into_response();
            assert_eq!(response.status(), status, "code {code}");
        }
    }

    #[tokio::test]
    async fn locale_accepts_both_tag_forms() {
        let cms = MockServer::start().await;
        let shop = MockServer::start().await;
        let state = state(&cms, &shop, false);
        assert_eq!(state.locale(Some("de-de")).cms(), "de_DE");
        assert_eq!(state.locale(Some("de_DE")).commerce(), "de-de");
        assert_eq!(state.locale(Some(" ")).cms(), "en_GB");
        assert_eq!(state.locale(None).cms(), "en_GB");
    }

    #[tokio::test]
    async fn health_reports_revisions_and_request_id() {
        let cms = MockServer::start().await;
        let shop = MockServer::start().await;
        let response = app(&cms, &shop)
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .header(REQUEST_ID_HEADER, "req-42")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok()),
            Some("req-42")
        );

        let (status, json) = send(app(&cms, &shop), get("/api/v1/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["status"], "ok");
        assert_eq!(json["data"]["preview"], true);
        assert_eq!(json["data"]["revisions"]["navigation"], 0);
        assert!(json["meta"]["request_id"].as_str().is_some_and(|id| !id.is_empty()));
    }

    #[tokio::test]
    async fn unknown_routes_are_404() {
        let cms = MockServer::start().await;
        let shop = MockServer::start().await;
        let (status, _) = send(app(&cms, &shop), get("/api/v1/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
