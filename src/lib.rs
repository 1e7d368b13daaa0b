use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod models;
pub mod navigation;
pub mod navigator;
pub mod pages;
pub mod quiz;
pub mod repository;
pub mod storage;

pub mod routes;
use auth::AuthUser;
use routes::{admin, authenticated, creator, pages as page_router, public};

// --- Public Re-exports ---

pub use auth::{JwtSessionProvider, SessionProviderState};
pub use config::AppConfig;
pub use repository::{PostgresRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// OpenAPI document for the JSON API, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_courses, handlers::get_course, handlers::register_user,
        handlers::get_me, handlers::get_course_video, handlers::get_course_quiz,
        handlers::submit_quiz_attempt, handlers::create_course, handlers::update_course,
        handlers::put_course_quiz, handlers::get_video_upload_url, handlers::get_admin_stats,
        handlers::get_admin_courses, handlers::update_course_status, handlers::update_user_role
    ),
    components(
        schemas(
            models::Course, models::VideoSource, models::VideoPlayback,
            models::CreateCourseRequest, models::UpdateCourseRequest, models::Quiz,
            models::QuizQuestion, models::PublicQuiz, models::PublicQuestion,
            models::CreateQuizRequest, models::QuizAttemptRequest, models::QuizResult,
            models::QuizAttempt, models::PresignedUrlRequest, models::PresignedUrlResponse,
            models::AdminDashboardStats, models::UserProfile, models::User,
            models::RegisterUserRequest, models::UpdateRoleRequest, auth::Role,
        )
    ),
    tags(
        (name = "academy-portal", description = "E-learning platform API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, cloneable container of every service a request may need.
#[derive(Clone)]
pub struct AppState {
    pub repo: RepositoryState,
    pub storage: StorageState,
    /// Identity backend consulted by the page gate and the `AuthUser` extractor.
    pub sessions: SessionProviderState,
    pub config: AppConfig,
}

impl AppState {
    /// Wires the Supabase JWT session provider on top of `repo`.
    pub fn new(repo: RepositoryState, storage: StorageState, config: AppConfig) -> Self {
        let sessions = Arc::new(JwtSessionProvider::new(repo.clone(), &config.jwt_secret))
            as SessionProviderState;
        Self {
            repo,
            storage,
            sessions,
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for SessionProviderState {
    fn from_ref(app_state: &AppState) -> SessionProviderState {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Rejects the request with 401 before routing when `AuthUser` cannot be resolved.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles every router, the scoped auth layer, and the observability stack.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .nest("/creator", creator::creator_routes())
        .nest("/admin", admin::admin_routes())
        // Pages redirect on their own and must not sit behind the 401 layer.
        .nest("/pages", page_router::page_routes(&state.config))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// Span for one HTTP request, correlated by `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
