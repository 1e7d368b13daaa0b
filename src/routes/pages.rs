use crate::{AppState, config::AppConfig, gate::page_route, pages};
use axum::Router;

/// Pages Router
///
/// Role-gated page view models, nested under `/pages`. A visitor without a session
/// is sent to the login route, one with too low a role to the unauthorized route.
pub fn page_routes(config: &AppConfig) -> Router<AppState> {
    Router::new()
        // GET /pages/learn
        .route("/learn", page_route(pages::learner_home(config)))
        // GET /pages/studio
        .route("/studio", page_route(pages::creator_studio(config)))
        // GET /pages/dashboard
        .route("/dashboard", page_route(pages::admin_dashboard(config)))
}
