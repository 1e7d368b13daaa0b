use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, put},
};

/// Admin Router
///
/// Moderation and oversight, nested under `/admin`.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/stats
        .route("/stats", get(handlers::get_admin_stats))
        // GET /admin/courses
        // Includes unpublished courses waiting for review.
        .route("/courses", get(handlers::get_admin_courses))
        // PUT /admin/courses/{id}/status
        .route("/courses/{id}/status", put(handlers::update_course_status))
        // PUT /admin/users/{id}/role
        .route("/users/{id}/role", put(handlers::update_user_role))
}
