use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router
///
/// Unauthenticated endpoints. Catalog reads only ever return published courses.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        .route("/health", get(|| async { "ok" }))
        // POST /register
        // Supabase signup followed by a `student` profile row.
        .route("/register", post(handlers::register_user))
        // GET /courses?search=...
        .route("/courses", get(handlers::list_courses))
        // GET /courses/{id}
        .route("/courses/{id}", get(handlers::get_course))
}
