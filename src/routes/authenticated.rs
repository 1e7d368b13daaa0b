use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router
///
/// Learner features. Mounted behind the session middleware in `create_router`, and
/// every handler also takes `AuthUser`.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        .route("/me", get(handlers::get_me))
        // GET /courses/{id}/video
        .route("/courses/{id}/video", get(handlers::get_course_video))
        // GET /courses/{id}/quiz
        // Questions only; the answer key never leaves the server.
        .route("/courses/{id}/quiz", get(handlers::get_course_quiz))
        // POST /quizzes/{id}/attempts
        .route("/quizzes/{id}/attempts", post(handlers::submit_quiz_attempt))
}
