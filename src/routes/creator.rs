use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{post, put},
};

/// Creator Router
///
/// Course authoring. Nested under `/creator`; handlers require at least the
/// `creator` role and enforce ownership in the repository queries.
pub fn creator_routes() -> Router<AppState> {
    Router::new()
        // POST /creator/courses
        .route("/courses", post(handlers::create_course))
        // PUT /creator/courses/{id}
        .route("/courses/{id}", put(handlers::update_course))
        // POST /creator/courses/{id}/quiz
        .route("/courses/{id}/quiz", post(handlers::put_course_quiz))
        // POST /creator/upload/presigned
        // 10-minute presigned PUT straight to object storage.
        .route("/upload/presigned", post(handlers::get_video_upload_url))
}
