use crate::{
    AppState,
    auth::{AuthUser, Role, RoleRequirement},
    models::{
        self, AdminDashboardStats, Course, CreateCourseRequest, CreateQuizRequest,
        PresignedUrlRequest, PresignedUrlResponse, PublicQuiz, Quiz, QuizAttemptRequest,
        QuizResult, RegisterUserRequest, UpdateCourseRequest, UpdateRoleRequest, User,
        UserProfile, VideoPlayback, VideoSource,
    },
    quiz::{grade, validate_questions},
    storage::{PLAYBACK_URL_TTL, is_video_content_type},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

// --- Filter Structs ---

/// Query parameters accepted by `GET /courses`.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct CourseFilter {
    /// Case-insensitive match on title or description.
    pub search: Option<String>,
}

/// The only field we need from Supabase's signup response.
#[derive(Deserialize)]
struct SupabaseAuthResponse {
    id: Uuid,
}

pub(crate) fn profile_of(id: Uuid, email: String, role: Role) -> UserProfile {
    UserProfile {
        id,
        email,
        role,
        avatar_url: Some(format!(
            "https://api.dicebear.com/7.x/initials/svg?seed={}",
            id
        )),
    }
}

// --- Public ---

/// list_courses
///
/// [Public Route] Published courses, newest first.
#[utoipa::path(
    get,
    path = "/courses",
    params(CourseFilter),
    responses((status = 200, description = "Published courses", body = [Course]))
)]
pub async fn list_courses(
    State(state): State<AppState>,
    Query(filter): Query<CourseFilter>,
) -> Json<Vec<Course>> {
    Json(state.repo.list_published_courses(filter.search).await)
}

/// get_course
///
/// [Public Route] A single published course. Unpublished courses are reported as missing.
#[utoipa::path(
    get,
    path = "/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Found", body = Course),
        (status = 404, description = "Not found or unpublished")
    )
)]
pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Course>, StatusCode> {
    state
        .repo
        .get_published_course(id)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// register_user
///
/// [Public Route] Signs the user up with Supabase, then mirrors the new account into
/// `profiles` with the `student` role.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterUserRequest,
    responses((status = 200, description = "Registered", body = User))
)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<Json<User>, StatusCode> {
    let (Some(supabase_url), Some(supabase_key)) = (
        state.config.supabase_url.as_deref(),
        state.config.supabase_key.as_deref(),
    ) else {
        tracing::error!("registration attempted without SUPABASE_URL / SUPABASE_KEY");
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    };

    let response = reqwest::Client::new()
        .post(format!("{}/auth/v1/signup", supabase_url))
        .header("apikey", supabase_key)
        .json(&serde_json::json!({ "email": payload.email, "password": payload.password }))
        .send()
        .await
        .map_err(|e| {
            tracing::error!("supabase signup failed: {:?}", e);
            StatusCode::BAD_GATEWAY
        })?;

    if !response.status().is_success() {
        // Duplicate email, weak password, ...
        return Err(StatusCode::BAD_REQUEST);
    }

    let supabase_user = response
        .json::<SupabaseAuthResponse>()
        .await
        .map_err(|_| StatusCode::BAD_GATEWAY)?;

    let new_user = User {
        id: supabase_user.id,
        email: payload.email,
        role: Role::Student.to_string(),
    };

    state
        .repo
        .create_user(new_user)
        .await
        .map(Json)
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)
}

// --- Authenticated ---

/// get_me
///
/// [Authenticated Route] The caller's profile.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Profile", body = UserProfile))
)]
pub async fn get_me(AuthUser { id, email, role }: AuthUser) -> Json<UserProfile> {
    Json(profile_of(id, email, role))
}

/// get_course_video
///
/// [Authenticated Route] Player URL for a published course's video. Uploaded videos
/// get a short-lived signed URL; embeds are returned as stored.
#[utoipa::path(
    get,
    path = "/courses/{id}/video",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Playback URL", body = VideoPlayback),
        (status = 404, description = "Unknown course or no video")
    )
)]
pub async fn get_course_video(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<VideoPlayback>, StatusCode> {
    let video = state
        .repo
        .get_published_course(course_id)
        .await
        .and_then(|course| course.video())
        .ok_or(StatusCode::NOT_FOUND)?;

    match video {
        VideoSource::Embed { url } => Ok(Json(VideoPlayback {
            url,
            expires_in_secs: None,
        })),
        VideoSource::Storage { key } => {
            let url = state
                .storage
                .get_presigned_playback_url(&key)
                .await
                .map_err(|e| {
                    tracing::error!(%user_id, %course_id, error = %e, "playback presign failed");
                    StatusCode::INTERNAL_SERVER_ERROR
                })?;
            Ok(Json(VideoPlayback {
                url,
                expires_in_secs: Some(PLAYBACK_URL_TTL.as_secs()),
            }))
        }
    }
}

/// get_course_quiz
///
/// [Authenticated Route] Quiz of a published course, without its answer key.
#[utoipa::path(
    get,
    path = "/courses/{id}/quiz",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Quiz", body = PublicQuiz),
        (status = 404, description = "No quiz or course unpublished")
    )
)]
pub async fn get_course_quiz(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<PublicQuiz>, StatusCode> {
    if state.repo.get_published_course(course_id).await.is_none() {
        return Err(StatusCode::NOT_FOUND);
    }
    state
        .repo
        .get_quiz_for_course(course_id)
        .await
        .map(|quiz| Json(PublicQuiz::from(quiz)))
        .ok_or(StatusCode::NOT_FOUND)
}

/// submit_quiz_attempt
///
/// [Authenticated Route] Grades a full set of answers and records the attempt.
#[utoipa::path(
    post,
    path = "/quizzes/{id}/attempts",
    params(("id" = Uuid, Path, description = "Quiz ID")),
    request_body = QuizAttemptRequest,
    responses(
        (status = 200, description = "Graded", body = QuizResult),
        (status = 404, description = "Unknown quiz"),
        (status = 422, description = "Answers do not fit the quiz")
    )
)]
pub async fn submit_quiz_attempt(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(quiz_id): Path<Uuid>,
    Json(payload): Json<QuizAttemptRequest>,
) -> Result<Json<QuizResult>, StatusCode> {
    let quiz = state
        .repo
        .get_quiz(quiz_id)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;

    if state.repo.get_published_course(quiz.course_id).await.is_none() {
        return Err(StatusCode::NOT_FOUND);
    }

    let score = grade(&quiz.questions, &payload.answers).map_err(|e| {
        tracing::debug!(%quiz_id, error = %e, "attempt rejected");
        StatusCode::UNPROCESSABLE_ENTITY
    })?;

    let attempt = state
        .repo
        .record_attempt(quiz_id, user_id, score.correct as i32, score.total as i32)
        .await
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(QuizResult {
        attempt_id: attempt.id,
        score: attempt.score,
        total: attempt.total,
    }))
}

// --- Creator ---

/// create_course
///
/// [Creator Route] Drafts a new, unpublished course owned by the caller.
#[utoipa::path(
    post,
    path = "/creator/courses",
    request_body = CreateCourseRequest,
    responses(
        (status = 200, description = "Created", body = Course),
        (status = 400, description = "Invalid title or video"),
        (status = 403, description = "Not a creator")
    )
)]
pub async fn create_course(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<Json<Course>, StatusCode> {
    user.require(&RoleRequirement::AtLeast(Role::Creator))?;

    if payload.title.trim().is_empty() || payload.video.as_ref().is_some_and(|v| !v.is_valid()) {
        return Err(StatusCode::BAD_REQUEST);
    }

    state
        .repo
        .create_course(payload, user.id)
        .await
        .map(Json)
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// update_course
///
/// [Creator Route] Partial update of a course the caller owns.
#[utoipa::path(
    put,
    path = "/creator/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body = UpdateCourseRequest,
    responses(
        (status = 200, description = "Updated", body = Course),
        (status = 404, description = "Not found or not owner")
    )
)]
pub async fn update_course(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCourseRequest>,
) -> Result<Json<Course>, StatusCode> {
    user.require(&RoleRequirement::AtLeast(Role::Creator))?;

    if payload.title.as_ref().is_some_and(|t| t.trim().is_empty())
        || payload.video.as_ref().is_some_and(|v| !v.is_valid())
    {
        return Err(StatusCode::BAD_REQUEST);
    }

    state
        .repo
        .update_course(id, user.id, payload)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// put_course_quiz
///
/// [Creator Route] Creates or replaces the quiz of a course the caller owns.
/// Admins may edit any course's quiz.
#[utoipa::path(
    post,
    path = "/creator/courses/{id}/quiz",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body = CreateQuizRequest,
    responses(
        (status = 200, description = "Saved", body = Quiz),
        (status = 404, description = "Not found or not owner"),
        (status = 422, description = "Malformed questions")
    )
)]
pub async fn put_course_quiz(
    user: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<Json<Quiz>, StatusCode> {
    user.require(&RoleRequirement::AtLeast(Role::Creator))?;

    let course = state
        .repo
        .get_course(course_id)
        .await
        .filter(|c| c.creator_id == user.id || user.role == Role::Admin)
        .ok_or(StatusCode::NOT_FOUND)?;

    validate_questions(&payload.questions).map_err(|e| {
        tracing::debug!(course_id = %course.id, error = %e, "quiz rejected");
        StatusCode::UNPROCESSABLE_ENTITY
    })?;

    state
        .repo
        .upsert_quiz(course.id, payload.title, payload.questions)
        .await
        .map(Json)
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// get_video_upload_url
///
/// [Creator Route] Presigned PUT URL for a course video. The object key is generated
/// here (`videos/<uuid>.<ext>`); the client only picks the extension and MIME type.
#[utoipa::path(
    post,
    path = "/creator/upload/presigned",
    request_body = PresignedUrlRequest,
    responses(
        (status = 200, description = "URL", body = PresignedUrlResponse),
        (status = 415, description = "Not a video")
    )
)]
pub async fn get_video_upload_url(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<PresignedUrlRequest>,
) -> impl IntoResponse {
    if let Err(status) = user.require(&RoleRequirement::AtLeast(Role::Creator)) {
        return status.into_response();
    }
    if !is_video_content_type(&payload.file_type) {
        return StatusCode::UNSUPPORTED_MEDIA_TYPE.into_response();
    }

    let extension = std::path::Path::new(&payload.filename)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("bin");
    let object_key = format!("videos/{}.{}", Uuid::new_v4(), extension);

    match state
        .storage
        .get_presigned_upload_url(&object_key, &payload.file_type)
        .await
    {
        Ok(url) => {
            let response = PresignedUrlResponse {
                upload_url: url,
                resource_key: object_key,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            tracing::error!(user_id = %user.id, error = %e, "presign failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed").into_response()
        }
    }
}

// --- Admin ---

/// get_admin_stats
///
/// [Admin Route] Dashboard counters.
#[utoipa::path(
    get,
    path = "/admin/stats",
    responses((status = 200, description = "Stats", body = AdminDashboardStats))
)]
pub async fn get_admin_stats(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<AdminDashboardStats>, StatusCode> {
    user.require(&RoleRequirement::AtLeast(Role::Admin))?;
    Ok(Json(state.repo.get_stats().await))
}

/// get_admin_courses
///
/// [Admin Route] Every course, unpublished first.
#[utoipa::path(
    get,
    path = "/admin/courses",
    responses((status = 200, description = "All courses", body = [Course]))
)]
pub async fn get_admin_courses(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<models::Course>>, StatusCode> {
    user.require(&RoleRequirement::AtLeast(Role::Admin))?;
    Ok(Json(state.repo.get_all_courses().await))
}

/// update_course_status
///
/// [Admin Route] Publishes or unpublishes a course.
#[utoipa::path(
    put,
    path = "/admin/courses/{id}/status",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body = bool,
    responses((status = 200, description = "Updated", body = Course))
)]
pub async fn update_course_status(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(is_published): Json<bool>,
) -> Result<Json<Course>, StatusCode> {
    user.require(&RoleRequirement::AtLeast(Role::Admin))?;
    state
        .repo
        .set_course_status(id, is_published)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// update_user_role
///
/// [Admin Route] Promotes or demotes a user. Admins cannot change their own role.
#[utoipa::path(
    put,
    path = "/admin/users/{id}/role",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Updated", body = User),
        (status = 404, description = "Unknown user"),
        (status = 409, description = "Own role")
    )
)]
pub async fn update_user_role(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<Json<User>, StatusCode> {
    user.require(&RoleRequirement::AtLeast(Role::Admin))?;
    if id == user.id {
        return Err(StatusCode::CONFLICT);
    }

    let updated = state
        .repo
        .set_user_role(id, payload.role)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;

    tracing::info!(admin_id = %user.id, user_id = %id, role = %payload.role, "role changed");
    Ok(Json(updated))
}
