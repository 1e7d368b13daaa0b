use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::Role;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// Row of `public.profiles`, mirrored from the Supabase `auth.users` table. `role`
/// stays a raw string here; it is parsed into [`Role`] when a session is built.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub role: String,
}

/// Which of the two video integrations a course uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(tag = "host", rename_all = "lowercase")]
#[ts(export)]
pub enum VideoSource {
    /// Object key of a video uploaded through the presigned flow.
    Storage { key: String },
    /// Player URL of an externally hosted video.
    Embed { url: String },
}

impl VideoSource {
    pub const STORAGE: &'static str = "storage";
    pub const EMBED: &'static str = "embed";

    /// Column pair `(video_host, video_ref)`.
    pub fn to_columns(&self) -> (&'static str, &str) {
        match self {
            VideoSource::Storage { key } => (Self::STORAGE, key),
            VideoSource::Embed { url } => (Self::EMBED, url),
        }
    }

    pub fn from_columns(host: Option<&str>, reference: Option<&str>) -> Option<Self> {
        match (host?, reference?) {
            (Self::STORAGE, key) => Some(VideoSource::Storage {
                key: key.to_string(),
            }),
            (Self::EMBED, url) => Some(VideoSource::Embed {
                url: url.to_string(),
            }),
            _ => None,
        }
    }

    /// Embeds must be absolute https URLs; storage keys must stay under `videos/`.
    pub fn is_valid(&self) -> bool {
        match self {
            VideoSource::Storage { key } => {
                key.starts_with("videos/") && !key.split('/').any(|segment| segment == "..")
            }
            VideoSource::Embed { url } => url::Url::parse(url)
                .map(|parsed| parsed.scheme() == "https" && parsed.host().is_some())
                .unwrap_or(false),
        }
    }
}

/// Course
///
/// Row of `public.courses`. New courses are unpublished until an admin publishes them.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Course {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub title: String,
    pub description: String,
    pub video_host: Option<String>,
    pub video_ref: Option<String>,
    pub is_published: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl Course {
    pub fn video(&self) -> Option<VideoSource> {
        VideoSource::from_columns(self.video_host.as_deref(), self.video_ref.as_deref())
    }
}

/// One multiple-choice question. Exactly one option is correct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct QuizQuestion {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_option: usize,
}

/// Raw `public.quizzes` row; questions are stored as JSONB.
#[derive(Debug, Clone, FromRow)]
pub struct QuizRow {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub questions: sqlx::types::Json<Vec<QuizQuestion>>,
}

/// Quiz
///
/// Full quiz including answers. Only ever sent to the owning creator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Quiz {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub questions: Vec<QuizQuestion>,
}

impl From<QuizRow> for Quiz {
    fn from(row: QuizRow) -> Self {
        Self {
            id: row.id,
            course_id: row.course_id,
            title: row.title,
            questions: row.questions.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PublicQuestion {
    pub prompt: String,
    pub options: Vec<String>,
}

/// PublicQuiz
///
/// What learners see: the quiz without its answer key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PublicQuiz {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub questions: Vec<PublicQuestion>,
}

impl From<Quiz> for PublicQuiz {
    fn from(quiz: Quiz) -> Self {
        Self {
            id: quiz.id,
            course_id: quiz.course_id,
            title: quiz.title,
            questions: quiz
                .questions
                .into_iter()
                .map(|q| PublicQuestion {
                    prompt: q.prompt,
                    options: q.options,
                })
                .collect(),
        }
    }
}

/// Row of `public.quiz_attempts`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct QuizAttempt {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub user_id: Uuid,
    pub score: i32,
    pub total: i32,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

// --- Request Payloads ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCourseRequest {
    pub title: String,
    pub description: String,
    pub video: Option<VideoSource>,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateCourseRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoSource>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateQuizRequest {
    pub title: String,
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct QuizAttemptRequest {
    /// Chosen option index per question, in question order.
    pub answers: Vec<usize>,
}

/// RegisterUserRequest
///
/// The password only passes through to Supabase. Every account starts as `student`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterUserRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlRequest {
    #[schema(example = "lesson_01.mp4")]
    pub filename: String,
    #[schema(example = "video/mp4")]
    pub file_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlResponse {
    pub upload_url: String,
    /// Key to reference as `VideoSource::Storage` once the upload completes.
    pub resource_key: String,
}

/// Where the player should load a course video from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct VideoPlayback {
    pub url: String,
    /// Seconds until `url` stops working; absent for embeds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in_secs: Option<u64>,
}

// --- Dashboard & Profile Schemas ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminDashboardStats {
    pub total_courses: i64,
    pub total_users: i64,
    pub total_attempts: i64,
    /// Courses waiting for publication.
    pub pending_reviews: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct QuizResult {
    pub attempt_id: Uuid,
    pub score: i32,
    pub total: i32,
}

// --- Page View Models ---

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LearnerHomeView {
    pub profile: UserProfile,
    pub courses: Vec<Course>,
    pub attempts: Vec<QuizAttempt>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatorStudioView {
    pub profile: UserProfile,
    pub courses: Vec<Course>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminDashboardView {
    pub profile: UserProfile,
    pub stats: AdminDashboardStats,
    pub courses: Vec<Course>,
}
