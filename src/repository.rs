use crate::{
    auth::Role,
    models::{
        AdminDashboardStats, Course, CreateCourseRequest, Quiz, QuizAttempt, QuizQuestion,
        QuizRow, UpdateCourseRequest, User,
    },
};
use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

/// Repository Trait
///
/// Persistence contract used by handlers, pages and the session provider. Methods
/// return `Option`/`Vec` and log database errors, so a failing database reads as
/// "nothing found" rather than propagating.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Profiles ---
    async fn get_user(&self, id: Uuid) -> Option<User>;
    async fn create_user(&self, user: User) -> Option<User>;
    async fn set_user_role(&self, id: Uuid, role: Role) -> Option<User>;

    // --- Catalog ---
    // Only published courses, optionally filtered by a title/description search.
    async fn list_published_courses(&self, search: Option<String>) -> Vec<Course>;
    async fn get_published_course(&self, id: Uuid) -> Option<Course>;
    // Admin view: every course regardless of status.
    async fn get_all_courses(&self) -> Vec<Course>;
    async fn get_creator_courses(&self, creator_id: Uuid) -> Vec<Course>;
    async fn get_course(&self, id: Uuid) -> Option<Course>;

    // --- Creator actions ---
    async fn create_course(&self, req: CreateCourseRequest, creator_id: Uuid) -> Option<Course>;
    // Owner-only: no row is touched unless `creator_id` owns the course.
    async fn update_course(
        &self,
        id: Uuid,
        creator_id: Uuid,
        req: UpdateCourseRequest,
    ) -> Option<Course>;
    // Replaces the course's quiz if one exists.
    async fn upsert_quiz(
        &self,
        course_id: Uuid,
        title: String,
        questions: Vec<QuizQuestion>,
    ) -> Option<Quiz>;

    // --- Admin actions ---
    async fn set_course_status(&self, id: Uuid, is_published: bool) -> Option<Course>;
    async fn get_stats(&self) -> AdminDashboardStats;

    // --- Quizzes ---
    async fn get_quiz_for_course(&self, course_id: Uuid) -> Option<Quiz>;
    async fn get_quiz(&self, id: Uuid) -> Option<Quiz>;
    async fn record_attempt(
        &self,
        quiz_id: Uuid,
        user_id: Uuid,
        score: i32,
        total: i32,
    ) -> Option<QuizAttempt>;
    async fn get_attempts(&self, user_id: Uuid) -> Vec<QuizAttempt>;
}

pub type RepositoryState = Arc<dyn Repository>;

const COURSE_COLUMNS: &str = "id, creator_id, title, description, video_host, video_ref, is_published, created_at, updated_at";

/// PostgresRepository
///
/// `Repository` backed by Postgres through a shared `PgPool`. Queries are built at
/// runtime and bound with parameters; no string interpolation of user input.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn count(&self, sql: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(sql)
            .fetch_one(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("count error ({}): {:?}", sql, e);
                0
            })
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: Uuid) -> Option<User> {
        sqlx::query_as::<_, User>("SELECT id, email, role FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_user error: {:?}", e);
                None
            })
    }

    async fn create_user(&self, user: User) -> Option<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO profiles (id, email, role) VALUES ($1, $2, $3) RETURNING id, email, role",
        )
        .bind(user.id)
        .bind(user.email)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| tracing::error!("create_user error: {:?}", e))
        .ok()
    }

    async fn set_user_role(&self, id: Uuid, role: Role) -> Option<User> {
        sqlx::query_as::<_, User>(
            "UPDATE profiles SET role = $2 WHERE id = $1 RETURNING id, email, role",
        )
        .bind(id)
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("set_user_role error: {:?}", e);
            None
        })
    }

    /// Case-insensitive search over title and description; `is_published = true`
    /// is part of the base query.
    async fn list_published_courses(&self, search: Option<String>) -> Vec<Course> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM courses WHERE is_published = true",
            COURSE_COLUMNS
        ));

        if let Some(s) = search.filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", s.trim());
            builder.push(" AND (title ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR description ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }

        builder.push(" ORDER BY created_at DESC");

        match builder.build_query_as::<Course>().fetch_all(&self.pool).await {
            Ok(courses) => courses,
            Err(e) => {
                tracing::error!("list_published_courses error: {:?}", e);
                vec![]
            }
        }
    }

    async fn get_published_course(&self, id: Uuid) -> Option<Course> {
        let sql = format!(
            "SELECT {} FROM courses WHERE id = $1 AND is_published = true",
            COURSE_COLUMNS
        );
        sqlx::query_as::<_, Course>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_published_course error: {:?}", e);
                None
            })
    }

    async fn get_all_courses(&self) -> Vec<Course> {
        let sql = format!(
            "SELECT {} FROM courses ORDER BY is_published ASC, created_at DESC",
            COURSE_COLUMNS
        );
        sqlx::query_as::<_, Course>(&sql)
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_all_courses error: {:?}", e);
                vec![]
            })
    }

    async fn get_creator_courses(&self, creator_id: Uuid) -> Vec<Course> {
        let sql = format!(
            "SELECT {} FROM courses WHERE creator_id = $1 ORDER BY created_at DESC",
            COURSE_COLUMNS
        );
        sqlx::query_as::<_, Course>(&sql)
            .bind(creator_id)
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_creator_courses error: {:?}", e);
                vec![]
            })
    }

    async fn get_course(&self, id: Uuid) -> Option<Course> {
        let sql = format!("SELECT {} FROM courses WHERE id = $1", COURSE_COLUMNS);
        sqlx::query_as::<_, Course>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_course error: {:?}", e);
                None
            })
    }

    async fn create_course(&self, req: CreateCourseRequest, creator_id: Uuid) -> Option<Course> {
        let (video_host, video_ref) = match req.video.as_ref().map(|v| v.to_columns()) {
            Some((host, reference)) => (Some(host), Some(reference.to_string())),
            None => (None, None),
        };

        let sql = format!(
            "INSERT INTO courses (id, creator_id, title, description, video_host, video_ref, is_published, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, false, NOW(), NOW()) RETURNING {}",
            COURSE_COLUMNS
        );
        sqlx::query_as::<_, Course>(&sql)
            .bind(Uuid::new_v4())
            .bind(creator_id)
            .bind(req.title)
            .bind(req.description)
            .bind(video_host)
            .bind(video_ref)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| tracing::error!("create_course error: {:?}", e))
            .ok()
    }

    /// COALESCE keeps columns whose field is `None`.
    async fn update_course(
        &self,
        id: Uuid,
        creator_id: Uuid,
        req: UpdateCourseRequest,
    ) -> Option<Course> {
        let (video_host, video_ref) = match req.video.as_ref().map(|v| v.to_columns()) {
            Some((host, reference)) => (Some(host), Some(reference.to_string())),
            None => (None, None),
        };

        let sql = format!(
            "UPDATE courses \
             SET title = COALESCE($3, title), \
                 description = COALESCE($4, description), \
                 video_host = COALESCE($5, video_host), \
                 video_ref = COALESCE($6, video_ref), \
                 updated_at = NOW() \
             WHERE id = $1 AND creator_id = $2 \
             RETURNING {}",
            COURSE_COLUMNS
        );
        sqlx::query_as::<_, Course>(&sql)
            .bind(id)
            .bind(creator_id)
            .bind(req.title)
            .bind(req.description)
            .bind(video_host)
            .bind(video_ref)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("update_course error: {:?}", e);
                None
            })
    }

    async fn upsert_quiz(
        &self,
        course_id: Uuid,
        title: String,
        questions: Vec<QuizQuestion>,
    ) -> Option<Quiz> {
        sqlx::query_as::<_, QuizRow>(
            r#"
            INSERT INTO quizzes (id, course_id, title, questions)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (course_id) DO UPDATE
                SET title = EXCLUDED.title, questions = EXCLUDED.questions
            RETURNING id, course_id, title, questions
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(course_id)
        .bind(title)
        .bind(sqlx::types::Json(questions))
        .fetch_one(&self.pool)
        .await
        .map(Quiz::from)
        .map_err(|e| tracing::error!("upsert_quiz error: {:?}", e))
        .ok()
    }

    async fn set_course_status(&self, id: Uuid, is_published: bool) -> Option<Course> {
        let sql = format!(
            "UPDATE courses SET is_published = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            COURSE_COLUMNS
        );
        sqlx::query_as::<_, Course>(&sql)
            .bind(id)
            .bind(is_published)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("set_course_status error: {:?}", e);
                None
            })
    }

    async fn get_stats(&self) -> AdminDashboardStats {
        AdminDashboardStats {
            total_courses: self.count("SELECT COUNT(*) FROM courses").await,
            total_users: self.count("SELECT COUNT(*) FROM profiles").await,
            total_attempts: self.count("SELECT COUNT(*) FROM quiz_attempts").await,
            pending_reviews: self
                .count("SELECT COUNT(*) FROM courses WHERE is_published = false")
                .await,
        }
    }

    async fn get_quiz_for_course(&self, course_id: Uuid) -> Option<Quiz> {
        sqlx::query_as::<_, QuizRow>(
            "SELECT id, course_id, title, questions FROM quizzes WHERE course_id = $1",
        )
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_quiz_for_course error: {:?}", e);
            None
        })
        .map(Quiz::from)
    }

    async fn get_quiz(&self, id: Uuid) -> Option<Quiz> {
        sqlx::query_as::<_, QuizRow>(
            "SELECT id, course_id, title, questions FROM quizzes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_quiz error: {:?}", e);
            None
        })
        .map(Quiz::from)
    }

    async fn record_attempt(
        &self,
        quiz_id: Uuid,
        user_id: Uuid,
        score: i32,
        total: i32,
    ) -> Option<QuizAttempt> {
        sqlx::query_as::<_, QuizAttempt>(
            r#"
            INSERT INTO quiz_attempts (id, quiz_id, user_id, score, total, created_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            RETURNING id, quiz_id, user_id, score, total, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(quiz_id)
        .bind(user_id)
        .bind(score)
        .bind(total)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| tracing::error!("record_attempt error: {:?}", e))
        .ok()
    }

    async fn get_attempts(&self, user_id: Uuid) -> Vec<QuizAttempt> {
        sqlx::query_as::<_, QuizAttempt>(
            "SELECT id, quiz_id, user_id, score, total, created_at FROM quiz_attempts WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_attempts error: {:?}", e);
            vec![]
        })
    }
}
