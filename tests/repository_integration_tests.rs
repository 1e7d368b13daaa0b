//! Runs against a real Supabase/Postgres database (`DATABASE_URL`).
//! `cargo test -- --ignored` to include them.

use academy_portal::{
    auth::Role,
    models::{CreateCourseRequest, QuizQuestion, UpdateCourseRequest, User, VideoSource},
    repository::{PostgresRepository, Repository},
};
use sqlx::PgPool;
use uuid::Uuid;

// --- Test Context and Setup ---

struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    async fn setup() -> Self {
        dotenv::dotenv().ok();

        let db_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set to run integration tests");

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run database migrations.");

        DbTestContext { pool }
    }

    fn repository(&self) -> PostgresRepository {
        PostgresRepository::new(self.pool.clone())
    }
}

/// Inserts into both auth.users and public.profiles.
async fn create_test_user(pool: &PgPool, role: &str) -> User {
    let id = Uuid::new_v4();
    let email = format!("{}-{}@test.com", role, id);

    sqlx::query_as::<_, User>(
        r#"
        WITH auth_user AS (
            INSERT INTO auth.users (id, email) VALUES ($1, $2)
            RETURNING id, email
        )
        INSERT INTO profiles (id, email, role)
        SELECT id, email, $3 FROM auth_user
        RETURNING id, email, role
        "#,
    )
    .bind(id)
    .bind(email)
    .bind(role)
    .fetch_one(pool)
    .await
    .expect("Failed to create test user")
}

async fn cleanup_user(pool: &PgPool, id: Uuid) {
    sqlx::query("DELETE FROM auth.users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .ok();
}

fn draft(title: &str) -> CreateCourseRequest {
    CreateCourseRequest {
        title: title.to_string(),
        description: "integration".to_string(),
        video: Some(VideoSource::Storage {
            key: "videos/integration.mp4".to_string(),
        }),
    }
}

// --- Tests ---

#[tokio::test]
#[ignore]
async fn test_course_lifecycle() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let creator = create_test_user(&ctx.pool, "creator").await;

    let course = repo
        .create_course(draft("Lifecycle"), creator.id)
        .await
        .expect("course created");
    assert!(!course.is_published);
    assert_eq!(
        course.video(),
        Some(VideoSource::Storage {
            key: "videos/integration.mp4".to_string()
        })
    );
    assert!(repo.get_published_course(course.id).await.is_none());

    let published = repo.set_course_status(course.id, true).await.unwrap();
    assert!(published.is_published);
    assert!(repo.get_published_course(course.id).await.is_some());

    cleanup_user(&ctx.pool, creator.id).await;
}

#[tokio::test]
#[ignore]
async fn test_update_course_requires_owner() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let owner = create_test_user(&ctx.pool, "creator").await;
    let other = create_test_user(&ctx.pool, "creator").await;

    let course = repo.create_course(draft("Owned"), owner.id).await.unwrap();
    let update = UpdateCourseRequest {
        title: Some("Hijacked".to_string()),
        ..UpdateCourseRequest::default()
    };

    assert!(repo.update_course(course.id, other.id, update.clone()).await.is_none());
    let updated = repo.update_course(course.id, owner.id, update).await.unwrap();
    assert_eq!(updated.title, "Hijacked");
    assert_eq!(updated.description, "integration");

    cleanup_user(&ctx.pool, owner.id).await;
    cleanup_user(&ctx.pool, other.id).await;
}

#[tokio::test]
#[ignore]
async fn test_quiz_upsert_and_attempts() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let creator = create_test_user(&ctx.pool, "creator").await;
    let student = create_test_user(&ctx.pool, "student").await;

    let course = repo.create_course(draft("Quizzed"), creator.id).await.unwrap();
    let question = QuizQuestion {
        prompt: "1 + 1?".to_string(),
        options: vec!["1".to_string(), "2".to_string()],
        correct_option: 1,
    };

    let first = repo
        .upsert_quiz(course.id, "v1".to_string(), vec![question.clone()])
        .await
        .unwrap();
    let second = repo
        .upsert_quiz(course.id, "v2".to_string(), vec![question.clone(), question])
        .await
        .unwrap();
    assert_eq!(first.id, second.id, "upsert keeps the quiz row");

    let stored = repo.get_quiz_for_course(course.id).await.unwrap();
    assert_eq!(stored.title, "v2");
    assert_eq!(stored.questions.len(), 2);

    repo.record_attempt(stored.id, student.id, 1, 2).await.unwrap();
    let attempts = repo.get_attempts(student.id).await;
    assert_eq!(attempts.len(), 1);
    assert_eq!((attempts[0].score, attempts[0].total), (1, 2));

    cleanup_user(&ctx.pool, creator.id).await;
    cleanup_user(&ctx.pool, student.id).await;
}

#[tokio::test]
#[ignore]
async fn test_set_user_role() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let user = create_test_user(&ctx.pool, "student").await;

    let promoted = repo.set_user_role(user.id, Role::Creator).await.unwrap();
    assert_eq!(promoted.role, "creator");
    assert!(repo.set_user_role(Uuid::new_v4(), Role::Admin).await.is_none());

    cleanup_user(&ctx.pool, user.id).await;
}
