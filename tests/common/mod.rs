#![allow(dead_code)]

use academy_portal::{
    AppState,
    auth::{Credentials, Role, Session, SessionProvider},
    config::AppConfig,
    error::SessionError,
    models::{
        AdminDashboardStats, Course, CreateCourseRequest, Quiz, QuizAttempt, QuizQuestion,
        UpdateCourseRequest, User,
    },
    repository::Repository,
    storage::MockStorageService,
};
use async_trait::async_trait;
use chrono::Utc;
use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use uuid::Uuid;

pub const STUDENT_ID: Uuid = Uuid::from_u128(1);
pub const CREATOR_ID: Uuid = Uuid::from_u128(2);
pub const ADMIN_ID: Uuid = Uuid::from_u128(3);

// --- In-memory repository ---

/// Behaves like the Postgres repository (visibility, ownership) over plain vectors.
#[derive(Default)]
pub struct MockRepo {
    pub users: Mutex<Vec<User>>,
    pub courses: Mutex<Vec<Course>>,
    pub quizzes: Mutex<Vec<Quiz>>,
    pub attempts: Mutex<Vec<QuizAttempt>>,
}

impl MockRepo {
    pub fn with_user(self, id: Uuid, role: &str) -> Self {
        self.users.lock().unwrap().push(User {
            id,
            email: format!("{}@academy.test", role),
            role: role.to_string(),
        });
        self
    }

    /// The three standard accounts.
    pub fn seeded() -> Self {
        MockRepo::default()
            .with_user(STUDENT_ID, "student")
            .with_user(CREATOR_ID, "creator")
            .with_user(ADMIN_ID, "admin")
    }

    pub fn with_course(self, course: Course) -> Self {
        self.courses.lock().unwrap().push(course);
        self
    }

    pub fn with_quiz(self, quiz: Quiz) -> Self {
        self.quizzes.lock().unwrap().push(quiz);
        self
    }
}

pub fn course(id: Uuid, creator_id: Uuid, title: &str, is_published: bool) -> Course {
    Course {
        id,
        creator_id,
        title: title.to_string(),
        description: format!("{} description", title),
        video_host: None,
        video_ref: None,
        is_published,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn quiz(id: Uuid, course_id: Uuid, answer_key: &[usize]) -> Quiz {
    Quiz {
        id,
        course_id,
        title: "Checkpoint".to_string(),
        questions: answer_key
            .iter()
            .enumerate()
            .map(|(i, &correct_option)| QuizQuestion {
                prompt: format!("Question {}", i + 1),
                options: vec!["a".into(), "b".into(), "c".into()],
                correct_option,
            })
            .collect(),
    }
}

#[async_trait]
impl Repository for MockRepo {
    async fn get_user(&self, id: Uuid) -> Option<User> {
        self.users.lock().unwrap().iter().find(|u| u.id == id).cloned()
    }

    async fn create_user(&self, user: User) -> Option<User> {
        self.users.lock().unwrap().push(user.clone());
        Some(user)
    }

    async fn set_user_role(&self, id: Uuid, role: Role) -> Option<User> {
        let mut users = self.users.lock().unwrap();
        let user = users.iter_mut().find(|u| u.id == id)?;
        user.role = role.to_string();
        Some(user.clone())
    }

    async fn list_published_courses(&self, search: Option<String>) -> Vec<Course> {
        self.courses
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.is_published)
            .filter(|c| {
                search.as_ref().is_none_or(|s| {
                    c.title.to_lowercase().contains(&s.to_lowercase())
                        || c.description.to_lowercase().contains(&s.to_lowercase())
                })
            })
            .cloned()
            .collect()
    }

    async fn get_published_course(&self, id: Uuid) -> Option<Course> {
        self.get_course(id).await.filter(|c| c.is_published)
    }

    async fn get_all_courses(&self) -> Vec<Course> {
        self.courses.lock().unwrap().clone()
    }

    async fn get_creator_courses(&self, creator_id: Uuid) -> Vec<Course> {
        self.courses
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.creator_id == creator_id)
            .cloned()
            .collect()
    }

    async fn get_course(&self, id: Uuid) -> Option<Course> {
        self.courses.lock().unwrap().iter().find(|c| c.id == id).cloned()
    }

    async fn create_course(&self, req: CreateCourseRequest, creator_id: Uuid) -> Option<Course> {
        let mut created = course(Uuid::new_v4(), creator_id, &req.title, false);
        created.description = req.description;
        if let Some(video) = req.video.as_ref() {
            let (host, reference) = video.to_columns();
            created.video_host = Some(host.to_string());
            created.video_ref = Some(reference.to_string());
        }
        self.courses.lock().unwrap().push(created.clone());
        Some(created)
    }

    async fn update_course(
        &self,
        id: Uuid,
        creator_id: Uuid,
        req: UpdateCourseRequest,
    ) -> Option<Course> {
        let mut courses = self.courses.lock().unwrap();
        let course = courses
            .iter_mut()
            .find(|c| c.id == id && c.creator_id == creator_id)?;
        if let Some(title) = req.title {
            course.title = title;
        }
        if let Some(description) = req.description {
            course.description = description;
        }
        if let Some(video) = req.video.as_ref() {
            let (host, reference) = video.to_columns();
            course.video_host = Some(host.to_string());
            course.video_ref = Some(reference.to_string());
        }
        Some(course.clone())
    }

    async fn upsert_quiz(
        &self,
        course_id: Uuid,
        title: String,
        questions: Vec<QuizQuestion>,
    ) -> Option<Quiz> {
        let mut quizzes = self.quizzes.lock().unwrap();
        if let Some(existing) = quizzes.iter_mut().find(|q| q.course_id == course_id) {
            existing.title = title;
            existing.questions = questions;
            return Some(existing.clone());
        }
        let saved = Quiz {
            id: Uuid::new_v4(),
            course_id,
            title,
            questions,
        };
        quizzes.push(saved.clone());
        Some(saved)
    }

    async fn set_course_status(&self, id: Uuid, is_published: bool) -> Option<Course> {
        let mut courses = self.courses.lock().unwrap();
        let course = courses.iter_mut().find(|c| c.id == id)?;
        course.is_published = is_published;
        Some(course.clone())
    }

    async fn get_stats(&self) -> AdminDashboardStats {
        let courses = self.courses.lock().unwrap();
        AdminDashboardStats {
            total_courses: courses.len() as i64,
            total_users: self.users.lock().unwrap().len() as i64,
            total_attempts: self.attempts.lock().unwrap().len() as i64,
            pending_reviews: courses.iter().filter(|c| !c.is_published).count() as i64,
        }
    }

    async fn get_quiz_for_course(&self, course_id: Uuid) -> Option<Quiz> {
        self.quizzes
            .lock()
            .unwrap()
            .iter()
            .find(|q| q.course_id == course_id)
            .cloned()
    }

    async fn get_quiz(&self, id: Uuid) -> Option<Quiz> {
        self.quizzes.lock().unwrap().iter().find(|q| q.id == id).cloned()
    }

    async fn record_attempt(
        &self,
        quiz_id: Uuid,
        user_id: Uuid,
        score: i32,
        total: i32,
    ) -> Option<QuizAttempt> {
        let attempt = QuizAttempt {
            id: Uuid::new_v4(),
            quiz_id,
            user_id,
            score,
            total,
            created_at: Utc::now(),
        };
        self.attempts.lock().unwrap().push(attempt.clone());
        Some(attempt)
    }

    async fn get_attempts(&self, user_id: Uuid) -> Vec<QuizAttempt> {
        self.attempts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect()
    }
}

// --- Session provider stub ---

/// Returns a fixed answer, counts calls, and can be made slow.
pub struct StubSessions {
    pub result: Result<Option<Session>, SessionError>,
    pub delay: Option<Duration>,
    pub calls: AtomicUsize,
}

impl StubSessions {
    pub fn returning(result: Result<Option<Session>, SessionError>) -> Self {
        Self {
            result,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn signed_in(role: Role) -> Self {
        Self::returning(Ok(Some(session(role))))
    }

    pub fn anonymous() -> Self {
        Self::returning(Ok(None))
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionProvider for StubSessions {
    async fn get_session(
        &self,
        _credentials: &Credentials,
    ) -> Result<Option<Session>, SessionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone()
    }
}

pub fn session(role: Role) -> Session {
    let user_id = match role {
        Role::Student => STUDENT_ID,
        Role::Creator => CREATOR_ID,
        Role::Admin => ADMIN_ID,
    };
    Session {
        user_id,
        email: format!("{}@academy.test", role),
        role,
    }
}

// --- State ---

/// AppState over the mock repository with the real JWT session provider.
pub fn test_state(repo: MockRepo) -> AppState {
    AppState::new(
        Arc::new(repo),
        Arc::new(MockStorageService::new()),
        AppConfig::default(),
    )
}

pub fn test_state_with_storage(repo: MockRepo, storage: MockStorageService) -> AppState {
    AppState::new(Arc::new(repo), Arc::new(storage), AppConfig::default())
}
