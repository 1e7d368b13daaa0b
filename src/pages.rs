use async_trait::async_trait;
use axum::Json;

use crate::{
    auth::{Role, RoleRequirement, Session},
    config::AppConfig,
    gate::{GateConfig, Gated, Page, PageProps, wrap},
    handlers::profile_of,
    models::{AdminDashboardView, CreatorStudioView, LearnerHomeView, UserProfile},
};

fn profile(session: &Session) -> UserProfile {
    profile_of(session.user_id, session.email.clone(), session.role)
}

fn query_param(props: &PageProps, name: &str) -> Option<String> {
    let query = props.uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Learner home: the published catalog (filterable with `?search=`) and the
/// learner's past quiz attempts.
pub struct LearnerHomePage;

#[async_trait]
impl Page for LearnerHomePage {
    type Props = PageProps;
    type Output = Json<LearnerHomeView>;

    async fn render(&self, props: PageProps, session: &Session) -> Self::Output {
        let search = query_param(&props, "search");
        let repo = &props.state.repo;

        Json(LearnerHomeView {
            profile: profile(session),
            courses: repo.list_published_courses(search).await,
            attempts: repo.get_attempts(session.user_id).await,
        })
    }
}

/// Creator studio: every course the creator owns, drafts included.
pub struct CreatorStudioPage;

#[async_trait]
impl Page for CreatorStudioPage {
    type Props = PageProps;
    type Output = Json<CreatorStudioView>;

    async fn render(&self, props: PageProps, session: &Session) -> Self::Output {
        Json(CreatorStudioView {
            profile: profile(session),
            courses: props.state.repo.get_creator_courses(session.user_id).await,
        })
    }
}

pub struct AdminDashboardPage;

#[async_trait]
impl Page for AdminDashboardPage {
    type Props = PageProps;
    type Output = Json<AdminDashboardView>;

    async fn render(&self, props: PageProps, session: &Session) -> Self::Output {
        let repo = &props.state.repo;
        Json(AdminDashboardView {
            profile: profile(session),
            stats: repo.get_stats().await,
            courses: repo.get_all_courses().await,
        })
    }
}

pub fn learner_home(config: &AppConfig) -> Gated<LearnerHomePage> {
    wrap(
        LearnerHomePage,
        GateConfig::from_app(RoleRequirement::AtLeast(Role::Student), config),
    )
}

pub fn creator_studio(config: &AppConfig) -> Gated<CreatorStudioPage> {
    wrap(
        CreatorStudioPage,
        GateConfig::from_app(RoleRequirement::AtLeast(Role::Creator), config),
    )
}

pub fn admin_dashboard(config: &AppConfig) -> Gated<AdminDashboardPage> {
    wrap(
        AdminDashboardPage,
        GateConfig::from_app(RoleRequirement::AtLeast(Role::Admin), config),
    )
}
