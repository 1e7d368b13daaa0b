//! Role-gated pages.
//!
//! A [`Page`] is wrapped once at route registration with [`wrap`]. Every visit then
//! gets its own [`GateMount`], which resolves the session, decides, and either
//! renders the page or redirects. The page itself never runs for a visitor that
//! fails the check.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::{
    extract::State,
    http::{HeaderMap, Uri},
    response::{IntoResponse, Redirect},
    routing::{MethodRouter, get},
};

use crate::{
    AppState,
    auth::{Credentials, RoleRequirement, Session, SessionProviderState, resolve_session},
    config::{AppConfig, DEFAULT_LOGIN_ROUTE, DEFAULT_SESSION_TIMEOUT, DEFAULT_UNAUTHORIZED_ROUTE},
    error::GateDenial,
    navigator::{Navigator, ResponseNavigator},
};

/// Page
///
/// Anything that renders for an authenticated session.
#[async_trait]
pub trait Page: Send + Sync + 'static {
    type Props: Send + 'static;
    type Output: Send + 'static;

    async fn render(&self, props: Self::Props, session: &Session) -> Self::Output;
}

/// Per-page access rule plus where denied visitors are sent.
#[derive(Debug, Clone)]
pub struct GateConfig {
    pub requirement: RoleRequirement,
    pub login_route: String,
    pub unauthorized_route: String,
    pub session_timeout: Duration,
}

impl GateConfig {
    pub fn new(requirement: RoleRequirement) -> Self {
        Self {
            requirement,
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
            unauthorized_route: DEFAULT_UNAUTHORIZED_ROUTE.to_string(),
            session_timeout: DEFAULT_SESSION_TIMEOUT,
        }
    }

    /// Takes redirect routes and timeout from the application configuration.
    pub fn from_app(requirement: RoleRequirement, config: &AppConfig) -> Self {
        Self {
            requirement,
            login_route: config.login_route.clone(),
            unauthorized_route: config.unauthorized_route.clone(),
            session_timeout: config.session_timeout,
        }
    }

    pub fn redirect_for(&self, denial: &GateDenial) -> &str {
        match denial {
            GateDenial::Unauthenticated(_) => &self.login_route,
            GateDenial::InsufficientRole { .. } => &self.unauthorized_route,
        }
    }
}

/// Wraps `page` so it only renders for sessions satisfying `config.requirement`.
pub fn wrap<P: Page>(page: P, config: GateConfig) -> Gated<P> {
    Gated {
        page: Arc::new(page),
        config: Arc::new(config),
    }
}

/// A page bound to its access rule. Cheap to clone; one per registered route.
pub struct Gated<P> {
    page: Arc<P>,
    config: Arc<GateConfig>,
}

impl<P> Clone for Gated<P> {
    fn clone(&self) -> Self {
        Self {
            page: Arc::clone(&self.page),
            config: Arc::clone(&self.config),
        }
    }
}

impl<P: Page> Gated<P> {
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Starts a page visit.
    pub fn mount(&self, provider: SessionProviderState) -> GateMount<P> {
        GateMount {
            page: Arc::clone(&self.page),
            config: Arc::clone(&self.config),
            provider,
            decision: None,
        }
    }
}

/// What a mount produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateView<O> {
    Rendered(O),
    Redirected(String),
}

#[derive(Debug, Clone)]
enum Decision {
    Allowed(Session),
    Denied { denial: GateDenial, target: String },
}

/// GateMount
///
/// State of one page visit. The access decision is taken on the first render and
/// reused afterwards, so re-renders never resolve the session again and never
/// issue a second redirect.
pub struct GateMount<P> {
    page: Arc<P>,
    config: Arc<GateConfig>,
    provider: SessionProviderState,
    decision: Option<Decision>,
}

impl<P: Page> GateMount<P> {
    pub fn is_resolved(&self) -> bool {
        self.decision.is_some()
    }

    /// The resolved session, once the visit has been allowed.
    pub fn session(&self) -> Option<&Session> {
        match &self.decision {
            Some(Decision::Allowed(session)) => Some(session),
            _ => None,
        }
    }

    pub fn denial(&self) -> Option<&GateDenial> {
        match &self.decision {
            Some(Decision::Denied { denial, .. }) => Some(denial),
            _ => None,
        }
    }

    pub async fn render<N>(
        &mut self,
        props: P::Props,
        credentials: &Credentials,
        navigator: &mut N,
    ) -> GateView<P::Output>
    where
        N: Navigator + Send + ?Sized,
    {
        let decision = match self.decision.take() {
            Some(decision) => decision,
            None => {
                let decision = self.decide(credentials).await;
                if let Decision::Denied { target, .. } = &decision {
                    navigator.redirect(target);
                }
                decision
            }
        };

        // Stored before the page renders: a cancelled render keeps the decision.
        match &*self.decision.insert(decision) {
            Decision::Allowed(session) => GateView::Rendered(self.page.render(props, session).await),
            Decision::Denied { target, .. } => GateView::Redirected(target.clone()),
        }
    }

    async fn decide(&self, credentials: &Credentials) -> Decision {
        let requirement = &self.config.requirement;

        let denial = match resolve_session(
            self.provider.as_ref(),
            credentials,
            self.config.session_timeout,
        )
        .await
        {
            Ok(session) => {
                let role = self.provider.get_role(&session);
                if requirement.satisfied_by(role) {
                    return Decision::Allowed(session);
                }
                tracing::info!(user_id = %session.user_id, %role, %requirement, "gate: insufficient role");
                GateDenial::InsufficientRole {
                    role,
                    requirement: requirement.clone(),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, %requirement, "gate: no valid session");
                GateDenial::Unauthenticated(e)
            }
        };

        let target = self.config.redirect_for(&denial).to_string();
        Decision::Denied { denial, target }
    }
}

/// Props handed to every page served over HTTP.
#[derive(Clone)]
pub struct PageProps {
    pub state: AppState,
    pub uri: Uri,
}

/// page_route
///
/// Serves a gated page as `GET`. Denied visits answer `303 See Other` to the
/// login or unauthorized route; they never produce an error body.
pub fn page_route<P>(gated: Gated<P>) -> MethodRouter<AppState>
where
    P: Page<Props = PageProps>,
    P::Output: IntoResponse,
{
    get(
        move |State(state): State<AppState>, uri: Uri, headers: HeaderMap| {
            let gated = gated.clone();
            async move {
                let credentials = Credentials::from_headers(&headers, &state.config.env);
                let mut navigator = ResponseNavigator::new(uri.path());
                let mut mount = gated.mount(state.sessions.clone());
                let props = PageProps { state, uri };

                match mount.render(props, &credentials, &mut navigator).await {
                    GateView::Rendered(output) => output.into_response(),
                    GateView::Redirected(target) => navigator
                        .into_redirect()
                        .unwrap_or_else(|| Redirect::to(&target).into_response()),
                }
            }
        },
    )
}
