use std::{fmt, str::FromStr, sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, StatusCode, header, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    error::SessionError,
    models::User,
    repository::RepositoryState,
};

/// Header accepted in `Env::Local` in place of a JWT.
pub const DEV_USER_HEADER: &str = "x-user-id";

/// Claims
///
/// Payload of the Supabase-issued access token. Only `sub` is trusted for identity;
/// the role always comes from the profile row so demotions apply immediately.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: usize,
    pub iat: usize,
}

/// Role
///
/// Closed set of privilege levels. Each role includes every role below it:
/// `admin` ⊇ `creator` ⊇ `student`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Student,
    Creator,
    Admin,
}

impl Role {
    fn rank(self) -> u8 {
        match self {
            Role::Student => 0,
            Role::Creator => 1,
            Role::Admin => 2,
        }
    }

    /// True when a holder of `self` may act as `other`.
    pub fn includes(self, other: Role) -> bool {
        self.rank() >= other.rank()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Creator => "creator",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = SessionError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "creator" => Ok(Role::Creator),
            "admin" => Ok(Role::Admin),
            _ => Err(SessionError::UnknownRole(raw.to_string())),
        }
    }
}

/// RoleRequirement
///
/// The access rule attached to a protected page or endpoint. Immutable once a
/// route is registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleRequirement {
    /// Any valid session.
    Authenticated,
    /// The session role must include this role.
    AtLeast(Role),
    /// Explicit allow-list, no inheritance.
    AnyOf(Vec<Role>),
}

impl RoleRequirement {
    pub fn satisfied_by(&self, role: Role) -> bool {
        match self {
            RoleRequirement::Authenticated => true,
            RoleRequirement::AtLeast(minimum) => role.includes(*minimum),
            RoleRequirement::AnyOf(allowed) => allowed.contains(&role),
        }
    }
}

impl fmt::Display for RoleRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleRequirement::Authenticated => f.write_str("any authenticated role"),
            RoleRequirement::AtLeast(role) => write!(f, "at least `{}`", role),
            RoleRequirement::AnyOf(roles) => {
                let names: Vec<&str> = roles.iter().map(|r| r.as_str()).collect();
                write!(f, "one of [{}]", names.join(", "))
            }
        }
    }
}

/// Session
///
/// Identity and role of the current visitor. Created by the identity provider and
/// only ever read here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

impl TryFrom<User> for Session {
    type Error = SessionError;

    fn try_from(user: User) -> Result<Self, Self::Error> {
        Ok(Session {
            role: user.role.parse()?,
            user_id: user.id,
            email: user.email,
        })
    }
}

/// Credentials
///
/// Whatever the request presented as proof of identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub bearer: Option<String>,
    /// Only populated in `Env::Local`.
    pub dev_user_id: Option<Uuid>,
}

impl Credentials {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            bearer: Some(token.into()),
            dev_user_id: None,
        }
    }

    pub fn dev_user(id: Uuid) -> Self {
        Self {
            bearer: None,
            dev_user_id: Some(id),
        }
    }

    /// Reads the `Authorization: Bearer` header and, outside production, the
    /// development bypass header.
    pub fn from_headers(headers: &HeaderMap, env: &Env) -> Self {
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());

        let dev_user_id = match env {
            Env::Local => headers
                .get(DEV_USER_HEADER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| Uuid::parse_str(value).ok()),
            Env::Production => None,
        };

        Self {
            bearer,
            dev_user_id,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bearer.is_none() && self.dev_user_id.is_none()
    }
}

/// SessionProvider
///
/// Contract with the identity backend. `Ok(None)` means the visitor is anonymous.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn get_session(&self, credentials: &Credentials)
    -> Result<Option<Session>, SessionError>;

    fn get_role(&self, session: &Session) -> Role {
        session.role
    }
}

pub type SessionProviderState = Arc<dyn SessionProvider>;

/// JwtSessionProvider
///
/// Validates Supabase JWTs and looks the subject up in `profiles` to get the
/// current role. Users deleted after the token was issued have no session.
pub struct JwtSessionProvider {
    repo: RepositoryState,
    decoding_key: DecodingKey,
}

impl JwtSessionProvider {
    pub fn new(repo: RepositoryState, jwt_secret: &str) -> Self {
        Self {
            repo,
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
        }
    }

    async fn load_profile(&self, user_id: Uuid) -> Result<Session, SessionError> {
        let user = self
            .repo
            .get_user(user_id)
            .await
            .ok_or(SessionError::UnknownProfile)?;
        Session::try_from(user)
    }
}

#[async_trait]
impl SessionProvider for JwtSessionProvider {
    async fn get_session(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<Session>, SessionError> {
        // A bad bypass header falls through to the JWT path.
        if let Some(user_id) = credentials.dev_user_id {
            match self.load_profile(user_id).await {
                Ok(session) => return Ok(Some(session)),
                Err(e) => tracing::debug!(%user_id, error = %e, "dev bypass rejected"),
            }
        }

        let Some(token) = credentials.bearer.as_deref() else {
            return Ok(None);
        };

        let mut validation = Validation::default();
        validation.validate_exp = true;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => SessionError::Expired,
                _ => SessionError::InvalidToken(e.to_string()),
            }
        })?;

        self.load_profile(token_data.claims.sub).await.map(Some)
    }
}

/// resolve_session
///
/// Single entry point used by both the page gate and the API extractor. Applies the
/// configured timeout and folds "anonymous" into an error so callers only branch on
/// success. There is no retry.
pub async fn resolve_session(
    provider: &dyn SessionProvider,
    credentials: &Credentials,
    timeout: Duration,
) -> Result<Session, SessionError> {
    match tokio::time::timeout(timeout, provider.get_session(credentials)).await {
        Err(_) => Err(SessionError::Timeout),
        Ok(Err(e)) => Err(e),
        Ok(Ok(None)) => Err(SessionError::NoSession),
        Ok(Ok(Some(session))) => Ok(session),
    }
}

/// AuthUser
///
/// Resolved identity for JSON API handlers. Rejects with 401 on any session failure;
/// role checks are done by the handler through [`AuthUser::require`].
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    /// 403 unless the user's role satisfies `requirement`.
    pub fn require(&self, requirement: &RoleRequirement) -> Result<(), StatusCode> {
        if requirement.satisfied_by(self.role) {
            Ok(())
        } else {
            tracing::info!(user_id = %self.id, role = %self.role, %requirement, "forbidden");
            Err(StatusCode::FORBIDDEN)
        }
    }
}

impl From<Session> for AuthUser {
    fn from(session: Session) -> Self {
        Self {
            id: session.user_id,
            email: session.email,
            role: session.role,
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    SessionProviderState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let provider = SessionProviderState::from_ref(state);
        let config = AppConfig::from_ref(state);

        let credentials = Credentials::from_headers(&parts.headers, &config.env);

        match resolve_session(provider.as_ref(), &credentials, config.session_timeout).await {
            Ok(session) => Ok(AuthUser::from(session)),
            Err(e) => {
                tracing::debug!(error = %e, "api request rejected");
                Err(StatusCode::UNAUTHORIZED)
            }
        }
    }
}
