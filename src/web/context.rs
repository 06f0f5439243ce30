//! Request context, e.g. user id, its role, etc.
//!

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::web::{WebResult, error::WebError};

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    user_id: uuid::Uuid,
    user_role: UserRole,
}

impl AuthenticatedUser {
    pub fn new(user_id: uuid::Uuid, user_role: UserRole) -> Self {
        Self { user_id, user_role }
    }

    /// System actor for internal lookups and the cli.
    pub fn admin() -> Self {
        Self {
            user_role: UserRole::Admin,
            user_id: uuid::Uuid::max(), // admin ID
        }
    }

    pub fn user_id(&self) -> uuid::Uuid {
        self.user_id
    }

    pub fn user_role(&self) -> UserRole {
        self.user_role.clone()
    }

    /// Id to store as an owner. The system actor is not a user row.
    pub fn owner_ref(&self) -> Option<uuid::Uuid> {
        (self.user_id != uuid::Uuid::max()).then_some(self.user_id)
    }

    pub fn is_admin(&self) -> bool {
        self.user_role == UserRole::Admin
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UserRole {
    Admin,
    User,
}

impl From<&str> for UserRole {
    fn from(value: &str) -> Self {
        match value {
            "admin" => Self::Admin,
            _ => Self::User,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestContext {
    maybe_user: Option<AuthenticatedUser>,
}

impl RequestContext {
    pub fn new(maybe_user: Option<AuthenticatedUser>) -> Self {
        Self { maybe_user }
    }

    pub fn anonymous() -> Self {
        Self::new(None)
    }

    pub fn maybe_user(&self) -> Option<&AuthenticatedUser> {
        self.maybe_user.as_ref()
    }

    /// Every catalog read needs a user, `is_subscribed` is computed against it.
    pub fn user(&self) -> WebResult<&AuthenticatedUser> {
        self.maybe_user.as_ref().ok_or(WebError::auth_required())
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = parts.extensions.get::<RequestContext>();
        if let Some(ctx) = ctx {
            Ok(ctx.clone())
        } else {
            Ok(RequestContext::anonymous())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn role_round_trips_through_its_db_string() {
        assert_eq!(UserRole::from(UserRole::Admin.to_string().as_str()), UserRole::Admin);
        assert_eq!(UserRole::from(UserRole::User.to_string().as_str()), UserRole::User);
    }

    #[test]
    fn unknown_role_falls_back_to_user() {
        assert_eq!(UserRole::from("moderator"), UserRole::User);
        assert_eq!(UserRole::from(""), UserRole::User);
    }

    #[test]
    fn anonymous_context_requires_auth() {
        let ctx = RequestContext::anonymous();
        let err = ctx.user().unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn authenticated_context_yields_user() {
        let id = uuid::Uuid::new_v4();
        let ctx = RequestContext::new(Some(AuthenticatedUser::new(id, UserRole::User)));
        let user = ctx.user().unwrap();
        assert_eq!(user.user_id(), id);
        assert!(!user.is_admin());
        assert_eq!(user.owner_ref(), Some(id));
    }

    #[test]
    fn system_actor_owns_nothing() {
        assert_eq!(AuthenticatedUser::admin().owner_ref(), None);
    }
}
