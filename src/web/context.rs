//! Request context, e.g. user id, its role, etc.
//!

use std::str::FromStr;

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
        self.user_role
    }

    pub fn is_admin(&self) -> bool {
        self.user_role == UserRole::Admin
    }

    /// Instructors and admins may author courses.
    pub fn can_teach(&self) -> bool {
        matches!(self.user_role, UserRole::Instructor | UserRole::Admin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
    Admin,
    Instructor,
    Learner,
}

impl From<&str> for UserRole {
    fn from(value: &str) -> Self {
        value.parse().unwrap_or(Self::Learner)
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(Self::Admin),
            "instructor" => Ok(Self::Instructor),
            "learner" => Ok(Self::Learner),
            other => Err(format!("unknown role `{}`", other)),
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Learner => write!(f, "learner"),
            Self::Instructor => write!(f, "instructor"),
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

    pub fn admin() -> Self {
        Self::new(Some(AuthenticatedUser::admin()))
    }

    pub fn maybe_user(&self) -> Option<&AuthenticatedUser> {
        self.maybe_user.as_ref()
    }

    pub fn user(&self) -> WebResult<&AuthenticatedUser> {
        self.maybe_user.as_ref().ok_or(WebError::auth_required())
    }

    pub fn admin_user(&self) -> WebResult<&AuthenticatedUser> {
        let user = self.user()?;
        if user.is_admin() {
            Ok(user)
        } else {
            Err(WebError::role_forbidden(UserRole::Admin))
        }
    }

    pub fn teaching_user(&self) -> WebResult<&AuthenticatedUser> {
        let user = self.user()?;
        if user.can_teach() {
            Ok(user)
        } else {
            Err(WebError::role_forbidden(UserRole::Instructor))
        }
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
            Ok(RequestContext::new(None))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn roles_round_trip_through_text() {
        for role in [UserRole::Admin, UserRole::Instructor, UserRole::Learner] {
            assert_eq!(UserRole::from(role.to_string().as_str()), role);
        }
    }

    #[test]
    fn unknown_role_parses_as_error() {
        assert!("root".parse::<UserRole>().is_err());
        assert_eq!(UserRole::from("root"), UserRole::Learner);
    }

    #[test]
    fn role_gates() {
        let ctx = RequestContext::new(Some(AuthenticatedUser::new(
            uuid::Uuid::new_v4(),
            UserRole::Learner,
        )));
        assert!(ctx.teaching_user().is_err());
        assert!(ctx.admin_user().is_err());
        assert!(RequestContext::admin().teaching_user().is_ok());
        assert!(RequestContext::new(None).user().is_err());
    }
}
