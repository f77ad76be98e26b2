use serde::Deserialize;

use crate::web::UserRole;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SignupBody {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    pub password: String,
    /// `learner` (default) or `instructor`.
    #[serde(default)]
    pub role: Option<String>,
}

impl SignupBody {
    /// Resolves the requested role. Admin accounts cannot be self-registered.
    pub fn requested_role(&self) -> Result<UserRole, String> {
        let role = match self.role.as_deref() {
            None | Some("") => UserRole::Learner,
            Some(role) => role.parse::<UserRole>()?,
        };
        if role == UserRole::Admin {
            return Err(role.to_string());
        }
        Ok(role)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.username.trim().len() < 3 {
            return Err("username must have at least 3 characters".to_string());
        }
        if !looks_like_email(&self.email) {
            return Err("email is invalid".to_string());
        }
        if self.password.len() < 6 {
            return Err("password must have at least 6 characters".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SigninBody {
    /// Username or email.
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UserUpdateBody {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub full_name: String,
}

impl UserUpdateBody {
    pub fn validate(&self) -> Result<(), String> {
        if self.username.trim().len() < 3 {
            return Err("username must have at least 3 characters".to_string());
        }
        if !looks_like_email(&self.email) {
            return Err("email is invalid".to_string());
        }
        Ok(())
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn signup(role: Option<&str>) -> SignupBody {
        SignupBody {
            username: "ferris".to_string(),
            email: "ferris@example.com".to_string(),
            full_name: String::new(),
            password: "crab-rave".to_string(),
            role: role.map(str::to_string),
        }
    }

    #[test]
    fn role_defaults_to_learner() {
        assert_eq!(signup(None).requested_role(), Ok(UserRole::Learner));
        assert_eq!(signup(Some("")).requested_role(), Ok(UserRole::Learner));
    }

    #[test]
    fn instructor_may_sign_up() {
        assert_eq!(
            signup(Some("instructor")).requested_role(),
            Ok(UserRole::Instructor)
        );
    }

    #[test]
    fn admin_and_unknown_roles_are_refused() {
        assert!(signup(Some("admin")).requested_role().is_err());
        assert!(signup(Some("root")).requested_role().is_err());
    }

    #[test]
    fn email_shape_is_checked() {
        assert!(looks_like_email("a@b.io"));
        assert!(!looks_like_email("a@b"));
        assert!(!looks_like_email("@b.io"));
        assert!(!looks_like_email("ab.io"));
    }
}
