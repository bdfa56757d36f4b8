//! Caller identity gate

use crate::error::AuthError;

/// Supplies the user every store call runs as, or denies the call
pub trait IdentityGate: Send + Sync {
    fn current_user(&self) -> Result<String, AuthError>;
}

/// Identity fixed when the gate is built, e.g. from a verified login
#[derive(Debug, Clone, Default)]
pub struct FixedIdentity {
    user_id: Option<String>,
}

impl FixedIdentity {
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }

    /// A gate that denies every call
    pub fn anonymous() -> Self {
        Self { user_id: None }
    }
}

impl IdentityGate for FixedIdentity {
    fn current_user(&self) -> Result<String, AuthError> {
        match self.user_id.as_deref() {
            Some(id) if !id.is_empty() => Ok(id.to_string()),
            _ => Err(AuthError::MissingIdentity),
        }
    }
}

/// Message shown to a user whose sign-in failed
pub fn format_auth_error(error: &AuthError) -> String {
    let message = error.to_string();
    if message.to_lowercase().contains("email rate limit exceeded") {
        return "Too many email requests. Please wait 60 minutes before trying again.".to_string();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_identity() {
        assert_eq!(FixedIdentity::user("u1").current_user(), Ok("u1".to_string()));
        assert_eq!(
            FixedIdentity::anonymous().current_user(),
            Err(AuthError::MissingIdentity)
        );
        assert_eq!(
            FixedIdentity::user("").current_user(),
            Err(AuthError::MissingIdentity)
        );
    }

    #[test]
    fn test_rate_limit_message_is_rewritten() {
        let error = AuthError::Rejected {
            message: "Email rate limit exceeded".to_string(),
        };
        assert!(format_auth_error(&error).starts_with("Too many email requests"));

        let error = AuthError::Rejected {
            message: "Invalid login credentials".to_string(),
        };
        assert_eq!(format_auth_error(&error), "Invalid login credentials");
    }
}
