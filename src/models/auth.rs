use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::profile::validate_username;
use crate::error::{AppError, AppResult};

const PASSWORD_MIN: usize = 6;

/// Email/password pair for `POST /api/auth/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn normalized(self) -> AppResult<Self> {
        let email = validate_email(&self.email)?;
        if self.password.is_empty() {
            return Err(AppError::InvalidInput("password is required".to_string()));
        }
        Ok(Self {
            email,
            password: self.password,
        })
    }
}

/// Body of `POST /api/auth/signup`
#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub username: String,
}

impl SignupRequest {
    pub fn normalized(self) -> AppResult<Self> {
        let email = validate_email(&self.email)?;
        validate_password(&self.password)?;
        let username = validate_username(&self.username)?;
        Ok(Self {
            email,
            password: self.password,
            username,
        })
    }
}

/// The auth backend's view of a user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthAccount {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// Token grant returned by login, refresh and auto-confirmed signup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub expires_in: u64,
    pub user: AuthAccount,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Signup yields no session while email confirmation is pending
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignupOutcome {
    pub user: AuthAccount,
    pub session: Option<Session>,
}

pub fn validate_email(raw: &str) -> AppResult<String> {
    let email = raw.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    };
    if !valid {
        return Err(AppError::InvalidInput("a valid email is required".to_string()));
    }
    Ok(email)
}

pub fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() < PASSWORD_MIN {
        return Err(AppError::InvalidInput(format!(
            "password must be at least {} characters",
            PASSWORD_MIN
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_normalized() {
        assert_eq!(validate_email(" Ada@Example.com ").unwrap(), "ada@example.com");
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ada@localhost").is_err());
    }

    #[test]
    fn test_password_minimum() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
    }

    #[test]
    fn test_signup_checks_all_fields() {
        let request = SignupRequest {
            email: "ada@example.com".to_string(),
            password: "hunter22".to_string(),
            username: "x".to_string(),
        };
        assert!(request.normalized().is_err());
    }

    #[test]
    fn test_session_token_type_default() {
        let session: Session = serde_json::from_value(serde_json::json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": 3600,
            "user": {"id": "00000000-0000-0000-0000-000000000001", "email": "ada@example.com"}
        }))
        .unwrap();
        assert_eq!(session.token_type, "bearer");
    }
}
