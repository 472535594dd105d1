use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 30;
const BIO_MAX: usize = 500;

/// Public profile, one per auth user (same id)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub username: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `PATCH /api/profiles/me`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub bio: Option<String>,
}

impl ProfileUpdate {
    /// Validates and trims the update. A blank bio clears it.
    pub fn normalized(self) -> AppResult<Self> {
        if self.username.is_none() && self.bio.is_none() {
            return Err(AppError::InvalidInput(
                "nothing to update: provide username and/or bio".to_string(),
            ));
        }

        let username = match self.username {
            Some(name) => Some(validate_username(&name)?),
            None => None,
        };

        let bio = match self.bio {
            Some(bio) => {
                let bio = bio.trim().to_string();
                if bio.chars().count() > BIO_MAX {
                    return Err(AppError::InvalidInput(format!(
                        "bio must be at most {} characters",
                        BIO_MAX
                    )));
                }
                Some(bio)
            }
            None => None,
        };

        Ok(Self { username, bio })
    }
}

/// Checks username rules and returns the trimmed name.
pub fn validate_username(raw: &str) -> AppResult<String> {
    let username = raw.trim();
    let len = username.chars().count();

    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(AppError::InvalidInput(format!(
            "username must be {}-{} characters",
            USERNAME_MIN, USERNAME_MAX
        )));
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(AppError::InvalidInput(
            "username may only contain letters, digits and underscores".to_string(),
        ));
    }

    Ok(username.to_string())
}
