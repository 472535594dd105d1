use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

const MESSAGE_MAX: usize = 2000;

/// A row of `messages`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// The other participant, seen from `user_id`
    pub fn counterpart(&self, user_id: Uuid) -> Uuid {
        if self.sender_id == user_id {
            self.receiver_id
        } else {
            self.sender_id
        }
    }
}

/// Body of `POST /api/messages`
#[derive(Debug, Clone, Deserialize)]
pub struct NewMessage {
    pub receiver_id: Uuid,
    pub content: String,
}

impl NewMessage {
    pub fn normalized(self, sender_id: Uuid) -> AppResult<Self> {
        if self.receiver_id == sender_id {
            return Err(AppError::InvalidInput(
                "cannot send a message to yourself".to_string(),
            ));
        }

        let content = self.content.trim().to_string();
        if content.is_empty() {
            return Err(AppError::InvalidInput("message cannot be empty".to_string()));
        }
        if content.chars().count() > MESSAGE_MAX {
            return Err(AppError::InvalidInput(format!(
                "message must be at most {} characters",
                MESSAGE_MAX
            )));
        }

        Ok(Self {
            receiver_id: self.receiver_id,
            content,
        })
    }
}

/// One entry of the inbox: latest message per counterpart
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConversationSummary {
    pub counterpart_id: Uuid,
    pub counterpart_username: Option<String>,
    pub counterpart_avatar_url: Option<String>,
    pub last_message: Message,
    pub unread_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cannot_message_self() {
        let me = Uuid::new_v4();
        let msg = NewMessage {
            receiver_id: me,
            content: "hi".to_string(),
        };
        assert!(msg.normalized(me).is_err());
    }

    #[test]
    fn test_content_trimmed_and_bounded() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();

        let ok = NewMessage {
            receiver_id: other,
            content: "  watch Perfect Blue  ".to_string(),
        }
        .normalized(me)
        .unwrap();
        assert_eq!(ok.content, "watch Perfect Blue");

        let long = NewMessage {
            receiver_id: other,
            content: "x".repeat(2001),
        };
        assert!(long.normalized(me).is_err());
    }

    #[test]
    fn test_counterpart() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let msg = Message {
            id: Uuid::new_v4(),
            sender_id: a,
            receiver_id: b,
            content: "hey".to_string(),
            read: false,
            created_at: Utc::now(),
        };
        assert_eq!(msg.counterpart(a), b);
        assert_eq!(msg.counterpart(b), a);
    }
}
