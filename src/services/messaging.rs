use std::collections::HashMap;

use uuid::Uuid;

use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{ConversationSummary, Message, NewMessage, Profile},
};

/// Groups a user's messages (newest first) into one summary per counterpart.
///
/// The output keeps the order of each conversation's latest message.
pub fn build_conversations(
    user_id: Uuid,
    messages: Vec<Message>,
    profiles: &[Profile],
) -> Vec<ConversationSummary> {
    let profiles: HashMap<Uuid, &Profile> = profiles.iter().map(|p| (p.id, p)).collect();
    let mut index: HashMap<Uuid, usize> = HashMap::new();
    let mut conversations: Vec<ConversationSummary> = Vec::new();

    for message in messages {
        let counterpart = message.counterpart(user_id);
        let unread = message.receiver_id == user_id && !message.read;

        match index.get(&counterpart) {
            Some(&i) => {
                if unread {
                    conversations[i].unread_count += 1;
                }
            }
            None => {
                let profile = profiles.get(&counterpart);
                index.insert(counterpart, conversations.len());
                conversations.push(ConversationSummary {
                    counterpart_id: counterpart,
                    counterpart_username: profile.map(|p| p.username.clone()),
                    counterpart_avatar_url: profile.and_then(|p| p.avatar_url.clone()),
                    last_message: message,
                    unread_count: usize::from(unread),
                });
            }
        }
    }

    conversations
}

/// Inbox view for `user_id`
pub async fn list_conversations(store: &dyn Store, user_id: Uuid) -> AppResult<Vec<ConversationSummary>> {
    let messages = store.messages_for_user(user_id).await?;

    let mut counterparts: Vec<Uuid> = messages.iter().map(|m| m.counterpart(user_id)).collect();
    counterparts.sort();
    counterparts.dedup();

    let profiles = store.profiles_by_ids(&counterparts).await?;
    Ok(build_conversations(user_id, messages, &profiles))
}

/// Full thread with `other_id`; marks what `user_id` received as read
pub async fn open_thread(store: &dyn Store, user_id: Uuid, other_id: Uuid) -> AppResult<Vec<Message>> {
    let messages = store.messages_between(user_id, other_id).await?;

    let marked = store.mark_read(user_id, other_id).await?;
    if marked > 0 {
        tracing::debug!(user_id = %user_id, other_id = %other_id, marked, "Messages marked read");
    }

    Ok(messages)
}

pub async fn send(store: &dyn Store, sender_id: Uuid, message: NewMessage) -> AppResult<Message> {
    let message = message.normalized(sender_id)?;

    if store.get_profile(message.receiver_id).await?.is_none() {
        return Err(AppError::NotFound("recipient not found".to_string()));
    }

    let sent = store.send_message(sender_id, &message).await?;
    tracing::info!(message_id = %sent.id, sender_id = %sender_id, "Message sent");
    Ok(sent)
}
