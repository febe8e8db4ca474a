//! Target resolution for moderation commands.
//!
//! A target is taken from the replied-to message, a numeric id, or an
//! @username already known to the user repository.

use teloxide::types::{Message, UserId};

use crate::bot::dispatcher::AppState;

/// User a moderation command acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub id: UserId,
    pub name: String,
    /// Arguments consumed by the target itself (0 for replies).
    pub skip: usize,
}

/// Resolve the target user of a command message.
///
/// Resolution order:
/// 1. Reply message → use `reply.from`
/// 2. ID argument → name from `UserRepo.get_by_id` when known
/// 3. @username → lookup via `UserRepo.get_by_username`
pub async fn get_target_from_msg(msg: &Message, state: &AppState) -> Option<Target> {
    if let Some(user) = msg.reply_to_message().and_then(|r| r.from.as_ref()) {
        return Some(Target {
            id: user.id,
            name: user.first_name.clone(),
            skip: 0,
        });
    }

    let arg = msg.text()?.split_whitespace().nth(1)?;

    if let Ok(id) = arg.parse::<u64>() {
        let name = match state.users.get_by_id(id).await {
            Ok(Some(user)) => user.first_name,
            _ => format!("User {}", id),
        };
        return Some(Target {
            id: UserId(id),
            name,
            skip: 1,
        });
    }

    if arg.starts_with('@') {
        if let Ok(Some(user)) = state.users.get_by_username(arg).await {
            return Some(Target {
                id: UserId(user.user_id),
                name: user.first_name,
                skip: 1,
            });
        }
    }

    None
}
