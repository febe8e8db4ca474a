//! Blacklist middleware.
//!
//! Stops processing for blacklisted senders and for messages containing a
//! blacklisted word. Sudo users are never filtered.

use teloxide::prelude::*;
use tracing::{debug, warn};

use crate::bot::dispatcher::AppState;
use crate::delivery::OutboundMessage;

/// Why a message was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    User,
    Word(String),
}

impl Rejection {
    pub fn reply_text(&self) -> String {
        match self {
            Self::User => "❌ You are blacklisted from using this bot.".to_string(),
            Self::Word(word) => format!("❌ Your message contains a blacklisted word: {}", word),
        }
    }
}

/// Check a message against the in-memory blacklist.
pub fn check(state: &AppState, msg: &Message) -> Option<Rejection> {
    let user_id = msg.from.as_ref()?.id.0;
    if state.is_sudo(user_id) {
        return None;
    }

    if state.blacklist.is_user_blacklisted(user_id) {
        return Some(Rejection::User);
    }

    let text = msg.text().or(msg.caption())?;
    state.blacklist.find_word(text).map(Rejection::Word)
}

/// dptree filter: `true` lets the message through.
pub async fn blacklist_filter(msg: Message, state: AppState) -> bool {
    let Some(rejection) = check(&state, &msg) else {
        return true;
    };

    debug!("Rejected message {} in {}: {:?}", msg.id, msg.chat.id, rejection);

    let reply = OutboundMessage::new(msg.chat.id, rejection.reply_text()).reply_to(msg.id);
    if let Err(e) = state.delivery.enqueue(reply) {
        warn!("Failed to queue blacklist reply: {}", e);
    }
    false
}
