//! The send primitive the delivery worker drives.
//!
//! `MessageSender` is the only seam between the queue and Telegram. The
//! production implementation is the throttled teloxide bot; tests plug in a
//! scripted fake.

use std::time::Duration;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{LinkPreviewOptions, ReplyParameters};
use teloxide::{ApiError, RequestError};

use super::OutboundMessage;
use crate::bot::dispatcher::ThrottledBot;

/// Failure of a single physical send attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    /// Flood control, carries the wait suggested by Telegram.
    #[error("flood wait of {}s requested", retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    /// The user blocked the bot or can no longer be messaged.
    #[error("recipient has blocked the bot")]
    Blocked,

    /// The bot cannot write into the destination chat.
    #[error("no permission to write in the destination chat")]
    Forbidden,

    /// Anything else: network, decoding, unexpected API errors.
    #[error("{0}")]
    Other(String),
}

impl From<RequestError> for SendError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::RetryAfter(wait) => Self::RateLimited {
                retry_after: wait.duration(),
            },
            RequestError::Api(api) => match api {
                ApiError::BotBlocked
                | ApiError::UserDeactivated
                | ApiError::CantInitiateConversation => Self::Blocked,
                ApiError::BotKicked
                | ApiError::BotKickedFromSupergroup
                | ApiError::ChatNotFound
                | ApiError::NotEnoughRightsToPostMessages => Self::Forbidden,
                ApiError::Unknown(text) if text.starts_with("Forbidden") => Self::Forbidden,
                other => Self::Other(other.to_string()),
            },
            other => Self::Other(other.to_string()),
        }
    }
}

/// Performs one physical send of an outbound message.
#[async_trait]
pub trait MessageSender: Send + Sync + 'static {
    async fn send(&self, message: &OutboundMessage) -> Result<(), SendError>;
}

#[async_trait]
impl MessageSender for ThrottledBot {
    async fn send(&self, message: &OutboundMessage) -> Result<(), SendError> {
        let mut request = self.send_message(message.destination.clone(), message.text.clone());

        if let Some(mode) = message.parse_mode {
            request = request.parse_mode(mode);
        }
        if let Some(reply_to) = message.reply_to {
            request = request.reply_parameters(ReplyParameters::new(reply_to));
        }
        if let Some(markup) = message.reply_markup.clone() {
            request = request.reply_markup(markup);
        }
        if message.options.disable_link_preview {
            request = request.link_preview_options(LinkPreviewOptions {
                is_disabled: true,
                url: None,
                prefer_small_media: false,
                prefer_large_media: false,
                show_above_text: false,
            });
        }
        if message.options.disable_notification {
            request = request.disable_notification(true);
        }
        if message.options.protect_content {
            request = request.protect_content(true);
        }

        request.await?;
        Ok(())
    }
}
