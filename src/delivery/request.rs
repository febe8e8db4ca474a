//! Outbound message requests.

use teloxide::types::{MessageId, ParseMode, Recipient, ReplyMarkup};

/// Extra flags forwarded to `sendMessage`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryOptions {
    /// Suppress the link preview.
    pub disable_link_preview: bool,
    /// Deliver without a notification sound.
    pub disable_notification: bool,
    /// Forbid forwarding and saving.
    pub protect_content: bool,
}

impl DeliveryOptions {
    /// Options used for broadcasts and announcements.
    pub fn no_preview() -> Self {
        Self {
            disable_link_preview: true,
            ..Default::default()
        }
    }
}

/// A single message waiting in the delivery queue.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub destination: Recipient,
    pub text: String,
    pub reply_to: Option<MessageId>,
    pub parse_mode: Option<ParseMode>,
    pub reply_markup: Option<ReplyMarkup>,
    pub options: DeliveryOptions,
}

impl OutboundMessage {
    pub fn new(destination: impl Into<Recipient>, text: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            text: text.into(),
            reply_to: None,
            parse_mode: None,
            reply_markup: None,
            options: DeliveryOptions::default(),
        }
    }

    /// Shorthand for `parse_mode(ParseMode::Html)`.
    #[must_use]
    pub fn html(self) -> Self {
        self.parse_mode(ParseMode::Html)
    }

    #[must_use]
    pub fn parse_mode(mut self, mode: ParseMode) -> Self {
        self.parse_mode = Some(mode);
        self
    }

    #[must_use]
    pub fn reply_to(mut self, message_id: MessageId) -> Self {
        self.reply_to = Some(message_id);
        self
    }

    #[must_use]
    pub fn reply_markup(mut self, markup: impl Into<ReplyMarkup>) -> Self {
        self.reply_markup = Some(markup.into());
        self
    }

    #[must_use]
    pub fn options(mut self, options: DeliveryOptions) -> Self {
        self.options = options;
        self
    }

    /// Human readable destination for log lines.
    pub fn target(&self) -> String {
        match &self.destination {
            Recipient::Id(id) => id.to_string(),
            Recipient::ChannelUsername(username) => username.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::ChatId;

    #[test]
    fn test_builder_sets_fields() {
        let msg = OutboundMessage::new(ChatId(42), "hello")
            .html()
            .reply_to(MessageId(7))
            .options(DeliveryOptions::no_preview());

        assert_eq!(msg.destination, Recipient::Id(ChatId(42)));
        assert_eq!(msg.parse_mode, Some(ParseMode::Html));
        assert_eq!(msg.reply_to, Some(MessageId(7)));
        assert!(msg.options.disable_link_preview);
        assert!(!msg.options.disable_notification);
    }

    #[test]
    fn test_target_formats_handles() {
        let by_id = OutboundMessage::new(ChatId(-100123), "x");
        let by_name = OutboundMessage::new(Recipient::ChannelUsername("@news".into()), "x");

        assert_eq!(by_id.target(), "-100123");
        assert_eq!(by_name.target(), "@news");
    }
}
