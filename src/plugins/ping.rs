//! Ping command plugin.
//!
//! Measures and displays Telegram API latency.

use std::time::Instant;

use teloxide::prelude::*;

use super::reply;
use crate::bot::dispatcher::{AppState, ThrottledBot};

/// Handle the /ping command - measures Telegram API latency.
pub async fn ping_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    // Measure time to call getMe (lightweight API call)
    let start = Instant::now();
    bot.get_me().await?;
    let ms = start.elapsed().as_millis();

    let text = format!("{} Pong! <code>{}ms</code>", latency_emoji(ms), ms);
    reply(&state, &msg, text)
}

fn latency_emoji(ms: u128) -> &'static str {
    match ms {
        0..100 => "🟢",
        100..300 => "🟡",
        _ => "🔴",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_emoji() {
        assert_eq!(latency_emoji(42), "🟢");
        assert_eq!(latency_emoji(100), "🟡");
        assert_eq!(latency_emoji(900), "🔴");
    }
}
