//! /calc command plugin.

use teloxide::prelude::*;

use super::reply;
use crate::bot::dispatcher::AppState;
use crate::utils::calc::{evaluate, format_number};
use crate::utils::html_escape;

pub async fn calc_command(msg: Message, state: AppState, expression: String) -> anyhow::Result<()> {
    reply(&state, &msg, calc_text(&expression))
}

fn calc_text(expression: &str) -> String {
    let expression = expression.trim();
    if expression.is_empty() {
        return "❌ Usage: /calc &lt;expression&gt;\nExample: /calc 2 + 2 * (3)".to_string();
    }

    match evaluate(expression) {
        Ok(value) => format!(
            "🧮 <b>Calculator</b> 🧮\n\n\
            Expression: <code>{}</code>\n\
            Result: <b>{}</b>",
            html_escape(expression),
            format_number(value)
        ),
        Err(e) => format!("❌ Failed to evaluate expression. Error: {}", html_escape(&e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calc_text() {
        let text = calc_text(" 2 + 2 * (3) ");
        assert!(text.contains("Expression: <code>2 + 2 * (3)</code>"));
        assert!(text.contains("Result: <b>8</b>"));

        assert!(calc_text("").starts_with("❌ Usage"));
        assert_eq!(
            calc_text("1 / 0"),
            "❌ Failed to evaluate expression. Error: division by zero"
        );
        assert!(calc_text("1 < 2").contains("'&lt;'"));
    }
}
