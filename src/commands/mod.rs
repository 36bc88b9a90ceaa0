mod chat;
mod comment;
mod config_cmd;
mod history;
mod item;
mod offer;
mod trade;
mod user;

pub use chat::ChatCommand;
pub use comment::CommentCommand;
pub use config_cmd::ConfigCommand;
pub use history::HistoryCommand;
pub use item::ItemCommand;
pub use offer::OfferCommand;
pub use trade::TradeCommand;
pub use user::UserCommand;

use chrono::{DateTime, NaiveDateTime, Utc};
use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub(crate) fn print_json<T>(value: &T) -> Result<(), Box<dyn std::error::Error>>
where
    T: Serialize + ?Sized,
{
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Epoch milliseconds as `YYYY-MM-DD HH:MM` (UTC).
pub(crate) fn format_time(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Accepts RFC 3339 or `YYYY-MM-DD HH:MM` (UTC); returns epoch milliseconds.
pub(crate) fn parse_time(s: &str) -> Result<i64, String> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.timestamp_millis());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M")
        .map(|t| t.and_utc().timestamp_millis())
        .map_err(|_| format!("Invalid time '{}', expected YYYY-MM-DD HH:MM or RFC 3339", s))
}
