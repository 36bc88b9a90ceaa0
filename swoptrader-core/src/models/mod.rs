mod chat;
mod collection;
mod comment;
mod item;
mod location;
mod meetup;
mod offer;
mod trade_history;
mod user;

pub use chat::{Chat, ChatMessage, MessageType};
pub use collection::Collection;
pub use comment::Comment;
pub use item::{Item, ItemCategory, ItemCondition};
pub use location::{Location, MeetupLocation, MeetupLocationType};
pub use meetup::{Meetup, MeetupStatus, MeetupType};
pub use offer::{Offer, OfferStatus};
pub use trade_history::{TradeHistory, TradeRating, TradedItem};
pub use user::User;

use chrono::Utc;
use uuid::Uuid;

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Generates an entity id of the form `<prefix>_<epoch millis>_<8 hex chars>`.
pub fn new_id(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}_{}", prefix, now_millis(), &suffix[..8])
}

/// Normalizes an enum label for lenient parsing ("like new", "Like-New" -> "LIKE_NEW").
pub(crate) fn normalize_label(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' | '&' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect::<String>()
        .split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_id_has_prefix_and_timestamp() {
        let id = new_id("item");
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "item");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 8);
    }

    #[test]
    fn test_new_ids_are_distinct() {
        assert_ne!(new_id("offer"), new_id("offer"));
    }

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("like new"), "LIKE_NEW");
        assert_eq!(normalize_label("Like-New"), "LIKE_NEW");
        assert_eq!(normalize_label("home & garden"), "HOME_GARDEN");
        assert_eq!(normalize_label(" PENDING "), "PENDING");
    }
}
