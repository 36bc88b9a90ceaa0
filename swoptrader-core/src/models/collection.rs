use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named document collections shared by the cloud store, the REST surface
/// and the local cache tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Items,
    Users,
    Comments,
    Chats,
    ChatMessages,
    Offers,
    Meetups,
    TradeHistory,
}

impl Collection {
    pub const ALL: [Collection; 8] = [
        Collection::Items,
        Collection::Users,
        Collection::Comments,
        Collection::Chats,
        Collection::ChatMessages,
        Collection::Offers,
        Collection::Meetups,
        Collection::TradeHistory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Items => "items",
            Collection::Users => "users",
            Collection::Comments => "comments",
            Collection::Chats => "chats",
            Collection::ChatMessages => "chat_messages",
            Collection::Offers => "offers",
            Collection::Meetups => "meetups",
            Collection::TradeHistory => "trade_history",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("Unknown collection '{}'", s))
    }
}
