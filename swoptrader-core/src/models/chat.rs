use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::{new_id, normalize_label, now_millis};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    #[default]
    Text,
    Image,
    Offer,
    Location,
    System,
}

impl MessageType {
    pub const ALL: [MessageType; 5] = [
        MessageType::Text,
        MessageType::Image,
        MessageType::Offer,
        MessageType::Location,
        MessageType::System,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Text => "TEXT",
            MessageType::Image => "IMAGE",
            MessageType::Offer => "OFFER",
            MessageType::Location => "LOCATION",
            MessageType::System => "SYSTEM",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = normalize_label(s);
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == label)
            .ok_or_else(|| format!("Invalid message type '{}'", s))
    }
}

/// A conversation between participants, optionally tied to an offer or item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Chat {
    pub id: String,
    pub participant_ids: Vec<String>,
    pub offer_id: Option<String>,
    pub item_id: Option<String>,
    pub last_message: String,
    pub last_message_at: i64,
    /// Unread message count per participant id.
    pub unread_count: BTreeMap<String, i64>,
    pub created_at: i64,
}

impl Chat {
    pub fn new(participant_ids: Vec<String>) -> Self {
        let now = now_millis();
        let unread_count = participant_ids.iter().map(|p| (p.clone(), 0)).collect();
        Self {
            id: new_id("chat"),
            participant_ids,
            unread_count,
            last_message_at: now,
            created_at: now,
            ..Self::default()
        }
    }

    pub fn for_offer(mut self, offer_id: impl Into<String>) -> Self {
        self.offer_id = Some(offer_id.into());
        self
    }

    pub fn for_item(mut self, item_id: impl Into<String>) -> Self {
        self.item_id = Some(item_id.into());
        self
    }

    pub fn unread_for(&self, user_id: &str) -> i64 {
        self.unread_count.get(user_id).copied().unwrap_or(0)
    }

    /// Records a new message: bumps the recipient's unread count and the preview.
    pub fn record_message(&mut self, message: &ChatMessage) {
        self.last_message = message.text.clone();
        self.last_message_at = message.timestamp;
        *self
            .unread_count
            .entry(message.receiver_id.clone())
            .or_insert(0) += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatMessage {
    pub id: String,
    pub chat_id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub timestamp: i64,
    pub is_read: bool,
}

impl ChatMessage {
    pub fn new(
        chat_id: impl Into<String>,
        sender_id: impl Into<String>,
        receiver_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id("msg"),
            chat_id: chat_id.into(),
            sender_id: sender_id.into(),
            receiver_id: receiver_id.into(),
            text: text.into(),
            timestamp: now_millis(),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, message_type: MessageType) -> Self {
        self.message_type = message_type;
        self
    }
}
