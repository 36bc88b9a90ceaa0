use serde_json::json;

use super::{into_document, DecodeError, Document, DocumentCodec, FieldReader};
use crate::models::{Chat, ChatMessage};

impl DocumentCodec for Chat {
    fn to_document(&self) -> Document {
        into_document(json!({
            "id": self.id,
            "participantIds": self.participant_ids,
            "offerId": self.offer_id,
            "itemId": self.item_id,
            "lastMessage": self.last_message,
            "lastMessageAt": self.last_message_at,
            "unreadCount": self.unread_count,
            "createdAt": self.created_at,
        }))
    }

    fn from_document(id: &str, doc: &Document) -> Result<Self, DecodeError> {
        let r = FieldReader::new(id, doc);

        Ok(Chat {
            id: id.to_string(),
            participant_ids: r.strings("participantIds"),
            offer_id: r.opt_string("offerId"),
            item_id: r.opt_string("itemId"),
            last_message: r.string("lastMessage"),
            last_message_at: r.millis_or_now("lastMessageAt"),
            unread_count: r.counts("unreadCount"),
            created_at: r.millis_or_now("createdAt"),
        })
    }
}

impl DocumentCodec for ChatMessage {
    fn to_document(&self) -> Document {
        into_document(json!({
            "id": self.id,
            "chatId": self.chat_id,
            "senderId": self.sender_id,
            "receiverId": self.receiver_id,
            "text": self.text,
            "type": self.message_type.as_str(),
            "timestamp": self.timestamp,
            "isRead": self.is_read,
        }))
    }

    fn from_document(id: &str, doc: &Document) -> Result<Self, DecodeError> {
        let r = FieldReader::new(id, doc);

        Ok(ChatMessage {
            id: id.to_string(),
            chat_id: r.required_string("chatId")?,
            sender_id: r.string("senderId"),
            receiver_id: r.string("receiverId"),
            text: r.string("text"),
            message_type: r.enumeration("type"),
            timestamp: r.millis_or_now("timestamp"),
            is_read: r.bool_or("isRead", false),
        })
    }
}
