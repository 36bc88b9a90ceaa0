use futures::stream::BoxStream;

use crate::models::{Chat, ChatMessage, MessageType, Offer};
use crate::query::{Direction, EntityQuery};
use crate::sync::{SyncError, SyncPolicy};

/// Chats and their messages.
#[derive(Clone)]
pub struct ChatRepository {
    chats: SyncPolicy<Chat>,
    messages: SyncPolicy<ChatMessage>,
}

impl ChatRepository {
    pub fn new(chats: SyncPolicy<Chat>, messages: SyncPolicy<ChatMessage>) -> Self {
        Self { chats, messages }
    }

    fn messages_query(chat_id: &str) -> EntityQuery {
        EntityQuery::all()
            .where_eq("chatId", chat_id)
            .order_by("timestamp", Direction::Ascending)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Chat>, SyncError> {
        self.chats.get(id).await
    }

    /// Chats `user_id` takes part in, most recently active first.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Chat>, SyncError> {
        let query = EntityQuery::all()
            .where_contains("participantIds", user_id)
            .order_by("lastMessageAt", Direction::Descending);
        self.chats.list(&query).await
    }

    /// Returns the chat tied to `offer`, creating it if there is none yet.
    pub async fn get_or_create_for_offer(&self, offer: &Offer) -> Result<Chat, SyncError> {
        let query = EntityQuery::all().where_eq("offerId", offer.id.as_str()).limit(1);
        if let Some(chat) = self.chats.list(&query).await?.into_iter().next() {
            return Ok(chat);
        }

        let chat = Chat::new(offer.participant_ids())
            .for_offer(&offer.id)
            .for_item(&offer.requested_item_id);
        Ok(self.chats.save(chat).await?.into_inner())
    }

    /// Stores a message from `sender_id` and updates the chat preview and
    /// the recipient's unread count.
    pub async fn send_message(
        &self,
        chat_id: &str,
        sender_id: &str,
        text: &str,
        message_type: MessageType,
    ) -> Result<ChatMessage, SyncError> {
        let mut chat = self.chats.require(chat_id).await?;

        let receiver_id = chat
            .participant_ids
            .iter()
            .find(|p| p.as_str() != sender_id)
            .cloned()
            .unwrap_or_else(|| sender_id.to_string());

        let message =
            ChatMessage::new(chat_id, sender_id, receiver_id, text).with_type(message_type);
        let message = self.messages.save(message).await?.into_inner();

        chat.record_message(&message);
        self.chats.save(chat).await?;

        Ok(message)
    }

    /// Messages of a chat, oldest first.
    pub async fn list_messages(&self, chat_id: &str) -> Result<Vec<ChatMessage>, SyncError> {
        self.messages.list(&Self::messages_query(chat_id)).await
    }

    pub fn observe_messages(
        &self,
        chat_id: &str,
    ) -> BoxStream<'static, Result<Vec<ChatMessage>, SyncError>> {
        self.messages.observe(Self::messages_query(chat_id))
    }

    /// Clears `reader_id`'s unread count and marks the messages addressed to
    /// them as read. Returns how many messages changed.
    pub async fn mark_read(&self, chat_id: &str, reader_id: &str) -> Result<usize, SyncError> {
        let mut chat = self.chats.require(chat_id).await?;
        chat.unread_count.insert(reader_id.to_string(), 0);
        self.chats.save(chat).await?;

        let query = EntityQuery::all()
            .where_eq("chatId", chat_id)
            .where_eq("receiverId", reader_id)
            .where_eq("isRead", false);
        let unread = self.messages.list(&query).await?;

        let count = unread.len();
        for mut message in unread {
            message.is_read = true;
            self.messages.save(message).await?;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{LocalCache, MemoryCache};
    use futures::StreamExt;
    use std::sync::Arc;

    fn repo() -> ChatRepository {
        let chats: Arc<dyn LocalCache<Chat>> = Arc::new(MemoryCache::<Chat>::new());
        let messages: Arc<dyn LocalCache<ChatMessage>> =
            Arc::new(MemoryCache::<ChatMessage>::new());
        ChatRepository::new(SyncPolicy::new(chats), SyncPolicy::new(messages))
    }

    #[tokio::test]
    async fn test_get_or_create_for_offer_is_idempotent() {
        let repo = repo();
        let offer = Offer::new("alice", "bob", "item_1");

        let first = repo.get_or_create_for_offer(&offer).await.unwrap();
        let second = repo.get_or_create_for_offer(&offer).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.item_id.as_deref(), Some("item_1"));
        assert_eq!(repo.list_for_user("alice").await.unwrap().len(), 1);
        assert!(repo.list_for_user("carol").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_message_and_mark_read() {
        let repo = repo();
        let chat = repo
            .get_or_create_for_offer(&Offer::new("alice", "bob", "item_1"))
            .await
            .unwrap();

        let hello = repo
            .send_message(&chat.id, "alice", "Hi Bob", MessageType::Text)
            .await
            .unwrap();
        assert_eq!(hello.receiver_id, "bob");
        repo.send_message(&chat.id, "alice", "Still there?", MessageType::Text)
            .await
            .unwrap();

        let chat_now = repo.get(&chat.id).await.unwrap().unwrap();
        assert_eq!(chat_now.unread_for("bob"), 2);
        assert_eq!(chat_now.last_message, "Still there?");

        assert_eq!(repo.mark_read(&chat.id, "bob").await.unwrap(), 2);
        assert_eq!(repo.get(&chat.id).await.unwrap().unwrap().unread_for("bob"), 0);
        assert!(repo
            .list_messages(&chat.id)
            .await
            .unwrap()
            .iter()
            .all(|m| m.is_read));
        assert_eq!(repo.mark_read(&chat.id, "bob").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_send_to_missing_chat_fails() {
        let repo = repo();
        let result = repo
            .send_message("chat_missing", "alice", "hi", MessageType::Text)
            .await;
        assert!(matches!(result, Err(SyncError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_observe_messages_sees_new_message() {
        let repo = repo();
        let chat = repo
            .get_or_create_for_offer(&Offer::new("alice", "bob", "item_1"))
            .await
            .unwrap();
        let mut updates = repo.observe_messages(&chat.id);
        assert!(updates.next().await.unwrap().unwrap().is_empty());

        repo.send_message(&chat.id, "bob", "Deal", MessageType::Text)
            .await
            .unwrap();
        let messages = updates.next().await.unwrap().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "Deal");
    }
}
