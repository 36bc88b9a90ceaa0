use serde::{Deserialize, Serialize};

use super::{new_id, now_millis};

/// A comment on an item. Replies carry `parent_comment_id`; threading is one level deep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Comment {
    pub id: String,
    pub item_id: String,
    pub author_id: String,
    pub author_name: String,
    pub author_image: Option<String>,
    pub content: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub is_edited: bool,
    pub likes: i64,
    pub parent_comment_id: Option<String>,
}

impl Comment {
    pub fn new(
        item_id: impl Into<String>,
        author_id: impl Into<String>,
        author_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let now = now_millis();
        Self {
            id: new_id("comment"),
            item_id: item_id.into(),
            author_id: author_id.into(),
            author_name: author_name.into(),
            content: content.into(),
            created_at: now,
            updated_at: now,
            ..Self::default()
        }
    }

    pub fn reply_to(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_comment_id = Some(parent_id.into());
        self
    }

    pub fn is_top_level(&self) -> bool {
        self.parent_comment_id.is_none()
    }

    pub fn edit(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.is_edited = true;
        self.updated_at = now_millis();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_is_not_top_level() {
        let comment = Comment::new("item_1", "u1", "Ada", "Nice!");
        assert!(comment.is_top_level());

        let reply = Comment::new("item_1", "u2", "Bob", "Agreed").reply_to(&comment.id);
        assert!(!reply.is_top_level());
    }

    #[test]
    fn test_edit_marks_edited() {
        let mut comment = Comment::new("item_1", "u1", "Ada", "Nice!");
        comment.edit("Very nice!");
        assert!(comment.is_edited);
        assert_eq!(comment.content, "Very nice!");
    }
}
