use serde_json::json;

use super::{into_document, DecodeError, Document, DocumentCodec, FieldReader};
use crate::models::Comment;

impl DocumentCodec for Comment {
    fn to_document(&self) -> Document {
        into_document(json!({
            "id": self.id,
            "itemId": self.item_id,
            "authorId": self.author_id,
            "authorName": self.author_name,
            "authorImage": self.author_image,
            "content": self.content,
            "createdAt": self.created_at,
            "updatedAt": self.updated_at,
            "isEdited": self.is_edited,
            "likes": self.likes,
            "parentCommentId": self.parent_comment_id,
        }))
    }

    fn from_document(id: &str, doc: &Document) -> Result<Self, DecodeError> {
        let r = FieldReader::new(id, doc);

        Ok(Comment {
            id: id.to_string(),
            item_id: r.required_string("itemId")?,
            author_id: r.string("authorId"),
            author_name: r.string("authorName"),
            author_image: r.opt_string("authorImage"),
            content: r.string("content"),
            created_at: r.millis_or_now("createdAt"),
            updated_at: r.millis_or_now("updatedAt"),
            is_edited: r.bool_or("isEdited", false),
            likes: r.i64("likes"),
            parent_comment_id: r.opt_string("parentCommentId"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_roundtrip() {
        let mut comment = Comment::new("item_1", "u1", "Ada", "Is this still available?")
            .reply_to("comment_0");
        comment.author_image = Some("https://img/ada.png".into());
        comment.likes = 3;

        let decoded = Comment::from_document(&comment.id, &comment.to_document()).unwrap();
        assert_eq!(decoded, comment);
    }

    #[test]
    fn test_comment_missing_likes_defaults_to_zero() {
        let mut comment = Comment::new("item_1", "u1", "Ada", "Nice");
        comment.likes = 9;
        let mut doc = comment.to_document();
        doc.remove("likes");

        let decoded = Comment::from_document(&comment.id, &doc).unwrap();
        assert_eq!(decoded.likes, 0);
        assert!(decoded.is_top_level());
    }
}
