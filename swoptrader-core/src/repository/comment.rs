use serde_json::json;
use tracing::warn;

use super::touched;
use crate::models::{Comment, Item};
use crate::query::{Direction, EntityQuery};
use crate::sync::{SyncError, SyncPolicy};

#[derive(Clone)]
pub struct CommentRepository {
    comments: SyncPolicy<Comment>,
    items: SyncPolicy<Item>,
}

impl CommentRepository {
    pub fn new(comments: SyncPolicy<Comment>, items: SyncPolicy<Item>) -> Self {
        Self { comments, items }
    }

    pub async fn get(&self, id: &str) -> Result<Option<Comment>, SyncError> {
        self.comments.get(id).await
    }

    /// Top-level comments on an item, oldest first.
    pub async fn list_for_item(&self, item_id: &str) -> Result<Vec<Comment>, SyncError> {
        let query = EntityQuery::all()
            .where_eq("itemId", item_id)
            .order_by("createdAt", Direction::Ascending);
        let comments = self.comments.list(&query).await?;
        Ok(comments.into_iter().filter(Comment::is_top_level).collect())
    }

    pub async fn list_replies(&self, comment_id: &str) -> Result<Vec<Comment>, SyncError> {
        let query = EntityQuery::all()
            .where_eq("parentCommentId", comment_id)
            .order_by("createdAt", Direction::Ascending);
        self.comments.list(&query).await
    }

    /// Saves the comment and bumps the item's `commentsCount`. The counter
    /// update is best-effort.
    pub async fn add(&self, comment: Comment) -> Result<Comment, SyncError> {
        let comment = self.comments.save(comment).await?.into_inner();

        if let Err(e) = self.bump_comment_count(&comment.item_id).await {
            warn!(item_id = %comment.item_id, "Failed to bump comment count: {}", e);
        }
        Ok(comment)
    }

    async fn bump_comment_count(&self, item_id: &str) -> Result<(), SyncError> {
        let item = self.items.require(item_id).await?;
        self.items
            .patch(item_id, touched([("commentsCount", json!(item.comments_count + 1))]))
            .await?;
        Ok(())
    }

    pub async fn edit(&self, id: &str, content: &str) -> Result<Comment, SyncError> {
        let mut comment = self.comments.require(id).await?;
        comment.edit(content);
        Ok(self.comments.save(comment).await?.into_inner())
    }

    pub async fn delete(&self, id: &str) -> Result<(), SyncError> {
        self.comments.delete(id).await?;
        Ok(())
    }

    pub async fn like(&self, id: &str) -> Result<i64, SyncError> {
        let comment = self.comments.require(id).await?;
        let likes = comment.likes + 1;
        self.comments
            .patch(id, touched([("likes", json!(likes))]))
            .await?;
        Ok(likes)
    }
}
