use crate::models::{TradeHistory, TradeRating};
use crate::query::{Direction, EntityQuery};
use crate::sync::{SyncError, SyncPolicy};

#[derive(Clone)]
pub struct TradeHistoryRepository {
    policy: SyncPolicy<TradeHistory>,
}

impl TradeHistoryRepository {
    pub fn new(policy: SyncPolicy<TradeHistory>) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SyncPolicy<TradeHistory> {
        &self.policy
    }

    pub async fn get(&self, id: &str) -> Result<Option<TradeHistory>, SyncError> {
        self.policy.get(id).await
    }

    /// Completed trades `user_id` took part in, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<TradeHistory>, SyncError> {
        let query = EntityQuery::all()
            .where_contains("participantIds", user_id)
            .order_by("completedAt", Direction::Descending);
        self.policy.list(&query).await
    }

    /// The trade recorded for `offer_id`, if it was completed.
    pub async fn find_for_offer(&self, offer_id: &str) -> Result<Option<TradeHistory>, SyncError> {
        let query = EntityQuery::all().where_eq("offerId", offer_id).limit(1);
        Ok(self.policy.list(&query).await?.into_iter().next())
    }

    pub async fn save(&self, history: TradeHistory) -> Result<TradeHistory, SyncError> {
        Ok(self.policy.save(history).await?.into_inner())
    }

    /// Stores a 1 to 5 star rating (out-of-range values are clamped).
    pub async fn rate(
        &self,
        trade_id: &str,
        stars: u8,
        comment: &str,
        rated_by: &str,
    ) -> Result<TradeHistory, SyncError> {
        let mut history = self.policy.require(trade_id).await?;
        history.rating = Some(TradeRating {
            rating: stars.clamp(1, 5),
            comment: comment.to_string(),
            rated_by: rated_by.to_string(),
        });
        self.save(history).await
    }
}
