use serde_json::json;
use tracing::warn;

use super::touched;
use crate::models::{now_millis, Item, Meetup, Offer, OfferStatus};
use crate::query::{Direction, EntityQuery};
use crate::sync::{SyncError, SyncPolicy};

#[derive(Debug, thiserror::Error)]
pub enum OfferError {
    #[error("Item '{0}' not found")]
    ItemNotFound(String),
    #[error("You cannot make an offer on your own item")]
    OwnItem,
    #[error("An offer needs at least one item or a cash amount")]
    Empty,
    #[error(transparent)]
    Sync(#[from] SyncError),
}

#[derive(Clone)]
pub struct OfferRepository {
    policy: SyncPolicy<Offer>,
    items: SyncPolicy<Item>,
}

impl OfferRepository {
    pub fn new(policy: SyncPolicy<Offer>, items: SyncPolicy<Item>) -> Self {
        Self { policy, items }
    }

    pub fn policy(&self) -> &SyncPolicy<Offer> {
        &self.policy
    }

    pub async fn get(&self, id: &str) -> Result<Option<Offer>, SyncError> {
        self.policy.get(id).await
    }

    /// Offers addressed to `user_id`, newest first.
    pub async fn list_received(&self, user_id: &str) -> Result<Vec<Offer>, SyncError> {
        let query = EntityQuery::all()
            .where_eq("toUserId", user_id)
            .order_by("createdAt", Direction::Descending);
        self.policy.list(&query).await
    }

    /// Offers made by `user_id`, newest first.
    pub async fn list_sent(&self, user_id: &str) -> Result<Vec<Offer>, SyncError> {
        let query = EntityQuery::all()
            .where_eq("fromUserId", user_id)
            .order_by("createdAt", Direction::Descending);
        self.policy.list(&query).await
    }

    /// Pitches a new offer for the requested item. The recipient is the
    /// item's owner. Bumping the item's `pitchCount` is best-effort.
    pub async fn create(&self, mut offer: Offer) -> Result<Offer, OfferError> {
        let requested = self
            .items
            .get(&offer.requested_item_id)
            .await?
            .ok_or_else(|| OfferError::ItemNotFound(offer.requested_item_id.clone()))?;
        if requested.owner_id == offer.from_user_id {
            return Err(OfferError::OwnItem);
        }
        if offer.offered_item_ids.is_empty() && offer.cash_amount.is_none() {
            return Err(OfferError::Empty);
        }

        offer.to_user_id = requested.owner_id.clone();
        let offer = self.save(offer).await?;

        if let Err(e) = self.bump_pitch_count(&requested).await {
            warn!(item_id = %requested.id, "Failed to bump pitch count: {}", e);
        }
        Ok(offer)
    }

    async fn bump_pitch_count(&self, item: &Item) -> Result<(), SyncError> {
        self.items
            .patch(&item.id, touched([("pitchCount", json!(item.pitch_count + 1))]))
            .await?;
        Ok(())
    }

    pub async fn save(&self, mut offer: Offer) -> Result<Offer, SyncError> {
        offer.updated_at = now_millis();
        Ok(self.policy.save(offer).await?.into_inner())
    }

    pub async fn update_status(
        &self,
        id: &str,
        status: OfferStatus,
    ) -> Result<Option<Offer>, SyncError> {
        let patched = self
            .policy
            .patch(id, touched([("status", json!(status.as_str()))]))
            .await?;
        Ok(patched.into_inner())
    }

    /// Embeds `meetup` in the offer. The meetup document itself is saved
    /// through the meetup repository.
    pub async fn attach_meetup(&self, offer_id: &str, meetup: Meetup) -> Result<Offer, SyncError> {
        let mut offer = self.policy.require(offer_id).await?;
        offer.meetup = Some(meetup);
        self.save(offer).await
    }
}
