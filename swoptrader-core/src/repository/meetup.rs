use serde_json::json;

use super::touched;
use crate::models::{now_millis, Meetup, MeetupStatus};
use crate::query::EntityQuery;
use crate::sync::{SyncError, SyncPolicy};

#[derive(Clone)]
pub struct MeetupRepository {
    policy: SyncPolicy<Meetup>,
}

impl MeetupRepository {
    pub fn new(policy: SyncPolicy<Meetup>) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SyncPolicy<Meetup> {
        &self.policy
    }

    pub async fn get(&self, id: &str) -> Result<Option<Meetup>, SyncError> {
        self.policy.get(id).await
    }

    pub async fn find_for_offer(&self, offer_id: &str) -> Result<Option<Meetup>, SyncError> {
        let query = EntityQuery::all().where_eq("offerId", offer_id).limit(1);
        Ok(self.policy.list(&query).await?.into_iter().next())
    }

    pub async fn save(&self, mut meetup: Meetup) -> Result<Meetup, SyncError> {
        meetup.updated_at = now_millis();
        Ok(self.policy.save(meetup).await?.into_inner())
    }

    pub async fn update_status(
        &self,
        id: &str,
        status: MeetupStatus,
    ) -> Result<Option<Meetup>, SyncError> {
        let mut fields = touched([("status", json!(status.as_str()))]);
        if status == MeetupStatus::Completed {
            fields.insert("completedAt".to_string(), json!(now_millis()));
        }
        Ok(self.policy.patch(id, fields).await?.into_inner())
    }

    pub async fn delete(&self, id: &str) -> Result<(), SyncError> {
        self.policy.delete(id).await?;
        Ok(())
    }
}
