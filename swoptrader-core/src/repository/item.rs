use futures::stream::BoxStream;
use serde_json::json;
use std::cmp::Ordering;

use super::touched;
use crate::models::{now_millis, Item, ItemCategory, Location};
use crate::query::{Direction, EntityQuery};
use crate::sync::{SyncError, SyncPolicy};

#[derive(Clone)]
pub struct ItemRepository {
    policy: SyncPolicy<Item>,
}

impl ItemRepository {
    pub fn new(policy: SyncPolicy<Item>) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SyncPolicy<Item> {
        &self.policy
    }

    fn available_query() -> EntityQuery {
        EntityQuery::all()
            .where_eq("isAvailable", true)
            .order_by("createdAt", Direction::Descending)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Item>, SyncError> {
        self.policy.get(id).await
    }

    /// Available items, newest first.
    pub async fn list_available(&self, limit: Option<usize>) -> Result<Vec<Item>, SyncError> {
        let mut query = Self::available_query();
        query.limit = limit;
        self.policy.list(&query).await
    }

    pub async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Item>, SyncError> {
        let query = EntityQuery::all()
            .where_eq("ownerId", owner_id)
            .order_by("createdAt", Direction::Descending);
        self.policy.list(&query).await
    }

    /// Case-insensitive text search over available items, optionally
    /// restricted to one category.
    pub async fn search(
        &self,
        text: &str,
        category: Option<ItemCategory>,
    ) -> Result<Vec<Item>, SyncError> {
        let mut query = Self::available_query();
        if let Some(category) = category {
            query = query.where_eq("category", category.as_str());
        }

        let items = self.policy.list(&query).await?;
        Ok(items
            .into_iter()
            .filter(|item| item.matches_text(text))
            .collect())
    }

    /// Available items within `radius_km` of `from`, nearest first, with
    /// `distance` filled in. Items without a location are left out.
    pub async fn list_nearby(&self, from: &Location, radius_km: f64) -> Result<Vec<Item>, SyncError> {
        let mut items = self.policy.list(&Self::available_query()).await?;
        annotate_distance(&mut items, from);

        let mut nearby: Vec<Item> = items
            .into_iter()
            .filter(|item| item.distance.is_some_and(|d| d <= radius_km))
            .collect();
        nearby.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(Ordering::Equal)
        });
        Ok(nearby)
    }

    pub async fn save(&self, mut item: Item) -> Result<Item, SyncError> {
        item.updated_at = now_millis();
        Ok(self.policy.save(item).await?.into_inner())
    }

    pub async fn delete(&self, id: &str) -> Result<(), SyncError> {
        self.policy.delete(id).await?;
        Ok(())
    }

    /// Bumps `viewCount` and returns the new value.
    pub async fn increment_view_count(&self, id: &str) -> Result<i64, SyncError> {
        let item = self.policy.require(id).await?;
        let views = item.view_count + 1;
        self.policy
            .patch(id, touched([("viewCount", json!(views))]))
            .await?;
        Ok(views)
    }

    pub fn observe_available(&self) -> BoxStream<'static, Result<Vec<Item>, SyncError>> {
        self.policy.observe(Self::available_query())
    }
}

/// Fills in each item's distance in kilometres from `from`.
pub fn annotate_distance(items: &mut [Item], from: &Location) {
    for item in items {
        item.distance = item.location.as_ref().map(|loc| from.distance_km(loc));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{LocalCache, MemoryCache};
    use std::sync::Arc;

    fn repo() -> ItemRepository {
        let cache: Arc<dyn LocalCache<Item>> = Arc::new(MemoryCache::<Item>::new());
        ItemRepository::new(SyncPolicy::new(cache))
    }

    #[tokio::test]
    async fn test_list_available_newest_first() {
        let repo = repo();
        let mut old = Item::new("Old", "u1");
        old.created_at = 1;
        let mut new = Item::new("New", "u1");
        new.created_at = 2;
        let mut gone = Item::new("Gone", "u1");
        gone.created_at = 3;
        gone.is_available = false;
        for item in [old, new, gone] {
            repo.save(item).await.unwrap();
        }

        let names: Vec<String> = repo
            .list_available(None)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["New", "Old"]);
        assert_eq!(repo.list_available(Some(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_search_matches_text_and_category() {
        let repo = repo();
        repo.save(
            Item::new("Mountain bike", "u1")
                .with_category(ItemCategory::Sports)
                .with_description("21 gears"),
        )
        .await
        .unwrap();
        repo.save(Item::new("Bike lock", "u2").with_category(ItemCategory::Other))
            .await
            .unwrap();
        repo.save(Item::new("Sofa", "u2").with_desired_trades(vec!["bike".into()]))
            .await
            .unwrap();

        assert_eq!(repo.search("BIKE", None).await.unwrap().len(), 3);
        let sports = repo
            .search("bike", Some(ItemCategory::Sports))
            .await
            .unwrap();
        assert_eq!(sports.len(), 1);
        assert_eq!(sports[0].name, "Mountain bike");
    }

    #[tokio::test]
    async fn test_list_nearby_sorts_by_distance() {
        let repo = repo();
        let stockholm = Location::new(59.3293, 18.0686, "Stockholm");
        repo.save(
            Item::new("Far", "u1").with_location(Location::new(57.7089, 11.9746, "Gothenburg")),
        )
        .await
        .unwrap();
        repo.save(
            Item::new("Near", "u1").with_location(Location::new(59.3326, 18.0649, "Centralen")),
        )
        .await
        .unwrap();
        repo.save(Item::new("Nowhere", "u1")).await.unwrap();

        let nearby = repo.list_nearby(&stockholm, 10.0).await.unwrap();
        assert_eq!(nearby.len(), 1);
        assert_eq!(nearby[0].name, "Near");
        assert!(nearby[0].distance.unwrap() < 1.0);

        let wide = repo.list_nearby(&stockholm, 1000.0).await.unwrap();
        let names: Vec<&str> = wide.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Near", "Far"]);
    }

    #[tokio::test]
    async fn test_increment_view_count() {
        let repo = repo();
        let item = repo.save(Item::new("Lamp", "u1")).await.unwrap();

        assert_eq!(repo.increment_view_count(&item.id).await.unwrap(), 1);
        assert_eq!(repo.increment_view_count(&item.id).await.unwrap(), 2);
        assert_eq!(repo.get(&item.id).await.unwrap().unwrap().view_count, 2);

        assert!(matches!(
            repo.increment_view_count("item_missing").await,
            Err(SyncError::NotFound { .. })
        ));
    }
}
