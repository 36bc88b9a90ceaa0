use crate::models::User;
use crate::query::EntityQuery;
use crate::sync::{SyncError, SyncPolicy};

#[derive(Clone)]
pub struct UserRepository {
    policy: SyncPolicy<User>,
}

impl UserRepository {
    pub fn new(policy: SyncPolicy<User>) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SyncPolicy<User> {
        &self.policy
    }

    pub async fn get(&self, id: &str) -> Result<Option<User>, SyncError> {
        self.policy.get(id).await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, SyncError> {
        let query = EntityQuery::all().where_eq("email", email).limit(1);
        Ok(self.policy.list(&query).await?.into_iter().next())
    }

    pub async fn save(&self, user: User) -> Result<User, SyncError> {
        Ok(self.policy.save(user).await?.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{LocalCache, MemoryCache};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_find_by_email() {
        let cache: Arc<dyn LocalCache<User>> = Arc::new(MemoryCache::<User>::new());
        let repo = UserRepository::new(SyncPolicy::new(cache));
        let ada = repo.save(User::new("Ada", "ada@example.com")).await.unwrap();
        repo.save(User::new("Bob", "bob@example.com")).await.unwrap();

        let found = repo.find_by_email("ada@example.com").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(ada.id));
        assert!(repo.find_by_email("eve@example.com").await.unwrap().is_none());
    }
}
