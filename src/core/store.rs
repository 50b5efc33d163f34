//! Persistence contract for user records and the seed merge rules.

use crate::core::account::{User, UserId};
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Stored data is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Durable user collection plus a pointer to the signed-in user.
///
/// The session only remembers which user is signed in; the record itself is
/// always read from the collection, so there is a single copy to keep in sync.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn load_all_users(&self) -> Result<Vec<User>, StoreError>;

    /// Replaces the whole collection.
    async fn save_all_users(&self, users: &[User]) -> Result<(), StoreError>;

    async fn load_session_id(&self) -> Result<Option<UserId>, StoreError>;

    async fn save_session(&self, user: &User) -> Result<(), StoreError>;

    async fn clear_session(&self) -> Result<(), StoreError>;

    /// The signed-in user, or `None` when nobody is signed in or the session
    /// points at a user that no longer exists.
    async fn load_session(&self) -> Result<Option<User>, StoreError> {
        let Some(id) = self.load_session_id().await? else {
            return Ok(None);
        };
        let user = self.load_all_users().await?.into_iter().find(|u| u.id == id);
        if user.is_none() {
            debug!(user = %id, "Session refers to an unknown user");
        }
        Ok(user)
    }
}

/// The document shipped with the application, `{ "users": [...] }`.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedDocument {
    pub users: Vec<User>,
}

#[async_trait]
pub trait SeedSource: Send + Sync {
    async fn load_seed(&self) -> Result<SeedDocument>;
}

/// Seed users first, in seed order, followed by stored users whose id does
/// not appear in the seed. The seed record wins on an id collision.
pub fn merge_users(seed: Vec<User>, stored: Vec<User>) -> Vec<User> {
    let seed_ids: HashSet<UserId> = seed.iter().map(|u| u.id).collect();
    let mut merged = seed;
    merged.extend(stored.into_iter().filter(|u| !seed_ids.contains(&u.id)));
    merged
}

/// Loads the user collection at the start of a session.
///
/// When the seed cannot be read the stored collection is used as is, and if
/// that is empty too the demo account is stored and returned.
pub async fn load_users_with_seed(
    seed: &dyn SeedSource,
    store: &dyn UserStore,
) -> Result<Vec<User>, StoreError> {
    let stored = store.load_all_users().await?;

    match seed.load_seed().await {
        Ok(document) => {
            let merged = merge_users(document.users, stored);
            store.save_all_users(&merged).await?;
            debug!(count = merged.len(), "Merged seed users with stored users");
            Ok(merged)
        }
        Err(e) => {
            warn!(error = %e, "Failed to load seed data, using stored users");
            if !stored.is_empty() {
                return Ok(stored);
            }
            let defaults = vec![User::demo()];
            store.save_all_users(&defaults).await?;
            warn!("No stored users found, created demo account");
            Ok(defaults)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryUserStore;
    use anyhow::anyhow;
    use rust_decimal_macros::dec;

    struct StaticSeed(Vec<User>);

    #[async_trait]
    impl SeedSource for StaticSeed {
        async fn load_seed(&self) -> Result<SeedDocument> {
            Ok(SeedDocument {
                users: self.0.clone(),
            })
        }
    }

    struct UnreachableSeed;

    #[async_trait]
    impl SeedSource for UnreachableSeed {
        async fn load_seed(&self) -> Result<SeedDocument> {
            Err(anyhow!("Network response was not ok."))
        }
    }

    fn user(id: u64, name: &str) -> User {
        User::new(UserId(id), name, &format!("{}@example.com", name.to_lowercase()))
    }

    #[test]
    fn test_merge_seed_wins_on_collision() {
        let seed = vec![user(1, "Seed")];
        let mut local_one = user(1, "Local");
        local_one.total_account_balance = dec!(999);
        let stored = vec![local_one, user(2, "Other")];

        let merged = merge_users(seed, stored);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].id, UserId(1));
        assert_eq!(merged[0].full_name, "Seed");
        assert_eq!(merged[0].total_account_balance, dec!(0));
        assert_eq!(merged[1].id, UserId(2));
        assert_eq!(merged[1].full_name, "Other");
    }

    #[test]
    fn test_merge_with_empty_inputs() {
        assert!(merge_users(Vec::new(), Vec::new()).is_empty());
        assert_eq!(merge_users(Vec::new(), vec![user(5, "Only")]).len(), 1);
        assert_eq!(merge_users(vec![user(5, "Only")], Vec::new()).len(), 1);
    }

    #[tokio::test]
    async fn test_seed_merge_is_written_back() {
        let store = MemoryUserStore::new();
        store
            .save_all_users(&[user(1, "Local"), user(2, "Other")])
            .await
            .unwrap();

        let users = load_users_with_seed(&StaticSeed(vec![user(1, "Seed")]), &store)
            .await
            .unwrap();

        assert_eq!(users.len(), 2);
        assert_eq!(store.load_all_users().await.unwrap(), users);
    }

    #[tokio::test]
    async fn test_unreachable_seed_falls_back_to_stored() {
        let store = MemoryUserStore::new();
        store.save_all_users(&[user(2, "Other")]).await.unwrap();

        let users = load_users_with_seed(&UnreachableSeed, &store).await.unwrap();

        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, UserId(2));
    }

    #[tokio::test]
    async fn test_unreachable_seed_and_empty_store_creates_demo() {
        let store = MemoryUserStore::new();

        let users = load_users_with_seed(&UnreachableSeed, &store).await.unwrap();

        assert_eq!(users, vec![User::demo()]);
        assert_eq!(store.load_all_users().await.unwrap(), vec![User::demo()]);
    }

    #[tokio::test]
    async fn test_session_resolves_against_collection() {
        let store = MemoryUserStore::new();
        let jane = user(2, "Jane");
        store.save_all_users(&[jane.clone()]).await.unwrap();
        assert!(store.load_session().await.unwrap().is_none());

        store.save_session(&jane).await.unwrap();
        let mut richer = jane.clone();
        richer.total_account_balance = dec!(42);
        store.save_all_users(&[richer.clone()]).await.unwrap();

        // The session sees the latest record, not a stale copy
        assert_eq!(store.load_session().await.unwrap(), Some(richer));

        store.save_all_users(&[]).await.unwrap();
        assert!(store.load_session().await.unwrap().is_none());

        store.clear_session().await.unwrap();
        assert!(store.load_session_id().await.unwrap().is_none());
    }
}
