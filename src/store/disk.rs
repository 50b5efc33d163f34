use crate::core::account::{User, UserId};
use crate::core::store::{StoreError, UserStore};
use async_trait::async_trait;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

const USERS_PARTITION: &str = "users";
const SESSION_PARTITION: &str = "session";
const USERS_KEY: &str = "all";
const SESSION_KEY: &str = "current";

#[derive(Serialize, Deserialize)]
struct SessionEntry {
    user_id: UserId,
}

fn unavailable(e: fjall::Error) -> StoreError {
    StoreError::StorageUnavailable(e.to_string())
}

/// User store backed by a fjall keyspace. The whole collection lives under a
/// single key as a JSON array; the session is a separate partition.
pub struct FjallUserStore {
    keyspace: Keyspace,
    users: PartitionHandle,
    session: PartitionHandle,
}

impl FjallUserStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(path)
            .map_err(|e| StoreError::StorageUnavailable(e.to_string()))?;

        let keyspace = fjall::Config::new(path).open().map_err(unavailable)?;
        let users = keyspace
            .open_partition(USERS_PARTITION, PartitionCreateOptions::default())
            .map_err(unavailable)?;
        let session = keyspace
            .open_partition(SESSION_PARTITION, PartitionCreateOptions::default())
            .map_err(unavailable)?;
        debug!("Opened user store at {}", path.display());

        Ok(Self {
            keyspace,
            users,
            session,
        })
    }

    fn persist(&self) -> Result<(), StoreError> {
        self.keyspace
            .persist(PersistMode::SyncAll)
            .map_err(unavailable)
    }
}

#[async_trait]
impl UserStore for FjallUserStore {
    async fn load_all_users(&self) -> Result<Vec<User>, StoreError> {
        match self.users.get(USERS_KEY).map_err(unavailable)? {
            Some(value) => {
                let users: Vec<User> = serde_json::from_slice(&value)?;
                debug!(count = users.len(), "Store GET users");
                Ok(users)
            }
            None => {
                debug!("Store MISS users");
                Ok(Vec::new())
            }
        }
    }

    async fn save_all_users(&self, users: &[User]) -> Result<(), StoreError> {
        let value = serde_json::to_vec(users)?;
        self.users.insert(USERS_KEY, value).map_err(unavailable)?;
        self.persist()?;
        debug!(count = users.len(), "Store PUT users");
        Ok(())
    }

    async fn load_session_id(&self) -> Result<Option<UserId>, StoreError> {
        let Some(value) = self.session.get(SESSION_KEY).map_err(unavailable)? else {
            return Ok(None);
        };
        let entry: SessionEntry = serde_json::from_slice(&value)?;
        Ok(Some(entry.user_id))
    }

    async fn save_session(&self, user: &User) -> Result<(), StoreError> {
        let value = serde_json::to_vec(&SessionEntry { user_id: user.id })?;
        self.session.insert(SESSION_KEY, value).map_err(unavailable)?;
        self.persist()?;
        debug!(user = %user.id, "Store PUT session");
        Ok(())
    }

    async fn clear_session(&self) -> Result<(), StoreError> {
        self.session.remove(SESSION_KEY).map_err(unavailable)?;
        self.persist()?;
        debug!("Store CLEAR session");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_fjall_store_users_round_trip() {
        let dir = tempdir().unwrap();
        let store = FjallUserStore::open(dir.path()).unwrap();

        // Initially empty
        assert!(store.load_all_users().await.unwrap().is_empty());

        let mut demo = User::demo();
        demo.total_account_balance = dec!(1234.56);
        store.save_all_users(&[demo.clone()]).await.unwrap();

        assert_eq!(store.load_all_users().await.unwrap(), vec![demo]);
    }

    #[tokio::test]
    async fn test_fjall_store_keeps_money_exact() {
        let dir = tempdir().unwrap();
        let store = FjallUserStore::open(dir.path()).unwrap();

        let mut user = User::demo();
        user.total_account_balance = dec!(1234567890.123456789);
        user.investment_balance = dec!(0.30000000000000000001);
        store.save_all_users(&[user.clone()]).await.unwrap();
        store.save_all_users(&store.load_all_users().await.unwrap()).await.unwrap();

        let loaded = store.load_all_users().await.unwrap();
        assert_eq!(loaded, vec![user]);
        assert_eq!(
            loaded[0].total_account_balance.to_string(),
            "1234567890.123456789"
        );

        // Still a plain JSON number, as in the seed document
        let json = serde_json::to_string(&loaded[0]).unwrap();
        assert!(json.contains(r#""total_account_balance":1234567890.123456789"#));
    }

    #[tokio::test]
    async fn test_fjall_store_overwrites_collection() {
        let dir = tempdir().unwrap();
        let store = FjallUserStore::open(dir.path()).unwrap();
        let other = User::new(UserId(2), "Other", "other@example.com");

        store
            .save_all_users(&[User::demo(), other.clone()])
            .await
            .unwrap();
        store.save_all_users(&[other.clone()]).await.unwrap();

        assert_eq!(store.load_all_users().await.unwrap(), vec![other]);
    }

    #[tokio::test]
    async fn test_fjall_store_session() {
        let dir = tempdir().unwrap();
        let store = FjallUserStore::open(dir.path()).unwrap();
        store.save_all_users(&[User::demo()]).await.unwrap();

        assert!(store.load_session().await.unwrap().is_none());

        store.save_session(&User::demo()).await.unwrap();
        assert_eq!(store.load_session_id().await.unwrap(), Some(UserId(1)));
        assert_eq!(store.load_session().await.unwrap(), Some(User::demo()));

        store.clear_session().await.unwrap();
        assert!(store.load_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fjall_store_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = FjallUserStore::open(dir.path()).unwrap();
            store.save_all_users(&[User::demo()]).await.unwrap();
            store.save_session(&User::demo()).await.unwrap();
        }

        let store = FjallUserStore::open(dir.path()).unwrap();
        assert_eq!(store.load_all_users().await.unwrap(), vec![User::demo()]);
        assert_eq!(store.load_session().await.unwrap(), Some(User::demo()));
    }
}
