use crate::core::account::{User, UserId};
use crate::core::store::{StoreError, UserStore};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Default)]
struct State {
    users: Vec<User>,
    session: Option<UserId>,
}

/// In-memory user store. Nothing survives the process.
#[derive(Clone, Default)]
pub struct MemoryUserStore {
    inner: Arc<Mutex<State>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn load_all_users(&self) -> Result<Vec<User>, StoreError> {
        let state = self.inner.lock().await;
        debug!(count = state.users.len(), "Store GET users");
        Ok(state.users.clone())
    }

    async fn save_all_users(&self, users: &[User]) -> Result<(), StoreError> {
        let mut state = self.inner.lock().await;
        debug!(count = users.len(), "Store PUT users");
        state.users = users.to_vec();
        Ok(())
    }

    async fn load_session_id(&self) -> Result<Option<UserId>, StoreError> {
        Ok(self.inner.lock().await.session)
    }

    async fn save_session(&self, user: &User) -> Result<(), StoreError> {
        let mut state = self.inner.lock().await;
        debug!(user = %user.id, "Store PUT session");
        state.session = Some(user.id);
        Ok(())
    }

    async fn clear_session(&self) -> Result<(), StoreError> {
        let mut state = self.inner.lock().await;
        debug!("Store CLEAR session");
        state.session = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryUserStore::new();
        assert!(store.load_all_users().await.unwrap().is_empty());

        store.save_all_users(&[User::demo()]).await.unwrap();
        assert_eq!(store.load_all_users().await.unwrap(), vec![User::demo()]);

        // Clones share state
        let other = store.clone();
        other.save_session(&User::demo()).await.unwrap();
        assert_eq!(store.load_session_id().await.unwrap(), Some(UserId(1)));
    }
}
