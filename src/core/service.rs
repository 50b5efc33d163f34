//! Runs account actions for the signed-in user: load the record, apply a
//! ledger operation and write the collection back.

use crate::core::account::{InvestmentId, User, UserId};
use crate::core::auth::{self, AuthError, SignupRequest};
use crate::core::clock::{Clock, SystemClock};
use crate::core::ledger::{Ledger, LedgerError};
use crate::core::store::{self, SeedSource, StoreError, UserStore};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("You must be logged in to do this.")]
    NotLoggedIn,

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct AccountService<C: Clock = SystemClock> {
    store: Arc<dyn UserStore>,
    ledger: Ledger<C>,
    locks: Mutex<HashMap<UserId, Arc<tokio::sync::Mutex<()>>>>,
}

impl AccountService<SystemClock> {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self::with_ledger(store, Ledger::new())
    }
}

impl<C: Clock> AccountService<C> {
    pub fn with_ledger(store: Arc<dyn UserStore>, ledger: Ledger<C>) -> Self {
        Self {
            store,
            ledger,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn ledger(&self) -> &Ledger<C> {
        &self.ledger
    }

    fn user_lock(&self, id: UserId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(id).or_default().clone()
    }

    /// Merges the seed document into the stored users. Run once when a
    /// session starts.
    pub async fn start_session(&self, seed: &dyn SeedSource) -> Result<Vec<User>, ServiceError> {
        Ok(store::load_users_with_seed(seed, self.store.as_ref()).await?)
    }

    pub async fn signup(
        &self,
        seed: &dyn SeedSource,
        request: &SignupRequest,
    ) -> Result<User, ServiceError> {
        let mut users = self.start_session(seed).await?;
        let user = auth::signup(&users, request)?;
        users.push(user.clone());
        self.store.save_all_users(&users).await?;
        self.store.save_session(&user).await?;
        info!(user = %user.id, "Signed up");
        Ok(user)
    }

    pub async fn login(
        &self,
        seed: &dyn SeedSource,
        email: &str,
        password: &str,
    ) -> Result<User, ServiceError> {
        let users = self.start_session(seed).await?;
        let user = auth::login(&users, email, password)?.clone();
        self.store.save_session(&user).await?;
        info!(user = %user.id, "Logged in");
        Ok(user)
    }

    pub async fn logout(&self) -> Result<(), ServiceError> {
        self.store.clear_session().await?;
        info!("Logged out");
        Ok(())
    }

    pub async fn current_user(&self) -> Result<User, ServiceError> {
        self.store
            .load_session()
            .await?
            .ok_or(ServiceError::NotLoggedIn)
    }

    pub async fn top_up(&self, amount: Decimal) -> Result<User, ServiceError> {
        self.update_current_user(|ledger, user| ledger.top_up(user, amount))
            .await
    }

    pub async fn open_investment(
        &self,
        coin_name: &str,
        amount: Decimal,
        duration_days: u32,
    ) -> Result<User, ServiceError> {
        self.update_current_user(|ledger, user| {
            ledger.open_investment(user, coin_name, amount, duration_days)
        })
        .await
    }

    pub async fn withdraw(&self, investment_id: InvestmentId) -> Result<User, ServiceError> {
        self.update_current_user(|ledger, user| ledger.withdraw(user, investment_id))
            .await
    }

    /// Drops the map entry once no other action holds or waits on the lock.
    fn release_user_lock(&self, id: UserId, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        let idle = locks
            .get(&id)
            .is_some_and(|entry| Arc::ptr_eq(entry, &lock) && Arc::strong_count(&lock) == 2);
        if idle {
            locks.remove(&id);
        }
    }

    /// Load, apply and persist under the user's lock so that concurrent
    /// actions for the same user cannot lose updates.
    async fn update_current_user<F>(&self, op: F) -> Result<User, ServiceError>
    where
        F: FnOnce(&Ledger<C>, &User) -> Result<User, LedgerError>,
    {
        let id = self
            .store
            .load_session_id()
            .await?
            .ok_or(ServiceError::NotLoggedIn)?;
        let lock = self.user_lock(id);
        let result = {
            let _guard = lock.lock().await;
            self.apply_to_user(id, op).await
        };
        self.release_user_lock(id, lock);
        result
    }

    async fn apply_to_user<F>(&self, id: UserId, op: F) -> Result<User, ServiceError>
    where
        F: FnOnce(&Ledger<C>, &User) -> Result<User, LedgerError>,
    {
        let mut users = self.store.load_all_users().await?;
        let slot = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(ServiceError::NotLoggedIn)?;

        let updated = op(&self.ledger, slot)?;
        *slot = updated.clone();
        self.store.save_all_users(&users).await?;
        debug!(user = %id, "User record updated");
        Ok(updated)
    }
}
