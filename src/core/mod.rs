//! Domain model and business rules

pub mod account;
pub mod auth;
pub mod clock;
pub mod config;
pub mod ledger;
pub mod log;
pub mod market;
pub mod portfolio;
pub mod service;
pub mod store;

// Re-export main types for cleaner imports
pub use account::{Investment, InvestmentId, InvestmentStatus, User, UserId};
pub use ledger::{Ledger, LedgerError};
pub use market::{Coin, FetchError, MarketDataProvider, MarketFeed};
pub use service::{AccountService, ServiceError};
pub use store::{SeedSource, StoreError, UserStore};
