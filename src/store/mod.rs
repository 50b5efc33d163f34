pub mod disk;
pub mod memory;

use crate::core::config::AppConfig;
use crate::core::store::UserStore;
use anyhow::{Context, Result};
use disk::FjallUserStore;
use std::sync::Arc;

/// Opens the on-disk keyspace under the configured data directory.
pub fn open_user_store(config: &AppConfig) -> Result<Arc<dyn UserStore>> {
    let path = config.default_data_path()?.join("store");
    let store = FjallUserStore::open(&path)
        .with_context(|| format!("Failed to open user store at {}", path.display()))?;
    Ok(Arc::new(store))
}
