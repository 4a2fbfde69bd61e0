//! Key-value persistence for UI preferences.
//!
//! The state managers only need a synchronous string store. Reads and writes are
//! best-effort: every caller logs failures and carries on with a default.

pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use crate::model::StorageError;
use std::sync::Arc;

/// Synchronous string key-value store.
pub trait KeyValueStore: Send + Sync {
    /// Read a value. `Ok(None)` when the key was never written.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a key. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Shared handle to a store, injected into the managers.
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Storage key for a panel's persisted width.
pub fn panel_width_key(panel_id: &str) -> String {
    format!("panel-{panel_id}-width")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_width_key_follows_pattern() {
        assert_eq!(panel_width_key("payment"), "panel-payment-width");
    }
}
