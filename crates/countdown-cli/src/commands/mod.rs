pub mod config;
pub mod history;
pub mod run;
pub mod shortcuts;

use countdown_core::{ConfigurationStore, KeyValueStore, MemoryStore, SqliteStore};

/// History store on the SQLite database, or an in-memory one if the
/// database cannot be opened. History is a convenience; it never blocks a
/// countdown.
pub fn open_store() -> ConfigurationStore<Box<dyn KeyValueStore>> {
    let backend: Box<dyn KeyValueStore> = match SqliteStore::open() {
        Ok(db) => Box::new(db),
        Err(e) => {
            tracing::warn!("history disabled for this run: {e}");
            Box::new(MemoryStore::new())
        }
    };
    ConfigurationStore::new(backend)
}
