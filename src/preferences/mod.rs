//! User preference persistence.
//!
//! - [`UserPreferences`]: every tracked setting, including the last chosen value
//!   of each filter facet
//! - [`PreferenceStore`]: probes its backend, saves, loads (with schema
//!   migration) and clears the preference record
//! - [`StorageBackend`]: the key/value seam, implemented by [`FileStorage`] for
//!   durable storage and [`MemoryStorage`] for session-only storage
//!
//! A failing backend never breaks the session: loads fall back to defaults and
//! saves are skipped, while the caller's in-memory copy stays authoritative.

mod preference_store;
mod storage;
mod user_preferences;

#[cfg(test)]
pub use crate::preferences::preference_store::STORAGE_KEY;
pub use crate::preferences::preference_store::{LoadOutcome, PreferenceStore};
#[cfg(test)]
pub use crate::preferences::storage::{MockStorageBackend, StorageError};
pub use crate::preferences::storage::{FileStorage, MemoryStorage, StorageBackend};
pub use crate::preferences::user_preferences::{FontSize, Theme, UserPreferences};
