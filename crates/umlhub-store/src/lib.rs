//! Persistence for umlhub.
//!
//! Two independent services hold indexed diagrams:
//!
//! - [`DiagramStore`]: the primary record store (insert, point lookups,
//!   paginated listing, deletion by origin)
//! - [`SearchIndex`]: a full-text index over block text, keyed by record id
//!
//! There is no referential link between them. The indexer writes the store
//! first and mirrors into the index second, and deletion only removes index
//! entries best-effort, so readers must tolerate ids that the store no longer
//! (or never) holds.
//!
//! # Backends
//!
//! - [`MemoryStore`] / [`MemorySearchIndex`]: in-process, `RwLock`-guarded
//! - [`SqliteDatabase`] (feature `sqlite`, default): sqlx `SQLite` pool backing
//!   [`SqliteStore`] and an FTS5-based [`SqliteSearchIndex`]

mod error;
mod memory;
#[cfg(feature = "sqlite")]
mod sqlite;
mod store;

pub use error::{ErrorStatus, StoreError, StoreErrorKind};
pub use memory::{MemorySearchIndex, MemoryStore};
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteDatabase, SqliteSearchIndex, SqliteStore};
pub use store::{DiagramStore, Page, SearchIndex, search_terms};
