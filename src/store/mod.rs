//! Result persistence
//!
//! Append-only, per-user histories of [`SessionResult`]s. Stores are the
//! only I/O boundary of the engine and are therefore async.
//!
//! Both implementations give the same guarantees: appends for different
//! users never contend with each other, appends for the same user are
//! serialized so none is lost, and listing an unknown user yields an
//! empty history rather than an error.

pub mod file;
pub mod memory;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::session::{SessionResult, UserId};

pub use file::JsonFileResultStore;
pub use memory::MemoryResultStore;

/// Persists and retrieves session results keyed by user.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Adds `result` to the end of `user`'s history.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot record the result. Existing
    /// entries are never modified, even on failure.
    async fn append(&self, user: &UserId, result: SessionResult) -> Result<(), StoreError>;

    /// Returns `user`'s full history, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read. A user with no
    /// history gets `Ok(vec![])`.
    async fn list(&self, user: &UserId) -> Result<Vec<SessionResult>, StoreError>;
}
