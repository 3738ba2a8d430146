//! Session persistence.
//!
//! The authentication flow reads and writes sessions through the
//! [`SessionStorage`] trait and never assumes a backend. Sessions are keyed by
//! their id, so a shop has at most one offline session (`offline_{shop}`).
//!
//! [`MemorySessionStorage`] keeps sessions in process memory and is meant for
//! development and tests.
//!
//! # Example Implementation
//!
//! ```ignore
//! use shopify_app::session_storage::{SessionStorage, SessionStorageError};
//! use shopify_app::Session;
//!
//! struct RedisSessionStorage { /* ... */ }
//!
//! #[async_trait::async_trait]
//! impl SessionStorage for RedisSessionStorage {
//!     async fn store_session(&self, session: &Session) -> Result<(), SessionStorageError> {
//!         let json = serde_json::to_string(session)?;
//!         // SET session.id json
//!         Ok(())
//!     }
//!     // ... other methods
//! }
//! ```

mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::Session;
use crate::config::ShopDomain;

pub use memory::MemorySessionStorage;

/// Errors reported by a session storage backend.
#[derive(Debug, Error)]
pub enum SessionStorageError {
    /// A session could not be serialized or deserialized.
    #[error("Failed to serialize session: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backend failed.
    #[error("Session storage backend error: {message}")]
    Backend {
        /// Backend-specific description.
        message: String,
    },
}

/// Storage for authenticated sessions.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Stores a session, replacing any session with the same id.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    async fn store_session(&self, session: &Session) -> Result<(), SessionStorageError>;

    /// Loads a session by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails. A missing session is `Ok(None)`.
    async fn load_session(&self, id: &str) -> Result<Option<Session>, SessionStorageError>;

    /// Deletes a session by id. Deleting a missing session is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    async fn delete_session(&self, id: &str) -> Result<(), SessionStorageError>;

    /// Deletes several sessions by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    async fn delete_sessions(&self, ids: &[String]) -> Result<(), SessionStorageError> {
        for id in ids {
            self.delete_session(id).await?;
        }
        Ok(())
    }

    /// Returns every session stored for `shop`, online and offline.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    async fn find_sessions_by_shop(
        &self,
        shop: &ShopDomain,
    ) -> Result<Vec<Session>, SessionStorageError>;
}
