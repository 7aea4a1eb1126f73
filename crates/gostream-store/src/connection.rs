//! Shared handle to a document store.

use std::fmt;
use std::sync::Arc;

use crate::backend::DocumentBackend;
use crate::error::StoreError;
use crate::memory::InMemoryBackend;
use crate::mongo::{MongoBackend, MongoConfig};

/// Cheaply cloneable handle shared by every collection and request task.
///
/// Owns the backend; collections borrow it through clones of this handle.
#[derive(Clone)]
pub struct Connection {
    backend: Arc<dyn DocumentBackend>,
}

impl Connection {
    /// Connect to `MongoDB` and verify the deployment is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if the URI cannot be parsed.
    /// Returns [`StoreError::Connection`] if the handshake fails.
    pub async fn connect(config: &MongoConfig) -> Result<Self, StoreError> {
        let backend = MongoBackend::connect(config).await?;
        Ok(Self::from_backend(Arc::new(backend)))
    }

    /// A handle over a fresh in-process store.
    pub fn in_memory() -> Self {
        tracing::debug!("Using in-memory document store");
        Self::from_backend(Arc::new(InMemoryBackend::new()))
    }

    /// Wrap an existing backend.
    pub fn from_backend(backend: Arc<dyn DocumentBackend>) -> Self {
        Self { backend }
    }

    /// The backend every operation goes through.
    pub fn backend(&self) -> &dyn DocumentBackend {
        self.backend.as_ref()
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection").finish_non_exhaustive()
    }
}
