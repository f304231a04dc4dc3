//! # Store Pool
//!
//! Bounded, request-scoped access to the shared session.
//!
//! Every request takes one permit and one lock guard, does its work and
//! drops both. A request that cannot get both within the configured
//! timeout fails with a `DatabaseError` on operation `acquire_store`.

use rational_onion_core::{OnionError, Session};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{
    OwnedRwLockReadGuard, OwnedRwLockWriteGuard, OwnedSemaphorePermit, RwLock, Semaphore,
};

/// Operation name reported when the pool cannot hand out a store.
pub const ACQUIRE_OPERATION: &str = "acquire_store";

/// Bounded pool over a single shared session.
#[derive(Debug, Clone)]
pub struct StorePool {
    session: Arc<RwLock<Session>>,
    permits: Arc<Semaphore>,
    size: usize,
    timeout: Duration,
}

/// Shared access to the session for one request.
pub struct ReadHandle {
    guard: OwnedRwLockReadGuard<Session>,
    _permit: OwnedSemaphorePermit,
}

/// Exclusive access to the session for one request.
pub struct WriteHandle {
    guard: OwnedRwLockWriteGuard<Session>,
    _permit: OwnedSemaphorePermit,
}

impl StorePool {
    /// Create a pool allowing `size` concurrent users.
    #[must_use]
    pub fn new(session: Session, size: usize, timeout: Duration) -> Self {
        let size = size.max(1);
        Self {
            session: Arc::new(RwLock::new(session)),
            permits: Arc::new(Semaphore::new(size)),
            size,
            timeout,
        }
    }

    /// Maximum number of concurrent users.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of permits not currently handed out.
    #[must_use]
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Acquire shared access for a read-only operation.
    pub async fn read(&self) -> Result<ReadHandle, OnionError> {
        let acquire = async {
            let permit = self.permit().await?;
            let guard = Arc::clone(&self.session).read_owned().await;
            Ok(ReadHandle {
                guard,
                _permit: permit,
            })
        };
        self.bounded(acquire).await
    }

    /// Acquire exclusive access for a mutating operation.
    pub async fn write(&self) -> Result<WriteHandle, OnionError> {
        let acquire = async {
            let permit = self.permit().await?;
            let guard = Arc::clone(&self.session).write_owned().await;
            Ok(WriteHandle {
                guard,
                _permit: permit,
            })
        };
        self.bounded(acquire).await
    }

    async fn permit(&self) -> Result<OwnedSemaphorePermit, OnionError> {
        Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|e| OnionError::database(ACQUIRE_OPERATION, e.to_string()))
    }

    async fn bounded<T>(
        &self,
        acquire: impl Future<Output = Result<T, OnionError>>,
    ) -> Result<T, OnionError> {
        match tokio::time::timeout(self.timeout, acquire).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    event = "pool_timeout",
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Store pool acquire timed out"
                );
                Err(OnionError::database(
                    ACQUIRE_OPERATION,
                    format!("timed out after {} ms", self.timeout.as_millis()),
                ))
            }
        }
    }
}

impl Deref for ReadHandle {
    type Target = Session;

    fn deref(&self) -> &Session {
        &self.guard
    }
}

impl Deref for WriteHandle {
    type Target = Session;

    fn deref(&self) -> &Session {
        &self.guard
    }
}

impl DerefMut for WriteHandle {
    fn deref_mut(&mut self) -> &mut Session {
        &mut self.guard
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use rational_onion_core::{ArgumentDraft, ErrorKind};

    fn pool(size: usize, timeout_ms: u64) -> StorePool {
        StorePool::new(Session::new(), size, Duration::from_millis(timeout_ms))
    }

    #[tokio::test]
    async fn permits_are_returned_on_drop() {
        let pool = pool(2, 100);
        {
            let _a = pool.read().await.expect("read");
            let _b = pool.read().await.expect("read");
            assert_eq!(pool.available(), 0);
        }
        assert_eq!(pool.available(), 2);
    }

    #[tokio::test]
    async fn exhausted_pool_times_out() {
        let pool = pool(1, 20);
        let _held = pool.read().await.expect("read");

        let err = pool.read().await.err().expect("timeout");
        assert_eq!(err.kind(), ErrorKind::DatabaseError);
        assert_eq!(
            err.details().get("operation").map(String::as_str),
            Some(ACQUIRE_OPERATION)
        );
    }

    #[tokio::test]
    async fn writer_waits_for_readers() {
        let pool = pool(4, 20);
        let _reader = pool.read().await.expect("read");

        assert!(pool.write().await.is_err());
    }

    #[tokio::test]
    async fn writes_are_visible_to_later_reads() {
        let pool = pool(2, 100);
        pool.write()
            .await
            .expect("write")
            .insert_argument(&ArgumentDraft::new("Main", "G1", "W1"))
            .expect("insert");

        let count = pool.read().await.expect("read").node_count().expect("count");
        assert_eq!(count, 3);
    }

    #[test]
    fn zero_size_is_clamped() {
        assert_eq!(pool(0, 10).size(), 1);
    }
}
