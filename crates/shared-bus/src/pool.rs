//! # Message Pool
//!
//! A lazily growing pool of reusable outbound buffers.
//!
//! ```text
//!   acquire()                          release(envelope)
//!      │                                      │
//!      ▼                                      ▼
//!  ┌─────────┐  empty? grow by batch   ┌──────────────┐
//!  │  free   │ ◄────────────────────── │ pool id match│──► ForeignEnvelope
//!  └─────────┘                         └──────────────┘
//! ```
//!
//! The pool never blocks and has no upper bound; growth happens one batch
//! at a time. Each envelope remembers which pool minted it, so returning it
//! to a different pool is rejected instead of silently mixing pools.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

use feed_telemetry::metrics::POOL_ENVELOPES_ALLOCATED;

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

/// Errors from pool operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// A pool must grow by at least one envelope.
    #[error("Message pool batch size must be positive")]
    EmptyBatch,

    /// The envelope was minted by a different pool.
    #[error("Message pool error: envelope from pool {found} returned to pool {expected}")]
    ForeignEnvelope { expected: u64, found: u64 },
}

/// A buffer that can be emptied for reuse.
pub trait Recycle: Default + Send {
    /// Clear the contents, keeping allocated capacity where possible.
    fn recycle(&mut self);
}

impl Recycle for Vec<u8> {
    fn recycle(&mut self) {
        self.clear();
    }
}

/// A pooled buffer on loan to a caller.
#[derive(Debug)]
pub struct Envelope<T> {
    pool_id: u64,
    body: T,
}

impl<T> Envelope<T> {
    /// Id of the pool that minted this envelope.
    #[must_use]
    pub fn pool_id(&self) -> u64 {
        self.pool_id
    }
}

impl<T> Deref for Envelope<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.body
    }
}

impl<T> DerefMut for Envelope<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.body
    }
}

struct PoolState<T> {
    free: Vec<T>,
    allocated: usize,
}

/// Pool of reusable envelopes growing by a fixed batch.
pub struct MessagePool<T: Recycle> {
    id: u64,
    name: &'static str,
    batch_size: usize,
    state: Mutex<PoolState<T>>,
}

impl<T: Recycle> MessagePool<T> {
    /// Create a pool pre-filled with one batch.
    ///
    /// # Errors
    ///
    /// `PoolError::EmptyBatch` if `batch_size` is zero.
    pub fn new(name: &'static str, batch_size: usize) -> Result<Self, PoolError> {
        if batch_size == 0 {
            return Err(PoolError::EmptyBatch);
        }

        let pool = Self {
            id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
            name,
            batch_size,
            state: Mutex::new(PoolState {
                free: Vec::with_capacity(batch_size),
                allocated: 0,
            }),
        };
        pool.grow(&mut pool.state.lock());
        Ok(pool)
    }

    /// Take an empty envelope, growing the pool if none is free.
    pub fn acquire(&self) -> Envelope<T> {
        let mut state = self.state.lock();
        if state.free.is_empty() {
            self.grow(&mut state);
        }
        let mut body = state.free.pop().unwrap_or_default();
        body.recycle();

        Envelope {
            pool_id: self.id,
            body,
        }
    }

    /// Return an envelope to the pool.
    ///
    /// # Errors
    ///
    /// `PoolError::ForeignEnvelope` if the envelope belongs to another pool;
    /// the envelope is dropped in that case.
    pub fn release(&self, envelope: Envelope<T>) -> Result<(), PoolError> {
        if envelope.pool_id != self.id {
            return Err(PoolError::ForeignEnvelope {
                expected: self.id,
                found: envelope.pool_id,
            });
        }
        self.state.lock().free.push(envelope.body);
        Ok(())
    }

    /// Envelopes created so far.
    #[must_use]
    pub fn allocated(&self) -> usize {
        self.state.lock().allocated
    }

    /// Envelopes currently free.
    #[must_use]
    pub fn available(&self) -> usize {
        self.state.lock().free.len()
    }

    /// Id stamped on every envelope of this pool.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    fn grow(&self, state: &mut PoolState<T>) {
        state
            .free
            .extend(std::iter::repeat_with(T::default).take(self.batch_size));
        state.allocated += self.batch_size;

        POOL_ENVELOPES_ALLOCATED
            .with_label_values(&[self.name])
            .inc_by(self.batch_size as u64);
        debug!(
            pool = self.name,
            allocated = state.allocated,
            "Message pool grown"
        );
    }
}
