//! Inter-task communication queues
//!
//! Each hand-off between pipeline stages is a bounded Embassy channel paired
//! with a guard mutex. Every enqueue and dequeue happens with the guard held,
//! on top of the channel's own locking. Publishing is best-effort: a full
//! queue or a guard that cannot be taken in time drops the item.

use core::fmt;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::mutex::Mutex;
use embassy_time::{with_timeout, Duration};

use crate::config::QUEUE_CAPACITY;
use crate::types::{CommandCode, KeyEvent};

/// Queue from the keypad scanner to the translator
pub type KeyQueue<M> = GuardedQueue<M, KeyEvent, QUEUE_CAPACITY>;

/// Queue from the translator to the serial transmitter
pub type TransferQueue<M> = GuardedQueue<M, CommandCode, QUEUE_CAPACITY>;

/// How long a publisher waits for the queue guard
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LockWait {
    /// Give up after the given time
    Bounded(Duration),
    /// Wait until the guard is free
    Forever,
}

/// Reason an item was not enqueued
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PublishError {
    /// No free slot when the publish was attempted
    Full,
    /// The guard was not acquired within the bounded wait
    LockTimeout,
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishError::Full => f.write_str("queue full"),
            PublishError::LockTimeout => f.write_str("queue guard timed out"),
        }
    }
}

/// Bounded single-producer single-consumer FIFO with a guard lock
pub struct GuardedQueue<M: RawMutex, T, const N: usize> {
    items: Channel<M, T, N>,
    guard: Mutex<M, ()>,
}

impl<M: RawMutex, T, const N: usize> GuardedQueue<M, T, N> {
    pub const fn new() -> Self {
        Self {
            items: Channel::new(),
            guard: Mutex::new(()),
        }
    }

    /// Enqueue `item` if there is room and the guard can be taken.
    ///
    /// Never blocks on a full queue. The guard is released on every path,
    /// including a failed enqueue.
    pub async fn publish(&self, item: T, wait: LockWait) -> Result<(), PublishError> {
        if self.items.free_capacity() == 0 {
            trace!("publish dropped: queue full");
            return Err(PublishError::Full);
        }

        let _guard = match wait {
            LockWait::Forever => self.guard.lock().await,
            LockWait::Bounded(timeout) => match with_timeout(timeout, self.guard.lock()).await {
                Ok(guard) => guard,
                Err(_) => {
                    trace!("publish dropped: guard timeout");
                    return Err(PublishError::LockTimeout);
                }
            },
        };

        self.items.try_send(item).map_err(|_| PublishError::Full)
    }

    /// Dequeue the oldest item, or `None` when nothing is pending.
    ///
    /// Once an item is known to be pending this waits for the guard and the
    /// item without a timeout.
    pub async fn consume(&self) -> Option<T> {
        if self.items.is_empty() {
            return None;
        }

        let _guard = self.guard.lock().await;
        Some(self.items.receive().await)
    }

    /// Number of pending items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.is_full()
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<M: RawMutex, T, const N: usize> Default for GuardedQueue<M, T, N> {
    fn default() -> Self {
        Self::new()
    }
}
