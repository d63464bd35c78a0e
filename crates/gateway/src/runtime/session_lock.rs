//! Per-conversation linearization.
//!
//! Only one `invoke`/`resume` runs per conversation at a time. A second
//! call for the same id waits until the first returns.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use wh_domain::error::{Error, Result};

/// Each conversation id maps to a `Semaphore(1)`. Holding the permit grants
/// exclusive access to that conversation's history and pending approval.
#[derive(Default)]
pub struct ConversationLocks {
    locks: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl ConversationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to a conversation. The permit releases on
    /// drop.
    pub async fn acquire(&self, conversation_id: &str) -> Result<OwnedSemaphorePermit> {
        let sem = {
            let mut locks = self.locks.lock();
            locks
                .entry(conversation_id.to_owned())
                .or_insert_with(|| Arc::new(Semaphore::new(1)))
                .clone()
        };

        if let Ok(permit) = sem.clone().try_acquire_owned() {
            return Ok(permit);
        }

        tracing::debug!(conversation_id, "conversation busy, waiting");
        sem.acquire_owned()
            .await
            .map_err(|_| Error::Other(format!("lock for conversation {conversation_id} closed")))
    }

    /// Drop locks nobody holds or waits on. A lock is only shared while a
    /// caller keeps a clone of its semaphore, so an entry whose map slot is
    /// the last reference is idle. Returns the number removed.
    pub fn prune_idle(&self) -> usize {
        let mut locks = self.locks.lock();
        let before = locks.len();
        locks.retain(|_, sem| Arc::strong_count(sem) > 1);
        before - locks.len()
    }

    /// Number of tracked conversations.
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
