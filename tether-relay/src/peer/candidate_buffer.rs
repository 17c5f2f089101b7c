use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tether_core::IceCandidate;
use tokio::sync::Mutex;

/// Local candidates discovered but not yet sent.
///
/// Discovery callbacks push, the relay drains. A drain swaps the whole
/// vector out under the lock, so a push racing with it lands in the next
/// drain instead of being lost. Once closed, pushes are discarded.
#[derive(Clone, Default)]
pub struct CandidateBuffer {
    inner: Arc<Mutex<Vec<IceCandidate>>>,
    closed: Arc<AtomicBool>,
}

impl CandidateBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, candidate: IceCandidate) {
        let mut inner = self.inner.lock().await;
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        inner.push(candidate);
    }

    /// Stop collecting and drop anything not yet drained.
    pub async fn close(&self) {
        let mut inner = self.inner.lock().await;
        self.closed.store(true, Ordering::SeqCst);
        inner.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub async fn drain(&self) -> Vec<IceCandidate> {
        std::mem::take(&mut *self.inner.lock().await)
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}
