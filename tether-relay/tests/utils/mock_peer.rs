use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tether_core::{ConnectionState, IceCandidate, SessionDescription};
use tether_relay::{CandidateBuffer, PeerController, RelayError};

pub const MOCK_OFFER_SDP: &str = "v=0\r\no=- 4215 2 IN IP4 127.0.0.1\r\ns=-\r\nt=0 0\r\n";
pub const MOCK_ANSWER_SDP: &str = "v=0\r\no=- 9034 2 IN IP4 127.0.0.1\r\ns=-\r\nt=0 0\r\n";

/// Scripted PeerController.
///
/// The reported state follows a script indexed by how many drains happened:
/// before the first drain and during it the first entry applies, after the
/// n-th drain the n-th entry, and the last entry repeats forever.
#[derive(Clone)]
pub struct MockPeer {
    inner: Arc<MockPeerInner>,
}

struct MockPeerInner {
    buffer: CandidateBuffer,
    script: Vec<ConnectionState>,
    drains: AtomicUsize,
    descriptions: AtomicUsize,
    reject_offers: bool,
    applied: Mutex<Vec<IceCandidate>>,
    remote_descriptions: Mutex<Vec<SessionDescription>>,
    closed: AtomicBool,
}

impl MockPeer {
    pub fn with_states<I>(states: I) -> Self
    where
        I: IntoIterator<Item = ConnectionState>,
    {
        Self::build(states.into_iter().collect(), false)
    }

    /// A peer whose offer creation always fails.
    pub fn rejecting_offers() -> Self {
        Self::build(vec![ConnectionState::Init], true)
    }

    fn build(mut script: Vec<ConnectionState>, reject_offers: bool) -> Self {
        if script.is_empty() {
            script.push(ConnectionState::Init);
        }
        Self {
            inner: Arc::new(MockPeerInner {
                buffer: CandidateBuffer::new(),
                script,
                drains: AtomicUsize::new(0),
                descriptions: AtomicUsize::new(0),
                reject_offers,
                applied: Mutex::new(Vec::new()),
                remote_descriptions: Mutex::new(Vec::new()),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Simulate local candidate discovery.
    pub async fn discover(&self, candidate: IceCandidate) {
        self.inner.buffer.push(candidate).await;
    }

    pub fn drains(&self) -> usize {
        self.inner.drains.load(Ordering::SeqCst)
    }

    pub fn applied(&self) -> Vec<IceCandidate> {
        self.inner.applied.lock().unwrap().clone()
    }

    pub fn remote_descriptions(&self) -> Vec<SessionDescription> {
        self.inner.remote_descriptions.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    fn claim_description(&self) -> Result<(), RelayError> {
        if self.inner.reject_offers {
            return Err(RelayError::Negotiation("createOffer rejected".into()));
        }
        if self.inner.descriptions.fetch_add(1, Ordering::SeqCst) > 0 {
            return Err(RelayError::Negotiation("description already created".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl PeerController for MockPeer {
    async fn create_offer(&self) -> Result<SessionDescription, RelayError> {
        self.claim_description()?;
        Ok(SessionDescription::offer(MOCK_OFFER_SDP))
    }

    async fn create_answer(
        &self,
        offer: SessionDescription,
    ) -> Result<SessionDescription, RelayError> {
        self.claim_description()?;
        self.inner.remote_descriptions.lock().unwrap().push(offer);
        Ok(SessionDescription::answer(MOCK_ANSWER_SDP))
    }

    async fn apply_remote_description(&self, desc: SessionDescription) -> Result<(), RelayError> {
        self.inner.remote_descriptions.lock().unwrap().push(desc);
        Ok(())
    }

    async fn drain_candidates(&self) -> Vec<IceCandidate> {
        self.inner.drains.fetch_add(1, Ordering::SeqCst);
        self.inner.buffer.drain().await
    }

    async fn apply_remote_candidate(&self, candidate: IceCandidate) -> Result<(), RelayError> {
        if candidate.candidate.contains("bogus") {
            return Err(RelayError::InvalidCandidate(candidate.candidate));
        }
        self.inner.applied.lock().unwrap().push(candidate);
        Ok(())
    }

    fn current_state(&self) -> ConnectionState {
        let script = &self.inner.script;
        let step = self.drains().saturating_sub(1).min(script.len() - 1);
        script[step]
    }

    async fn close(&self) -> Result<(), RelayError> {
        self.inner.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
