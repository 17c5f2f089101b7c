use async_trait::async_trait;
use tether_core::{ConnectionState, IceCandidate, SessionDescription};

use crate::error::RelayError;

/// The relay's view of one peer connection.
#[async_trait]
pub trait PeerController: Send + Sync {
    /// Produce the session's offer and start gathering local candidates.
    /// A second call fails with [`RelayError::Negotiation`].
    async fn create_offer(&self) -> Result<SessionDescription, RelayError>;

    /// Accept a remote offer and produce the answer. Same once-only rule as
    /// [`create_offer`](Self::create_offer).
    async fn create_answer(
        &self,
        offer: SessionDescription,
    ) -> Result<SessionDescription, RelayError>;

    /// Apply the remote side's answer.
    async fn apply_remote_description(&self, desc: SessionDescription) -> Result<(), RelayError>;

    /// Take every candidate discovered since the previous drain.
    async fn drain_candidates(&self) -> Vec<IceCandidate>;

    /// Fails with [`RelayError::InvalidCandidate`] on malformed input.
    async fn apply_remote_candidate(&self, candidate: IceCandidate) -> Result<(), RelayError>;

    fn current_state(&self) -> ConnectionState;

    async fn close(&self) -> Result<(), RelayError>;
}
