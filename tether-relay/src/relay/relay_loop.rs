use std::sync::Arc;

use serde::Serialize;
use tether_core::{
    ConnectionState, LineAssembler, SdpType, SessionDescription, SessionId, SignalLine,
};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::channel::{ChannelEvent, SignalingChannel};
use crate::error::RelayError;
use crate::peer::PeerController;
use crate::relay::{Established, RelayConfig, RelayReport, Role};

/// Drives one peer connection to `connected` over a line channel.
///
/// The local description goes out first, then local candidates are
/// drained every tick while inbound lines are applied as they arrive. The
/// loop ends on `connected`, on a channel failure, on a persistent
/// `failed`/`disconnected` state, or at the deadline. Every failure path
/// closes both the peer connection and the channel before returning.
pub struct RelayLoop {
    role: Role,
    channel: Box<dyn SignalingChannel>,
    peer: Arc<dyn PeerController>,
    config: RelayConfig,
    assembler: LineAssembler,
    report: RelayReport,
    local_sent: bool,
    remote_applied: bool,
    unhealthy_since: Option<Instant>,
}

impl RelayLoop {
    /// The side that creates the offer.
    pub fn offerer(
        channel: Box<dyn SignalingChannel>,
        peer: Arc<dyn PeerController>,
        config: RelayConfig,
    ) -> Self {
        Self::new(Role::Offerer, channel, peer, config)
    }

    /// The side that waits for an offer on the channel and answers it.
    pub fn answerer(
        channel: Box<dyn SignalingChannel>,
        peer: Arc<dyn PeerController>,
        config: RelayConfig,
    ) -> Self {
        Self::new(Role::Answerer, channel, peer, config)
    }

    fn new(
        role: Role,
        channel: Box<dyn SignalingChannel>,
        peer: Arc<dyn PeerController>,
        config: RelayConfig,
    ) -> Self {
        Self {
            role,
            channel,
            peer,
            config,
            assembler: LineAssembler::new(),
            report: RelayReport::new(SessionId::new(), role),
            local_sent: false,
            remote_applied: false,
            unhealthy_since: None,
        }
    }

    pub fn session(&self) -> SessionId {
        self.report.session
    }

    pub async fn run(mut self) -> Result<Established, RelayError> {
        let session = self.report.session;
        info!(%session, role = %self.role, "Relay starting");

        match self.negotiate().await {
            Ok(()) => {
                info!(
                    %session,
                    ticks = self.report.ticks,
                    sent = self.report.sent_candidates,
                    applied = self.report.applied_candidates,
                    "Peer connection established"
                );
                Ok(Established {
                    channel: self.channel,
                    report: self.report,
                })
            }
            Err(e) => {
                error!(%session, "Relay failed: {}", e);
                self.release().await;
                Err(e)
            }
        }
    }

    async fn negotiate(&mut self) -> Result<(), RelayError> {
        match self.role {
            Role::Offerer => {
                let offer = self.peer.create_offer().await?;
                self.send_record(&offer)?;
                self.local_sent = true;
                info!("Offer sent");
            }
            Role::Answerer => info!("Waiting for offer"),
        }

        let mut ticker = tokio::time::interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let deadline = tokio::time::sleep(self.config.deadline);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                biased;

                _ = &mut deadline => {
                    // A connection made since the last tick still counts.
                    if self.tick().await? {
                        return Ok(());
                    }
                    warn!(state = %self.peer.current_state(), "Deadline reached before connecting");
                    return Err(RelayError::Timeout(self.config.deadline));
                }

                _ = ticker.tick() => {
                    if self.tick().await? {
                        return Ok(());
                    }
                }

                event = self.channel.recv() => self.handle_event(event).await?,
            }
        }
    }

    /// One polling step. `Ok(true)` once connected.
    async fn tick(&mut self) -> Result<bool, RelayError> {
        self.report.ticks += 1;

        // Nothing may precede our own description on the wire.
        if !self.local_sent {
            return Ok(false);
        }

        let batch = self.peer.drain_candidates().await;
        if !batch.is_empty() {
            debug!("Forwarding {} local candidates", batch.len());
        }
        for candidate in &batch {
            self.send_record(candidate)?;
            self.report.sent_candidates += 1;
        }

        let state = self.peer.current_state();
        match state {
            ConnectionState::Connected => return Ok(true),
            ConnectionState::Closed => {
                return Err(RelayError::Negotiation(
                    "peer connection closed while negotiating".into(),
                ));
            }
            state if state.is_unhealthy() => {
                let since = *self.unhealthy_since.get_or_insert_with(Instant::now);
                let elapsed = since.elapsed();
                if elapsed >= self.config.failure_grace {
                    return Err(RelayError::Negotiation(format!(
                        "peer connection {state} for {elapsed:?}"
                    )));
                }
                debug!("Peer connection {} for {:?}, waiting", state, elapsed);
            }
            _ => self.unhealthy_since = None,
        }

        Ok(false)
    }

    async fn handle_event(&mut self, event: ChannelEvent) -> Result<(), RelayError> {
        match event {
            ChannelEvent::Line(line) => {
                let Some(record) = self.assembler.push(&line) else {
                    return Ok(());
                };
                self.handle_line(&record).await
            }
            ChannelEvent::Stderr(line) => {
                warn!("Remote stderr: {}", line);
                Ok(())
            }
            ChannelEvent::Closed => Err(RelayError::Channel(
                "signaling stream closed before the peer connected".into(),
            )),
            ChannelEvent::Error(e) => Err(RelayError::Channel(e)),
        }
    }

    async fn handle_line(&mut self, line: &str) -> Result<(), RelayError> {
        match SignalLine::parse(line) {
            SignalLine::Candidate(candidate) => {
                match self.peer.apply_remote_candidate(candidate).await {
                    Ok(()) => {
                        self.report.applied_candidates += 1;
                        debug!("Applied remote candidate");
                    }
                    Err(e) => warn!("Skipping remote candidate: {}", e),
                }
            }
            SignalLine::Description(desc) => self.handle_description(desc).await?,
            SignalLine::Unrecognized => {
                self.report.ignored_lines += 1;
                debug!(line, "Ignoring unrelated output");
            }
        }
        Ok(())
    }

    async fn handle_description(&mut self, desc: SessionDescription) -> Result<(), RelayError> {
        match (self.role, desc.sdp_type) {
            (Role::Answerer, SdpType::Offer) if !self.local_sent => {
                info!("Offer received");
                let answer = self.peer.create_answer(desc).await?;
                self.send_record(&answer)?;
                self.local_sent = true;
                self.remote_applied = true;
                info!("Answer sent");
            }
            (Role::Offerer, SdpType::Answer) if !self.remote_applied => {
                self.peer.apply_remote_description(desc).await?;
                self.remote_applied = true;
                info!("Answer applied");
            }
            (_, sdp_type) => {
                // Echoed offers from a pty, or a repeated description.
                self.report.ignored_lines += 1;
                debug!(?sdp_type, "Ignoring unexpected session description");
            }
        }
        Ok(())
    }

    fn send_record<T: Serialize>(&self, record: &T) -> Result<(), RelayError> {
        let line = serde_json::to_string(record)
            .map_err(|e| RelayError::Channel(format!("failed to encode record: {e}")))?;
        self.channel.send(&line)
    }

    async fn release(&mut self) {
        if let Err(e) = self.peer.close().await {
            warn!("Failed to close peer connection: {}", e);
        }
        self.channel.close().await;
    }
}
