use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tether_core::utils::DATA_CHANNEL_LABEL;
use tether_core::{ConnectionState, IceCandidate, SdpType, SessionDescription};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::ice::candidate::candidate_base::unmarshal_candidate;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;

use crate::error::RelayError;
use crate::peer::{CandidateBuffer, PeerController, TransportConfig};

/// [`PeerController`] backed by a webrtc-rs `RTCPeerConnection`.
pub struct ConnectionWrapper {
    peer_connection: Arc<RTCPeerConnection>,
    candidates: CandidateBuffer,
    state_rx: watch::Receiver<ConnectionState>,
    described: AtomicBool,
    /// Remote candidates that arrived before the remote description.
    /// `None` once the remote description is set.
    pending_remote: Mutex<Option<Vec<RTCIceCandidateInit>>>,
}

impl ConnectionWrapper {
    pub async fn new(config: TransportConfig) -> Result<Self, RelayError> {
        let mut media_engine = MediaEngine::default();
        media_engine
            .register_default_codecs()
            .map_err(RelayError::negotiation)?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)
            .map_err(RelayError::negotiation)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: config
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .map_err(RelayError::negotiation)?,
        );

        let candidates = CandidateBuffer::new();

        let (state_tx, state_rx) = watch::channel(ConnectionState::Init);
        let state_tx = Arc::new(state_tx);
        let buffer = candidates.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                let buffer = buffer.clone();
                Box::pin(async move {
                    let state = connection_state(s);
                    info!("Peer connection state changed: {}", state);
                    // The relay stops draining at `connected`.
                    if state == ConnectionState::Connected {
                        buffer.close().await;
                    }
                    tx.send_replace(state);
                })
            },
        ));

        let buffer = candidates.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let buffer = buffer.clone();
            Box::pin(async move {
                let Some(candidate) = c else {
                    debug!("Local ICE gathering complete");
                    return;
                };
                match candidate.to_json() {
                    Ok(init) => buffer.push(from_rtc_candidate(init)).await,
                    Err(e) => warn!("Failed to serialize local candidate: {}", e),
                }
            })
        }));

        peer_connection.on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
            Box::pin(async move {
                debug!("Remote opened data channel '{}'", dc.label());
                watch_data_channel(&dc);
            })
        }));

        Ok(Self {
            peer_connection,
            candidates,
            state_rx,
            described: AtomicBool::new(false),
            pending_remote: Mutex::new(Some(Vec::new())),
        })
    }

    /// Follow state changes after the relay has finished.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    pub fn peer_connection(&self) -> Arc<RTCPeerConnection> {
        Arc::clone(&self.peer_connection)
    }

    fn claim_description(&self) -> Result<(), RelayError> {
        if self.described.swap(true, Ordering::SeqCst) {
            return Err(RelayError::Negotiation(
                "session description already created for this session".into(),
            ));
        }
        Ok(())
    }

    async fn set_remote(&self, desc: SessionDescription) -> Result<(), RelayError> {
        let desc = to_rtc_description(desc)?;
        self.peer_connection
            .set_remote_description(desc)
            .await
            .map_err(RelayError::negotiation)?;

        let queued = self.pending_remote.lock().await.take().unwrap_or_default();
        if !queued.is_empty() {
            debug!("Applying {} queued remote candidates", queued.len());
        }
        for init in queued {
            if let Err(e) = self.peer_connection.add_ice_candidate(init).await {
                warn!("Dropping queued remote candidate: {}", e);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl PeerController for ConnectionWrapper {
    async fn create_offer(&self) -> Result<SessionDescription, RelayError> {
        self.claim_description()?;

        let channel = self
            .peer_connection
            .create_data_channel(DATA_CHANNEL_LABEL, None)
            .await
            .map_err(RelayError::negotiation)?;
        watch_data_channel(&channel);

        let offer = self
            .peer_connection
            .create_offer(None)
            .await
            .map_err(RelayError::negotiation)?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await
            .map_err(RelayError::negotiation)?;

        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(
        &self,
        offer: SessionDescription,
    ) -> Result<SessionDescription, RelayError> {
        if offer.sdp_type != SdpType::Offer {
            return Err(RelayError::Negotiation(format!(
                "expected an offer, got {:?}",
                offer.sdp_type
            )));
        }
        self.claim_description()?;
        self.set_remote(offer).await?;

        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .map_err(RelayError::negotiation)?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await
            .map_err(RelayError::negotiation)?;

        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn apply_remote_description(&self, desc: SessionDescription) -> Result<(), RelayError> {
        self.set_remote(desc).await
    }

    async fn drain_candidates(&self) -> Vec<IceCandidate> {
        self.candidates.drain().await
    }

    async fn apply_remote_candidate(&self, candidate: IceCandidate) -> Result<(), RelayError> {
        if candidate.is_end_of_candidates() {
            debug!("Remote signalled end of candidates");
            return Ok(());
        }
        validate_candidate(&candidate.candidate)?;
        let init = to_rtc_candidate(candidate);

        {
            let mut pending = self.pending_remote.lock().await;
            if let Some(queue) = pending.as_mut() {
                queue.push(init);
                return Ok(());
            }
        }

        self.peer_connection
            .add_ice_candidate(init)
            .await
            .map_err(|e| RelayError::InvalidCandidate(e.to_string()))
    }

    fn current_state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    async fn close(&self) -> Result<(), RelayError> {
        self.peer_connection
            .close()
            .await
            .map_err(RelayError::negotiation)
    }
}

fn watch_data_channel(dc: &Arc<RTCDataChannel>) {
    let label = dc.label().to_owned();
    dc.on_open(Box::new(move || {
        let label = label.clone();
        Box::pin(async move {
            info!("Data channel '{}' open", label);
        })
    }));

    dc.on_message(Box::new(move |msg: DataChannelMessage| {
        Box::pin(async move {
            debug!("Data channel message: {} bytes", msg.data.len());
        })
    }));
}

fn connection_state(state: RTCPeerConnectionState) -> ConnectionState {
    match state {
        RTCPeerConnectionState::Unspecified | RTCPeerConnectionState::New => ConnectionState::Init,
        RTCPeerConnectionState::Connecting => ConnectionState::Connecting,
        RTCPeerConnectionState::Connected => ConnectionState::Connected,
        RTCPeerConnectionState::Disconnected => ConnectionState::Disconnected,
        RTCPeerConnectionState::Failed => ConnectionState::Failed,
        RTCPeerConnectionState::Closed => ConnectionState::Closed,
    }
}

fn to_rtc_description(desc: SessionDescription) -> Result<RTCSessionDescription, RelayError> {
    let parsed = match desc.sdp_type {
        SdpType::Offer => RTCSessionDescription::offer(desc.sdp),
        SdpType::Answer => RTCSessionDescription::answer(desc.sdp),
        other => {
            return Err(RelayError::Negotiation(format!(
                "unsupported description type {other:?}"
            )));
        }
    };
    parsed.map_err(RelayError::negotiation)
}

/// Queued candidates are only handed to webrtc-rs later, so reject
/// malformed ones up front with the parser it would use.
fn validate_candidate(candidate: &str) -> Result<(), RelayError> {
    let attributes = candidate.strip_prefix("candidate:").unwrap_or(candidate);
    unmarshal_candidate(attributes)
        .map(|_| ())
        .map_err(|e| RelayError::InvalidCandidate(format!("{candidate:?}: {e}")))
}

fn from_rtc_candidate(init: RTCIceCandidateInit) -> IceCandidate {
    IceCandidate {
        candidate: init.candidate,
        sdp_mid: init.sdp_mid,
        sdp_m_line_index: init.sdp_mline_index,
        username_fragment: init.username_fragment,
    }
}

fn to_rtc_candidate(candidate: IceCandidate) -> RTCIceCandidateInit {
    RTCIceCandidateInit {
        candidate: candidate.candidate,
        sdp_mid: candidate.sdp_mid,
        sdp_mline_index: candidate.sdp_m_line_index,
        username_fragment: candidate.username_fragment,
    }
}
