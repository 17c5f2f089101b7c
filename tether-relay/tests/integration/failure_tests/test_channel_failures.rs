use std::sync::Arc;

use tether_core::{ConnectionState, SdpType};
use tether_relay::{RelayError, RelayLoop};

use crate::integration::init_tracing;
use crate::utils::{MockChannel, MockPeer, description_type, test_config};

#[tokio::test(start_paused = true)]
async fn test_channel_closed_before_any_candidate() {
    init_tracing();

    let (channel, remote) = MockChannel::new();
    let peer = MockPeer::with_states([ConnectionState::Init]);
    remote.end_stream();

    let result = RelayLoop::offerer(Box::new(channel), Arc::new(peer.clone()), test_config())
        .run()
        .await;

    assert!(matches!(result, Err(RelayError::Channel(_))), "{:?}", result.err());
    let sent = remote.sent_lines();
    assert_eq!(sent.len(), 1);
    assert_eq!(description_type(&sent[0]), Some(SdpType::Offer));
    assert!(peer.is_closed(), "peer connection must be released");
    assert!(remote.is_closed());
}

#[tokio::test(start_paused = true)]
async fn test_transport_error_is_a_channel_error() {
    init_tracing();

    let (channel, remote) = MockChannel::new();
    let peer = MockPeer::with_states([ConnectionState::Connecting]);
    remote.fail("read failed: connection reset by peer");

    let result = RelayLoop::offerer(Box::new(channel), Arc::new(peer.clone()), test_config())
        .run()
        .await;

    assert_eq!(
        result.err(),
        Some(RelayError::Channel(
            "read failed: connection reset by peer".into()
        ))
    );
    assert!(peer.is_closed());
}
