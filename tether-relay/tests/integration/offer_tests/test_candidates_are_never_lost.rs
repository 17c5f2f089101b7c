use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tether_core::{ConnectionState, SdpType};
use tether_relay::RelayLoop;

use crate::integration::init_tracing;
use crate::utils::{
    MockChannel, MockPeer, assert_description_first, host_candidate, sent_candidates, test_config,
};

#[tokio::test(start_paused = true)]
async fn test_candidates_are_never_lost() {
    init_tracing();

    let (channel, remote) = MockChannel::new();
    let mut script = vec![ConnectionState::Connecting; 6];
    script.push(ConnectionState::Connected);
    let peer = MockPeer::with_states(script);

    peer.discover(host_candidate(1)).await;
    peer.discover(host_candidate(2)).await;

    // Discovery keeps going between and across ticks.
    let producer = tokio::spawn({
        let peer = peer.clone();
        async move {
            for n in 3..=12 {
                tokio::time::sleep(Duration::from_millis(170)).await;
                peer.discover(host_candidate(n)).await;
            }
        }
    });

    let established = RelayLoop::offerer(Box::new(channel), Arc::new(peer.clone()), test_config())
        .run()
        .await
        .expect("relay should connect");
    producer.await.unwrap();

    let sent = remote.sent_lines();
    assert_description_first(&sent, SdpType::Offer);

    let expected: HashSet<_> = (1..=12).map(host_candidate).collect();
    let candidates = sent_candidates(&sent);
    assert_eq!(candidates.len(), 12);
    assert_eq!(candidates.into_iter().collect::<HashSet<_>>(), expected);
    assert_eq!(established.report.sent_candidates, 12);

    // Nothing goes out once the loop has finished.
    let drains = peer.drains();
    peer.discover(host_candidate(99)).await;
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(peer.drains(), drains);
    assert_eq!(remote.sent_lines().len(), sent.len());
}
