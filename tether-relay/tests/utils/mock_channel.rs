use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tether_relay::{ChannelEvent, RelayError, SignalingChannel};
use tokio::sync::mpsc;

/// In-memory SignalingChannel that records every outbound line.
pub struct MockChannel {
    events_rx: mpsc::UnboundedReceiver<ChannelEvent>,
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
    finished: bool,
}

/// Test-side end of a MockChannel: inject inbound events, inspect writes.
#[derive(Clone)]
pub struct MockRemote {
    events_tx: mpsc::UnboundedSender<ChannelEvent>,
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl MockChannel {
    pub fn new() -> (Self, MockRemote) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let sent = Arc::new(Mutex::new(Vec::new()));
        let closed = Arc::new(AtomicBool::new(false));
        let channel = Self {
            events_rx,
            sent: Arc::clone(&sent),
            closed: Arc::clone(&closed),
            finished: false,
        };
        let remote = MockRemote {
            events_tx,
            sent,
            closed,
        };
        (channel, remote)
    }
}

#[async_trait]
impl SignalingChannel for MockChannel {
    fn send(&self, line: &str) -> Result<(), RelayError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(RelayError::Channel("mock channel closed".into()));
        }
        tracing::debug!("[MockChannel] send {}", line);
        self.sent.lock().unwrap().push(line.to_owned());
        Ok(())
    }

    async fn recv(&mut self) -> ChannelEvent {
        if self.finished {
            return ChannelEvent::Closed;
        }
        let event = self.events_rx.recv().await.unwrap_or(ChannelEvent::Closed);
        if event.is_terminal() {
            self.finished = true;
        }
        event
    }

    async fn close(&mut self) {
        self.finished = true;
        self.closed.store(true, Ordering::SeqCst);
    }
}

impl MockRemote {
    /// Deliver one line as if the remote process printed it.
    pub fn push_line(&self, line: impl Into<String>) {
        let _ = self.events_tx.send(ChannelEvent::Line(line.into()));
    }

    pub fn push_stderr(&self, line: impl Into<String>) {
        let _ = self.events_tx.send(ChannelEvent::Stderr(line.into()));
    }

    /// The remote stream ends.
    pub fn end_stream(&self) {
        let _ = self.events_tx.send(ChannelEvent::Closed);
    }

    pub fn fail(&self, reason: impl Into<String>) {
        let _ = self.events_tx.send(ChannelEvent::Error(reason.into()));
    }

    pub fn sent_lines(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    /// Whether the relay released the channel.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
