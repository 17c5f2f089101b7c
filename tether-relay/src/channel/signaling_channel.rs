use async_trait::async_trait;

use crate::channel::ChannelEvent;
use crate::error::RelayError;

/// Line-oriented signaling transport the relay loop talks through.
#[async_trait]
pub trait SignalingChannel: Send {
    /// Queue `line` plus a trailing newline. Writes are not acknowledged,
    /// but they reach the stream in the order they were queued.
    fn send(&self, line: &str) -> Result<(), RelayError>;

    /// Next inbound event. Returns `Closed` forever once the stream ended
    /// or failed.
    async fn recv(&mut self) -> ChannelEvent;

    /// Flush queued writes and stop reading.
    async fn close(&mut self);
}
