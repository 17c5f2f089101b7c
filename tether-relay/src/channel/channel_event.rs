/// What the signaling stream hands to the relay, in receipt order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// One complete line from the remote's output stream, without the newline.
    Line(String),

    /// One line from the remote's error stream. Diagnostic only.
    Stderr(String),

    /// The output stream ended.
    Closed,

    /// The transport failed.
    Error(String),
}

impl ChannelEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Error(_))
    }
}
