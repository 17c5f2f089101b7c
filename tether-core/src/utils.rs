/// Public STUN server used when no ICE servers are configured.
pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";

/// Label of the data channel the initiating side opens to trigger negotiation.
pub const DATA_CHANNEL_LABEL: &str = "%";

/// Upper bound for a record the remote terminal split across several lines.
pub const MAX_ASSEMBLED_RECORD: usize = 64 * 1024;
