use serde::Deserialize;

use crate::model::signaling::{IceCandidate, SessionDescription};

/// Result of reading one line off the shared text channel.
///
/// The channel also carries the remote process's own output, so anything
/// that is not a recognizable record is `Unrecognized` rather than an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalLine {
    Description(SessionDescription),
    Candidate(IceCandidate),
    Unrecognized,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireRecord {
    Description(SessionDescription),
    Candidate(IceCandidate),
}

impl SignalLine {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if !trimmed.starts_with('{') {
            return Self::Unrecognized;
        }
        match serde_json::from_str::<WireRecord>(trimmed) {
            Ok(WireRecord::Description(desc)) => Self::Description(desc),
            Ok(WireRecord::Candidate(candidate)) => Self::Candidate(candidate),
            Err(_) => Self::Unrecognized,
        }
    }

    pub fn is_unrecognized(&self) -> bool {
        matches!(self, Self::Unrecognized)
    }
}
