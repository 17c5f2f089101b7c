use std::fmt;

use tether_core::SessionId;

use crate::channel::SignalingChannel;

/// Which half of the offer/answer exchange this side plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Offerer,
    Answerer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offerer => f.write_str("offerer"),
            Self::Answerer => f.write_str("answerer"),
        }
    }
}

/// Counters collected over one successful session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayReport {
    pub session: SessionId,
    pub role: Role,
    pub ticks: usize,
    pub sent_candidates: usize,
    pub applied_candidates: usize,
    pub ignored_lines: usize,
}

impl RelayReport {
    pub(crate) fn new(session: SessionId, role: Role) -> Self {
        Self {
            session,
            role,
            ticks: 0,
            sent_candidates: 0,
            applied_candidates: 0,
            ignored_lines: 0,
        }
    }
}

/// A connected session. The channel is handed back because the process on
/// its far end may be the one hosting the remote peer.
///
/// Local candidates gathered after this point are not relayed.
/// `ConnectionWrapper` stops buffering them once it reports `connected`.
pub struct Established {
    pub channel: Box<dyn SignalingChannel>,
    pub report: RelayReport,
}
