mod connection_state;
mod line_assembler;
mod session;
mod signal_line;
mod signaling;

pub use connection_state::ConnectionState;
pub use line_assembler::LineAssembler;
pub use session::SessionId;
pub use signal_line::SignalLine;
pub use signaling::{IceCandidate, IceServerConfig, SdpType, SessionDescription};
