mod channel_event;
mod line_channel;
mod line_framer;
mod signaling_channel;

pub use channel_event::*;
pub use line_channel::*;
pub use line_framer::*;
pub use signaling_channel::*;
