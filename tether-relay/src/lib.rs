mod channel;
mod error;
mod peer;
mod relay;

pub use channel::*;
pub use error::*;
pub use peer::*;
pub use relay::*;
