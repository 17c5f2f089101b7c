pub use tether_core::model::{ConnectionState, IceCandidate, SessionDescription, SessionId};

pub mod model {
    pub use tether_core::model::*;
}

pub mod utils {
    pub use tether_core::utils::*;
}

#[cfg(feature = "relay")]
pub mod relay {
    pub use tether_relay::*;
}
