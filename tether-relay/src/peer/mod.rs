mod candidate_buffer;
mod connection_wrapper;
mod peer_controller;
mod transport_config;

pub use candidate_buffer::*;
pub use connection_wrapper::*;
pub use peer_controller::*;
pub use transport_config::*;
