use tether_core::IceServerConfig;
use tether_core::utils::DEFAULT_STUN_ADDR;

/// ICE configuration for the peer connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub ice_servers: Vec<IceServerConfig>,
}

impl TransportConfig {
    /// Host candidates only, for peers on the same machine or LAN.
    pub fn local() -> Self {
        Self {
            ice_servers: Vec::new(),
        }
    }

    pub fn with_stun_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let urls: Vec<String> = urls.into_iter().map(Into::into).collect();
        if urls.is_empty() {
            return Self::default();
        }
        Self {
            ice_servers: vec![IceServerConfig {
                urls,
                username: None,
                credential: None,
            }],
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig::new(DEFAULT_STUN_ADDR)],
        }
    }
}
