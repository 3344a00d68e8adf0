use crate::codec::DEFAULT_MAX_FRAME_LEN;
use crate::protocol::{DATA_BUFFER_SIZE, DEFAULT_PORT};

/// What the unreliable channel does with a datagram it cannot decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedDatagramPolicy {
    #[default]
    Disconnect,
    Drop,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub port: u16,
    pub recv_buffer_size: usize,
    pub max_frame_len: usize,
    pub worker_threads: usize,
    /// `None` binds the unreliable channel to the reliable channel's local port.
    pub udp_local_port: Option<u16>,
    pub malformed_datagram: MalformedDatagramPolicy,
    pub tcp_nodelay: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            recv_buffer_size: DATA_BUFFER_SIZE,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            worker_threads: 2,
            udp_local_port: None,
            malformed_datagram: MalformedDatagramPolicy::Disconnect,
            tcp_nodelay: true,
        }
    }
}
