pub mod buffer;
pub mod channel;
pub mod client;
pub mod codec;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod marshal;
pub mod message;
pub mod outbound;
pub mod protocol;
mod tcp;
mod udp;

pub use buffer::WireBuffer;
pub use channel::{ChannelHandle, Transport};
pub use client::Client;
pub use codec::FrameDecoder;
pub use config::{ClientConfig, MalformedDatagramPolicy};
pub use connection::{Connection, ConnectionState, DisconnectReason, SessionGuard};
pub use dispatch::DispatchTable;
pub use error::{NetError, Result};
pub use marshal::{MainThread, MainThreadHandle};
pub use message::Message;
pub use protocol::{ClientPacket, DATA_BUFFER_SIZE, DEFAULT_PORT, ServerPacket};
pub use udp::MAX_DATAGRAM_SIZE;
