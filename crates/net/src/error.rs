use std::io;

#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("buffer underrun: needed {needed} bytes, {available} available")]
    Underrun { needed: usize, available: usize },
    #[error("string field is not valid UTF-8")]
    InvalidUtf8,
    #[error("negative length field: {0}")]
    NegativeLength(i32),
    #[error("declared frame length {declared} exceeds maximum {max}")]
    FrameTooLarge { declared: usize, max: usize },
    #[error("frame too short to hold a message type id")]
    EmptyFrame,
    #[error("malformed datagram ({0} bytes)")]
    MalformedDatagram(usize),
    #[error("no handler registered for message type {0}")]
    UnregisteredMessage(i32),
    #[error("handler already registered for message type {0}")]
    DuplicateHandler(i32),
    #[error("unknown message type id {0}")]
    UnknownMessageType(i32),
    #[error("not connected")]
    NotConnected,
    #[error("connection already active")]
    AlreadyConnected,
    #[error("could not resolve host: {0}")]
    Resolve(String),
    #[error("channel closed")]
    ChannelClosed,
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, NetError>;
