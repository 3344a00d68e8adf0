use std::ops::{Deref, DerefMut};

use bytes::Bytes;

use crate::buffer::{INT_SIZE, WireBuffer};
use crate::error::{NetError, Result};

pub const LENGTH_PREFIX: usize = INT_SIZE;

/// A typed message: the type id plus its payload fields.
///
/// Outbound messages are built by writing fields through `DerefMut`;
/// inbound messages are read the same way, starting at the first field
/// after the type id.
///
/// Wire layout: `[i32 length][i32 type id][payload]`, where `length` counts
/// everything after itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    type_id: i32,
    body: WireBuffer,
}

impl Message {
    pub fn new(type_id: i32) -> Self {
        Self {
            type_id,
            body: WireBuffer::new(),
        }
    }

    pub fn from_parts(type_id: i32, body: WireBuffer) -> Self {
        Self { type_id, body }
    }

    pub fn type_id(&self) -> i32 {
        self.type_id
    }

    pub fn body(&self) -> &WireBuffer {
        &self.body
    }

    pub fn into_body(self) -> WireBuffer {
        self.body
    }

    /// Frames the message for the reliable channel.
    pub fn encode(&self) -> Bytes {
        self.frame(None)
    }

    /// Frames the message for the unreliable channel, with the sender id
    /// inserted as the first payload field.
    pub fn encode_with_sender(&self, sender_id: i32) -> Bytes {
        self.frame(Some(sender_id))
    }

    fn frame(&self, sender_id: Option<i32>) -> Bytes {
        let mut buffer = WireBuffer::with_capacity(LENGTH_PREFIX + INT_SIZE * 2 + self.body.len());
        buffer.write_i32(self.type_id);
        if let Some(id) = sender_id {
            buffer.write_i32(id);
        }
        buffer.write_bytes(self.body.as_slice());
        buffer.prepend_length();
        Bytes::from(buffer.into_vec())
    }

    /// Decodes one frame with its length prefix already stripped.
    pub fn decode(frame: &[u8]) -> Result<Self> {
        if frame.len() < INT_SIZE {
            return Err(NetError::EmptyFrame);
        }
        let mut buffer = WireBuffer::from_bytes(frame);
        let type_id = buffer.read_i32()?;
        Ok(Self {
            type_id,
            body: WireBuffer::from_bytes(buffer.unread()),
        })
    }

    /// Decodes a whole datagram. One datagram carries exactly one frame;
    /// bytes past the declared length are ignored.
    pub fn decode_datagram(datagram: &[u8]) -> Result<Self> {
        let malformed = NetError::MalformedDatagram(datagram.len());
        if datagram.len() < LENGTH_PREFIX {
            return Err(malformed);
        }
        let mut buffer = WireBuffer::from_bytes(datagram);
        let declared = buffer.read_i32()?;
        if declared <= 0 || declared as usize > buffer.unread_len() {
            return Err(malformed);
        }
        let frame = buffer.read_bytes(declared as usize)?;
        Self::decode(frame).map_err(|_| malformed)
    }
}

impl Deref for Message {
    type Target = WireBuffer;

    fn deref(&self) -> &WireBuffer {
        &self.body
    }
}

impl DerefMut for Message {
    fn deref_mut(&mut self) -> &mut WireBuffer {
        &mut self.body
    }
}
