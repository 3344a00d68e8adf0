use bytes::Bytes;

use crate::error::{NetError, Result};

/// Size of every fixed-width integer and float on the wire.
pub const INT_SIZE: usize = 4;

/// Growable byte container with an unread cursor.
///
/// Appends always go to the end; reads decode from the cursor and advance it.
/// All integers and floats are little-endian.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireBuffer {
    data: Vec<u8>,
    cursor: usize,
}

impl WireBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            cursor: 0,
        }
    }

    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn unread_len(&self) -> usize {
        self.data.len() - self.cursor
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn unread(&self) -> &[u8] {
        &self.data[self.cursor..]
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.data)
    }

    /// Replaces the contents and rewinds the cursor.
    pub fn set_bytes(&mut self, data: &[u8]) {
        self.data.clear();
        self.data.extend_from_slice(data);
        self.cursor = 0;
    }

    /// Appends raw bytes after any unread tail, keeping the cursor.
    pub fn append_bytes(&mut self, data: &[u8]) {
        self.data.extend_from_slice(data);
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.cursor = 0;
    }

    /// Inserts the current length as a 4-byte prefix.
    ///
    /// Call once, right before the buffer is handed to a transport.
    pub fn prepend_length(&mut self) {
        let len = self.data.len() as i32;
        self.data.splice(0..0, len.to_le_bytes());
    }

    pub fn write_i32(&mut self, value: i32) -> &mut Self {
        self.data.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn write_i64(&mut self, value: i64) -> &mut Self {
        self.data.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn write_u8(&mut self, value: u8) -> &mut Self {
        self.data.push(value);
        self
    }

    pub fn write_bool(&mut self, value: bool) -> &mut Self {
        self.data.push(u8::from(value));
        self
    }

    pub fn write_f32(&mut self, value: f32) -> &mut Self {
        self.data.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn write_str(&mut self, value: &str) -> &mut Self {
        self.write_i32(value.len() as i32);
        self.data.extend_from_slice(value.as_bytes());
        self
    }

    pub fn write_bytes(&mut self, value: &[u8]) -> &mut Self {
        self.data.extend_from_slice(value);
        self
    }

    pub fn write_vec3(&mut self, value: [f32; 3]) -> &mut Self {
        for component in value {
            self.write_f32(component);
        }
        self
    }

    pub fn write_quat(&mut self, value: [f32; 4]) -> &mut Self {
        for component in value {
            self.write_f32(component);
        }
        self
    }

    pub fn peek_i32(&self) -> Result<i32> {
        let bytes = self.require(INT_SIZE)?;
        Ok(i32::from_le_bytes(to_array(bytes)))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let bytes = self.take(INT_SIZE)?;
        Ok(i32::from_le_bytes(to_array(bytes)))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        let bytes = self.take(8)?;
        Ok(i64::from_le_bytes(to_array(bytes)))
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        let bytes = self.take(INT_SIZE)?;
        Ok(f32::from_le_bytes(to_array(bytes)))
    }

    pub fn read_string(&mut self) -> Result<String> {
        let len = self.peek_i32()?;
        if len < 0 {
            return Err(NetError::NegativeLength(len));
        }
        // Length and body must both be present before anything is consumed.
        self.require(INT_SIZE + len as usize)?;
        self.cursor += INT_SIZE;
        let bytes = self.take(len as usize)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| NetError::InvalidUtf8)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&[u8]> {
        self.take(len)
    }

    pub fn read_vec3(&mut self) -> Result<[f32; 3]> {
        self.require(INT_SIZE * 3)?;
        Ok([self.read_f32()?, self.read_f32()?, self.read_f32()?])
    }

    pub fn read_quat(&mut self) -> Result<[f32; 4]> {
        self.require(INT_SIZE * 4)?;
        Ok([
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
        ])
    }

    fn require(&self, needed: usize) -> Result<&[u8]> {
        let available = self.unread_len();
        if available < needed {
            return Err(NetError::Underrun { needed, available });
        }
        Ok(&self.data[self.cursor..self.cursor + needed])
    }

    fn take(&mut self, needed: usize) -> Result<&[u8]> {
        self.require(needed)?;
        let start = self.cursor;
        self.cursor += needed;
        Ok(&self.data[start..self.cursor])
    }
}

fn to_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut array = [0u8; N];
    array.copy_from_slice(&bytes[..N]);
    array
}
