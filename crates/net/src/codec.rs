//! Reassembly of the reliable byte stream into frames.
//!
//! The carry-over buffer is the `BytesMut` handed to [`Decoder::decode`]:
//! each read completion appends to it, complete frames are split off the
//! front and a partial tail stays behind for the next completion.

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::Decoder;

use crate::error::{NetError, Result};
use crate::message::LENGTH_PREFIX;

pub const DEFAULT_MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct FrameDecoder {
    max_frame_len: usize,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_LEN)
    }
}

impl FrameDecoder {
    pub fn new(max_frame_len: usize) -> Self {
        Self { max_frame_len }
    }

    /// Appends one read completion and returns every frame it completed,
    /// in arrival order.
    pub fn push(&mut self, carry: &mut BytesMut, chunk: &[u8]) -> Result<Vec<Bytes>> {
        carry.extend_from_slice(chunk);
        let mut frames = Vec::new();
        while let Some(frame) = self.decode(carry)? {
            frames.push(frame);
        }
        Ok(frames)
    }
}

impl Decoder for FrameDecoder {
    type Item = Bytes;
    type Error = NetError;

    /// A non-positive length prefix clears the whole carry-over, including
    /// any complete frames that arrived behind it in the same read.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>> {
        if src.len() < LENGTH_PREFIX {
            return Ok(None);
        }

        let mut prefix = [0u8; LENGTH_PREFIX];
        prefix.copy_from_slice(&src[..LENGTH_PREFIX]);
        let declared = i32::from_le_bytes(prefix);

        if declared <= 0 {
            log::trace!(
                "non-positive frame length {}, discarding {} buffered bytes",
                declared,
                src.len()
            );
            src.clear();
            return Ok(None);
        }

        let len = declared as usize;
        if len > self.max_frame_len {
            return Err(NetError::FrameTooLarge {
                declared: len,
                max: self.max_frame_len,
            });
        }

        let available = src.len() - LENGTH_PREFIX;
        if available < len {
            src.reserve(len - available);
            return Ok(None);
        }

        src.advance(LENGTH_PREFIX);
        Ok(Some(src.split_to(len).freeze()))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None => {
                if !src.is_empty() {
                    log::debug!("stream closed with {} bytes of partial frame", src.len());
                    src.clear();
                }
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    fn sample_frame() -> Bytes {
        let mut message = Message::new(7);
        message.write_i32(42);
        message.encode()
    }

    fn decode_all(decoder: &mut FrameDecoder, chunks: &[&[u8]]) -> Vec<Bytes> {
        let mut carry = BytesMut::new();
        let mut frames = Vec::new();
        for chunk in chunks {
            frames.extend(decoder.push(&mut carry, chunk).unwrap());
        }
        frames
    }

    #[test]
    fn test_whole_frame_in_one_read() {
        let frame = sample_frame();
        let frames = decode_all(&mut FrameDecoder::default(), &[&frame[..]]);
        assert_eq!(frames.len(), 1);

        let mut message = Message::decode(&frames[0]).unwrap();
        assert_eq!(message.type_id(), 7);
        assert_eq!(message.read_i32().unwrap(), 42);
    }

    #[test]
    fn test_five_then_seven_bytes_yields_one_frame() {
        let frame = sample_frame();
        let mut decoder = FrameDecoder::default();
        let mut carry = BytesMut::new();

        assert!(decoder.push(&mut carry, &frame[..5]).unwrap().is_empty());
        let frames = decoder.push(&mut carry, &frame[5..]).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_ref(), &frame[LENGTH_PREFIX..]);
        assert!(carry.is_empty());
    }

    #[test]
    fn test_every_two_way_split_matches_unsplit() {
        let frame = sample_frame();
        for split in 1..frame.len() {
            let frames = decode_all(
                &mut FrameDecoder::default(),
                &[&frame[..split], &frame[split..]],
            );
            assert_eq!(frames.len(), 1, "split at {split}");
            assert_eq!(frames[0].as_ref(), &frame[LENGTH_PREFIX..]);
        }
    }

    #[test]
    fn test_byte_at_a_time_delivery() {
        let mut message = Message::new(12);
        message.write_str("spread thin").write_bool(true);
        let frame = message.encode();

        let chunks: Vec<&[u8]> = frame.chunks(1).collect();
        let frames = decode_all(&mut FrameDecoder::default(), &chunks);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_ref(), &frame[LENGTH_PREFIX..]);
    }

    #[test]
    fn test_coalesced_frames_dispatch_in_order() {
        let mut stream = Vec::new();
        for type_id in 1..=3 {
            let mut message = Message::new(type_id);
            message.write_i32(type_id * 10);
            stream.extend_from_slice(&message.encode());
        }

        let frames = decode_all(&mut FrameDecoder::default(), &[&stream[..]]);
        let ids: Vec<i32> = frames
            .iter()
            .map(|f| Message::decode(f).unwrap().type_id())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_coalesced_with_trailing_partial() {
        let first = sample_frame();
        let second = {
            let mut message = Message::new(8);
            message.write_str("tail");
            message.encode()
        };
        let mut stream = first.to_vec();
        stream.extend_from_slice(&second[..6]);

        let mut decoder = FrameDecoder::default();
        let mut carry = BytesMut::new();
        let frames = decoder.push(&mut carry, &stream).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(carry.len(), 6);

        let frames = decoder.push(&mut carry, &second[6..]).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(Message::decode(&frames[0]).unwrap().type_id(), 8);
    }

    #[test]
    fn test_partial_length_prefix_is_retained() {
        let frame = sample_frame();
        let mut decoder = FrameDecoder::default();
        let mut carry = BytesMut::new();

        assert!(decoder.push(&mut carry, &frame[..2]).unwrap().is_empty());
        assert_eq!(carry.len(), 2);
        assert_eq!(decoder.push(&mut carry, &frame[2..]).unwrap().len(), 1);
    }

    #[test]
    fn test_zero_length_resets_without_dispatch() {
        let mut decoder = FrameDecoder::default();
        let mut carry = BytesMut::new();

        let frames = decoder.push(&mut carry, &[0, 0, 0, 0, 1, 2, 3]).unwrap();
        assert!(frames.is_empty());
        assert!(carry.is_empty());
    }

    #[test]
    fn test_negative_length_does_not_corrupt_next_frame() {
        let mut decoder = FrameDecoder::default();
        let mut carry = BytesMut::new();

        let bogus = (-5i32).to_le_bytes();
        assert!(decoder.push(&mut carry, &bogus).unwrap().is_empty());
        assert!(carry.is_empty());

        let frame = sample_frame();
        let frames = decoder.push(&mut carry, &frame).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_ref(), &frame[LENGTH_PREFIX..]);
    }

    #[test]
    fn test_reset_discards_frames_in_same_read() {
        let mut stream = (-1i32).to_le_bytes().to_vec();
        stream.extend_from_slice(&sample_frame());

        let mut decoder = FrameDecoder::default();
        let mut carry = BytesMut::new();
        assert!(decoder.push(&mut carry, &stream).unwrap().is_empty());
        assert!(carry.is_empty());
    }

    #[test]
    fn test_zero_length_after_valid_frame_keeps_valid_frame() {
        let mut stream = sample_frame().to_vec();
        stream.extend_from_slice(&[0, 0, 0, 0]);

        let mut decoder = FrameDecoder::default();
        let mut carry = BytesMut::new();
        let frames = decoder.push(&mut carry, &stream).unwrap();
        assert_eq!(frames.len(), 1);
        assert!(carry.is_empty());
    }

    #[test]
    fn test_oversized_declared_length_is_error() {
        let mut decoder = FrameDecoder::new(64);
        let mut carry = BytesMut::new();
        let prefix = 65i32.to_le_bytes();
        match decoder.push(&mut carry, &prefix) {
            Err(NetError::FrameTooLarge { declared, max }) => {
                assert_eq!(declared, 65);
                assert_eq!(max, 64);
            }
            other => panic!("expected FrameTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn test_eof_drops_partial_frame() {
        let frame = sample_frame();
        let mut decoder = FrameDecoder::default();
        let mut carry = BytesMut::from(&frame[..7]);
        assert!(decoder.decode_eof(&mut carry).unwrap().is_none());
        assert!(carry.is_empty());
    }
}
