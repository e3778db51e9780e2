//! Frame codec for the uncompressed, unencrypted phases of the protocol.
//!
//! Every frame is a VarInt length followed by that many bytes of body.
//! The body is the VarInt packet ID followed by the packet's fields.

use super::BUFFER_LIMIT;
use crate::protocol::{
    packet, packet::ProtocolState, Decode, DecodeError, Decoder, Encode, EncodeError, Encoder,
};
use std::marker::PhantomData;

/// An error while splitting or decoding a frame.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame length {0} is out of bounds")]
    InvalidLength(i64),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Locates the first complete frame at the start of `buffer`.
///
/// Returns the frame body along with the total number of bytes
/// the frame occupies (length prefix included), or `None` if
/// more data is needed.
pub fn split_frame(buffer: &[u8]) -> Result<Option<(&[u8], usize)>, FrameError> {
    let mut decoder = Decoder::new(buffer);
    let length = match decoder.read_var_int() {
        Ok(length) => length,
        Err(DecodeError::EndOfStream(_)) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let body_length = usize::try_from(length)
        .ok()
        .filter(|&length| length <= BUFFER_LIMIT)
        .ok_or(FrameError::InvalidLength(length.into()))?;
    let header_length = buffer.len() - decoder.buffer().len();

    match decoder.consume_slice(body_length) {
        Ok(body) => Ok(Some((body, header_length + body_length))),
        Err(DecodeError::EndOfStream(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Prefixes `body` with its length, producing a complete frame.
pub fn write_frame(body: &[u8]) -> Result<Vec<u8>, FrameError> {
    if body.len() > BUFFER_LIMIT {
        return Err(FrameError::InvalidLength(
            i64::try_from(body.len()).unwrap_or(i64::MAX),
        ));
    }
    let mut frame = Vec::with_capacity(body.len() + 3);
    let mut encoder = Encoder::new(&mut frame);
    encoder.write_var_int_bounded(i64::try_from(body.len()).unwrap_or(i64::MAX), 32)?;
    encoder.write_slice(body);
    Ok(frame)
}

/// Codec state for one direction pair of a connection.
pub struct PacketCodec<Side, State> {
    /// Buffered incoming bytes.
    read_buffer: Vec<u8>,
    _marker: PhantomData<(Side, State)>,
}

impl<Side, State> Default for PacketCodec<Side, State>
where
    Side: packet::Side,
    State: ProtocolState,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<Side, State> PacketCodec<Side, State>
where
    Side: packet::Side,
    State: ProtocolState,
{
    pub fn new() -> Self {
        Self {
            read_buffer: Vec::new(),
            _marker: PhantomData,
        }
    }

    pub fn switch_state<NewState: ProtocolState>(self) -> PacketCodec<Side, NewState> {
        PacketCodec {
            read_buffer: self.read_buffer,
            _marker: PhantomData,
        }
    }

    /// Encodes a packet to a stream of bytes in the protocol format.
    pub fn encode_packet(&self, packet: &Side::SendPacket<State>) -> Result<Vec<u8>, FrameError> {
        let mut body = Vec::new();
        packet.encode(&mut Encoder::new(&mut body))?;
        write_frame(&body)
    }

    /// Gives data to the internal read buffer.
    ///
    /// Call `decode_packet` to get a packet.
    pub fn give_data(&mut self, data: &[u8]) {
        self.read_buffer.extend_from_slice(data);
    }

    /// Number of bytes buffered but not yet decoded.
    pub fn buffered(&self) -> usize {
        self.read_buffer.len()
    }

    /// Discards all buffered bytes, returning how many there were.
    pub fn clear(&mut self) -> usize {
        let discarded = self.read_buffer.len();
        self.read_buffer.clear();
        discarded
    }

    /// Attempts to decode a packet.
    /// This should be called in a loop after any call to `give_data`
    /// until this function returns `None`.
    ///
    /// * If not enough data is available, returns `Ok(None)`.
    /// * If a packet was read, returns `Ok(Some(packet))`. More packets may be available.
    /// * If the frame length is invalid, returns `Err(e)`, invalidating the stream.
    ///
    /// A complete frame is always consumed, even if its contents fail to
    /// decode, so the next call starts on a frame boundary.
    pub fn decode_packet(&mut self) -> Result<Option<Side::RecvPacket<State>>, FrameError> {
        let (packet, consumed) = match split_frame(&self.read_buffer)? {
            Some((body, consumed)) => (
                Side::RecvPacket::<State>::decode(&mut Decoder::new(body)),
                consumed,
            ),
            None => return Ok(None),
        };
        self.read_buffer.drain(..consumed);
        Ok(Some(packet?))
    }
}
