/// Protocol version sent in the handshake when probing the backend.
pub const PROBE_PROTOCOL_VERSION: i32 = 765; // 1.20.4

mod codec;
mod decoder;
mod encoder;
pub mod packet;

pub use codec::{split_frame, FrameError, PacketCodec};
pub use decoder::{Decode, DecodeError, Decoder};
pub use encoder::{var_int_size, Encode, EncodeError, Encoder};

/// Limit to avoid out-of-memory DOS.
const BUFFER_LIMIT: usize = 1024 * 1024; // 1 MiB
