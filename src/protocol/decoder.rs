use std::{convert::Infallible, num::TryFromIntError, str::Utf8Error};
use uuid::Uuid;

/// An error while decoding packets.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("need at least {0} more bytes")]
    EndOfStream(usize),
    #[error("invalid boolean pattern {0} - expected either 0 or 1")]
    InvalidBool(u8),
    #[error("varint is too long")]
    VarIntTooLong,
    #[error("string exceeds max allowed length")]
    StringTooLong,
    #[error("unknown {ty} discriminant {value:#04x}")]
    UnknownDiscriminant { ty: &'static str, value: i64 },
    #[error(transparent)]
    Utf8(#[from] Utf8Error),
    #[error(transparent)]
    IntConversion(#[from] TryFromIntError),
}

impl From<Infallible> for DecodeError {
    fn from(x: Infallible) -> Self {
        match x {}
    }
}

pub type Result<T, E = DecodeError> = std::result::Result<T, E>;

const MAX_STRING_LENGTH: usize = i16::MAX as usize;

/// Maximum number of bytes in a 32-bit VarInt.
const MAX_VAR_INT_SIZE: usize = 5;

/// A raw decoder for a Minecraft bitstream.
#[derive(Debug)]
pub struct Decoder<'a> {
    buffer: &'a [u8],
}

impl<'a> Decoder<'a> {
    /// Creates a decoder from the buffer it will read from.
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer }
    }

    /// Gets the remaining buffer.
    pub fn buffer(&self) -> &'a [u8] {
        self.buffer
    }

    /// Returns if there is no data left in the buffer.
    pub fn is_finished(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Consumes `n` bytes from the buffer, returning them as a slice.
    pub fn consume_slice(&mut self, n: usize) -> Result<&'a [u8]> {
        if n <= self.buffer.len() {
            let (data, buffer) = self.buffer.split_at(n);
            self.buffer = buffer;
            Ok(data)
        } else {
            Err(DecodeError::EndOfStream(n - self.buffer.len()))
        }
    }

    /// Consumes `N` bytes into an array.
    pub fn consume<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut array = [0; N];
        array.copy_from_slice(self.consume_slice(N)?);
        Ok(array)
    }

    /// Consumes everything left in the buffer.
    pub fn consume_rest(&mut self) -> &'a [u8] {
        std::mem::take(&mut self.buffer)
    }

    /// Reads an unsigned byte from the stream.
    pub fn read_u8(&mut self) -> Result<u8> {
        self.consume::<1>().map(|[x]| x)
    }

    /// Reads an unsigned short from the stream.
    pub fn read_u16(&mut self) -> Result<u16> {
        self.consume().map(u16::from_be_bytes)
    }

    /// Reads a signed long from the stream.
    pub fn read_i64(&mut self) -> Result<i64> {
        self.consume().map(i64::from_be_bytes)
    }

    /// Reads a boolean from the stream.
    pub fn read_bool(&mut self) -> Result<bool> {
        let x = self.read_u8()?;
        match x {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(DecodeError::InvalidBool(x)),
        }
    }

    /// Reads a VarInt from the stream.
    pub fn read_var_int(&mut self) -> Result<i32> {
        self.read_var_int_with_size().map(|(x, _)| x)
    }

    /// Reads a VarInt from the stream, additionally
    /// returning the number of bytes read.
    ///
    /// Never consumes more than five bytes.
    pub fn read_var_int_with_size(&mut self) -> Result<(i32, usize)> {
        let mut num_read = 0;
        let mut result = 0;

        loop {
            let read = self.read_u8()?;
            let value = i32::from(read & 0b0111_1111);
            result |= value.overflowing_shl(7 * num_read as u32).0;

            num_read += 1;

            if read & 0b1000_0000 == 0 {
                break;
            }
            if num_read == MAX_VAR_INT_SIZE {
                return Err(DecodeError::VarIntTooLong);
            }
        }
        Ok((result, num_read))
    }

    /// Reads a string from the stream.
    pub fn read_string(&mut self) -> Result<&'a str> {
        let length = usize::try_from(self.read_var_int()?)?;

        if length > MAX_STRING_LENGTH {
            return Err(DecodeError::StringTooLong);
        }

        let bytes = std::str::from_utf8(self.consume_slice(length)?)?;
        Ok(bytes)
    }

    /// Reads a 128-bit UUID, most significant bits first.
    pub fn read_uuid(&mut self) -> Result<Uuid> {
        self.consume::<16>().map(Uuid::from_bytes)
    }
}

/// A type that can be read from a [`Decoder`].
pub trait Decode: Sized {
    fn decode(decoder: &mut Decoder) -> Result<Self>;
}

impl Decode for u8 {
    fn decode(decoder: &mut Decoder) -> Result<Self> {
        decoder.read_u8()
    }
}

impl Decode for u16 {
    fn decode(decoder: &mut Decoder) -> Result<Self> {
        decoder.read_u16()
    }
}

impl Decode for i64 {
    fn decode(decoder: &mut Decoder) -> Result<Self> {
        decoder.read_i64()
    }
}

impl Decode for bool {
    fn decode(decoder: &mut Decoder) -> Result<Self> {
        decoder.read_bool()
    }
}

impl Decode for String {
    fn decode(decoder: &mut Decoder) -> Result<Self> {
        decoder.read_string().map(str::to_owned)
    }
}

impl Decode for Uuid {
    fn decode(decoder: &mut Decoder) -> Result<Self> {
        decoder.read_uuid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_known_var_ints() {
        let cases: &[(&[u8], i32)] = &[
            (&[0x00], 0),
            (&[0x01], 1),
            (&[0x7f], 127),
            (&[0x80, 0x01], 128),
            (&[0xff, 0x01], 255),
            (&[0xdd, 0xc7, 0x01], 25565),
            (&[0xff, 0xff, 0xff, 0xff, 0x07], i32::MAX),
            (&[0xff, 0xff, 0xff, 0xff, 0x0f], -1),
            (&[0x80, 0x80, 0x80, 0x80, 0x08], i32::MIN),
        ];
        for (bytes, expected) in cases {
            let mut decoder = Decoder::new(bytes);
            assert_eq!(decoder.read_var_int_with_size().unwrap(), (*expected, bytes.len()));
            assert!(decoder.is_finished());
        }
    }

    #[test]
    fn six_groups_is_too_long() {
        let mut decoder = Decoder::new(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x01]);
        assert!(matches!(
            decoder.read_var_int(),
            Err(DecodeError::VarIntTooLong)
        ));
        // The sixth byte is never touched.
        assert_eq!(decoder.buffer(), &[0x01]);
    }

    #[test]
    fn truncated_var_int_is_end_of_stream() {
        let mut decoder = Decoder::new(&[0x80, 0x80]);
        assert!(matches!(
            decoder.read_var_int(),
            Err(DecodeError::EndOfStream(1))
        ));
    }

    #[test]
    fn rejects_invalid_utf8() {
        let mut decoder = Decoder::new(&[0x02, 0xc3, 0x28]);
        assert!(matches!(decoder.read_string(), Err(DecodeError::Utf8(_))));
    }

    #[test]
    fn rejects_negative_string_length() {
        let mut decoder = Decoder::new(&[0xff, 0xff, 0xff, 0xff, 0x0f]);
        assert!(matches!(
            decoder.read_string(),
            Err(DecodeError::IntConversion(_))
        ));
    }

    #[test]
    fn rejects_oversized_string_length() {
        // 32768
        let mut decoder = Decoder::new(&[0x80, 0x80, 0x02]);
        assert!(matches!(
            decoder.read_string(),
            Err(DecodeError::StringTooLong)
        ));
    }
}
