use uuid::Uuid;

/// An error while encoding packets.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("varint does not fit in range: {min} <= {value} < {max}")]
    Range { value: i64, min: i64, max: i64 },
}

pub type Result<T, E = EncodeError> = std::result::Result<T, E>;

/// Bit width of the VarInt that prefixes a string's length.
const STRING_LENGTH_BITS: u32 = 16;

/// A raw encoder for a Minecraft bitstream.
#[derive(Debug)]
pub struct Encoder<'a> {
    buffer: &'a mut Vec<u8>,
}

impl<'a> Encoder<'a> {
    /// Creates an encoder that will append to the provided
    /// byte buffer.
    ///
    /// Any existing contents of `buffer` are left untouched.
    pub fn new(buffer: &'a mut Vec<u8>) -> Self {
        Self { buffer }
    }

    /// Writes an unsigned byte to the stream.
    pub fn write_u8(&mut self, x: u8) {
        self.buffer.push(x);
    }

    /// Writes an unsigned short to the stream.
    pub fn write_u16(&mut self, x: u16) {
        self.buffer.extend(x.to_be_bytes());
    }

    /// Writes a signed long to the stream.
    pub fn write_i64(&mut self, x: i64) {
        self.buffer.extend(x.to_be_bytes());
    }

    /// Writes a boolean to the stream.
    pub fn write_bool(&mut self, x: bool) {
        self.write_u8(if x { 0x01 } else { 0x00 });
    }

    /// Writes a series of bytes to the stream. Does not write
    /// any sort of length prefix.
    pub fn write_slice(&mut self, slice: &[u8]) {
        self.buffer.extend_from_slice(slice);
    }

    /// Writes a VarInt to the stream. Returns the number of bytes written.
    ///
    /// Negative values use their 32-bit two's-complement form and
    /// therefore always take five bytes.
    pub fn write_var_int(&mut self, x: i32) -> usize {
        let mut x: u32 = bytemuck::cast(x);
        let mut bytes_written = 0;
        loop {
            let mut temp = (x & 0b0111_1111) as u8;
            x >>= 7;
            if x != 0 {
                temp |= 0b1000_0000;
            }

            self.buffer.push(temp);
            bytes_written += 1;

            if x == 0 {
                break bytes_written;
            }
        }
    }

    /// Writes a VarInt after checking that `x` fits in a signed integer
    /// of `bits` bits (at most 32).
    pub fn write_var_int_bounded(&mut self, x: i64, bits: u32) -> Result<usize> {
        debug_assert!((1..=32).contains(&bits));
        let min = -1i64 << (bits - 1);
        let max = 1i64 << (bits - 1);
        if !(min..max).contains(&x) {
            return Err(EncodeError::Range { value: x, min, max });
        }
        // In range, so this never truncates.
        Ok(self.write_var_int(x as i32))
    }

    /// Writes a varint-prefixed string to the stream.
    ///
    /// The length prefix is limited to 16 bits.
    pub fn write_string(&mut self, x: &str) -> Result<()> {
        let length = i64::try_from(x.len()).unwrap_or(i64::MAX);
        self.write_var_int_bounded(length, STRING_LENGTH_BITS)?;
        self.buffer.extend_from_slice(x.as_bytes());
        Ok(())
    }

    /// Writes a 128-bit UUID, most significant bits first.
    pub fn write_uuid(&mut self, uuid: &Uuid) {
        self.buffer.extend_from_slice(uuid.as_bytes());
    }
}

/// A type that can be written to an [`Encoder`].
pub trait Encode {
    fn encode(&self, encoder: &mut Encoder) -> Result<()>;
}

impl Encode for u8 {
    fn encode(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.write_u8(*self);
        Ok(())
    }
}

impl Encode for u16 {
    fn encode(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.write_u16(*self);
        Ok(())
    }
}

impl Encode for i64 {
    fn encode(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.write_i64(*self);
        Ok(())
    }
}

impl Encode for bool {
    fn encode(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.write_bool(*self);
        Ok(())
    }
}

impl Encode for String {
    fn encode(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.write_string(self)
    }
}

impl Encode for Uuid {
    fn encode(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.write_uuid(self);
        Ok(())
    }
}

/// Returns the number of bytes `x` takes as a VarInt.
pub fn var_int_size(x: i32) -> usize {
    Encoder::new(&mut Vec::new()).write_var_int(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Decoder;

    fn var_int(x: i64, bits: u32) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        Encoder::new(&mut buf).write_var_int_bounded(x, bits)?;
        Ok(buf)
    }

    #[test]
    fn writes_known_var_ints() {
        assert_eq!(var_int(0, 32).unwrap(), [0x00]);
        assert_eq!(var_int(127, 32).unwrap(), [0x7f]);
        assert_eq!(var_int(128, 32).unwrap(), [0x80, 0x01]);
        assert_eq!(var_int(25565, 32).unwrap(), [0xdd, 0xc7, 0x01]);
        assert_eq!(var_int(-1, 32).unwrap(), [0xff, 0xff, 0xff, 0xff, 0x0f]);
        assert_eq!(var_int(-1, 16).unwrap(), [0xff, 0xff, 0xff, 0xff, 0x0f]);
    }

    #[test]
    fn round_trips_across_the_32_bit_range() {
        let boundaries = [
            i32::MIN,
            i32::MIN + 1,
            -(1 << 28),
            -129,
            -1,
            0,
            1,
            127,
            128,
            16383,
            16384,
            (1 << 21) - 1,
            1 << 21,
            (1 << 28) - 1,
            1 << 28,
            i32::MAX - 1,
            i32::MAX,
        ];
        // Stride through the whole range, hitting every size class.
        let sweep = (i32::MIN..=i32::MAX).step_by(65_521);

        for x in boundaries.into_iter().chain(sweep) {
            let bytes = var_int(x.into(), 32).unwrap();
            assert!(bytes.len() <= 5, "{x} took {} bytes", bytes.len());
            assert_eq!(bytes.len(), var_int_size(x));

            let mut decoder = Decoder::new(&bytes);
            assert_eq!(decoder.read_var_int().unwrap(), x);
            assert!(decoder.is_finished());
        }
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(matches!(
            var_int(i64::from(i32::MAX) + 1, 32),
            Err(EncodeError::Range { .. })
        ));
        assert!(matches!(
            var_int(i64::from(i32::MIN) - 1, 32),
            Err(EncodeError::Range { .. })
        ));
        assert!(var_int(32767, 16).is_ok());
        assert!(var_int(-32768, 16).is_ok());
        assert!(matches!(
            var_int(32768, 16),
            Err(EncodeError::Range {
                value: 32768,
                min: -32768,
                max: 32768
            })
        ));
    }

    #[test]
    fn string_round_trip() {
        let long = "a".repeat(i16::MAX as usize);
        let mixed = "§aServer Down, Connect to Start ☕ 日本語";
        for s in ["", "Alice", mixed, long.as_str()] {
            let mut buf = Vec::new();
            Encoder::new(&mut buf).write_string(s).unwrap();

            let mut decoder = Decoder::new(&buf);
            assert_eq!(decoder.read_string().unwrap(), s);
            assert!(decoder.is_finished());
        }
    }

    #[test]
    fn string_length_is_limited_to_16_bits() {
        let too_long = "a".repeat(1 << 15);
        let mut buf = Vec::new();
        assert!(matches!(
            Encoder::new(&mut buf).write_string(&too_long),
            Err(EncodeError::Range { .. })
        ));
    }

    #[test]
    fn string_prefix_counts_bytes_not_chars() {
        let mut buf = Vec::new();
        Encoder::new(&mut buf).write_string("é").unwrap();
        assert_eq!(buf, [0x02, 0xc3, 0xa9]);
    }
}
