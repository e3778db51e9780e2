use minecraft_wake_proxy_macros::{Decode, Encode};

#[derive(Debug, Clone, Encode, Decode, strum::AsRefStr)]
#[encoding(discriminant = "varint")]
pub enum Packet {
    #[encoding(id = 0x04)]
    KeepAlive(KeepAlive),
    #[encoding(id = 0x0B)]
    Transfer(Transfer),
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct KeepAlive {
    pub id: i64,
}

/// Tells the client to reconnect to another server.
#[derive(Debug, Clone, Encode, Decode)]
pub struct Transfer {
    pub host: String,
    #[encoding(varint)]
    pub port: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Decode, DecodeError, Decoder, Encode, Encoder};

    fn encode(packet: Packet) -> Vec<u8> {
        let mut buf = Vec::new();
        packet.encode(&mut Encoder::new(&mut buf)).unwrap();
        buf
    }

    #[test]
    fn transfer_layout() {
        let bytes = encode(Packet::Transfer(Transfer {
            host: "10.0.0.1".to_owned(),
            port: 25565,
        }));
        let mut expected = vec![0x0b, 0x08];
        expected.extend_from_slice(b"10.0.0.1");
        expected.extend_from_slice(&[0xdd, 0xc7, 0x01]);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn keep_alive_layout() {
        let bytes = encode(Packet::KeepAlive(KeepAlive { id: -2 }));
        assert_eq!(bytes, [0x04, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe]);
    }

    #[test]
    fn only_keep_alive_and_transfer_are_known() {
        // Finish Configuration is never sent by the proxy.
        let error = Packet::decode(&mut Decoder::new(&[0x03])).unwrap_err();
        assert!(matches!(
            error,
            DecodeError::UnknownDiscriminant { value: 3, .. }
        ));
    }
}
