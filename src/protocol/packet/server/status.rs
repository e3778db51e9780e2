use minecraft_wake_proxy_macros::{Decode, Encode};

#[derive(Debug, Clone, Encode, Decode, strum::AsRefStr)]
#[encoding(discriminant = "varint")]
pub enum Packet {
    #[encoding(id = 0x00)]
    StatusResponse(StatusResponse),
    #[encoding(id = 0x01)]
    PongResponse(PongResponse),
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct StatusResponse {
    /// Serialized [`ServerStatus`](crate::status::ServerStatus).
    pub json: String,
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct PongResponse {
    pub payload: i64,
}
