use minecraft_wake_proxy_macros::{Decode, Encode};

#[derive(Debug, Clone, Encode, Decode, strum::AsRefStr)]
#[encoding(discriminant = "varint")]
pub enum Packet {
    #[encoding(id = 0x00)]
    LoginStart(LoginStart),
    #[encoding(id = 0x01)]
    EncryptionResponse(EncryptionResponse),
    #[encoding(id = 0x02)]
    LoginPluginResponse(LoginPluginResponse),
    #[encoding(id = 0x03)]
    LoginAcknowledged(LoginAcknowledged),
    #[encoding(id = 0x04)]
    CookieResponse(CookieResponse),
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct LoginStart {
    pub username: String,
    /// The player's UUID on modern clients.
    #[encoding(length_prefix = "inferred")]
    pub ignored_data: Vec<u8>,
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct EncryptionResponse {
    #[encoding(length_prefix = "inferred")]
    pub ignored_data: Vec<u8>,
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct LoginPluginResponse {
    #[encoding(length_prefix = "inferred")]
    pub ignored_data: Vec<u8>,
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct LoginAcknowledged {}

#[derive(Debug, Clone, Encode, Decode)]
pub struct CookieResponse {
    #[encoding(length_prefix = "inferred")]
    pub ignored_data: Vec<u8>,
}
