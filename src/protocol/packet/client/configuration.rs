use minecraft_wake_proxy_macros::{Decode, Encode};

#[derive(Debug, Clone, Encode, Decode, strum::AsRefStr)]
#[encoding(discriminant = "varint")]
pub enum Packet {
    #[encoding(id = 0x00)]
    ClientInformation(ClientInformation),
    #[encoding(id = 0x01)]
    CookieResponse(CookieResponse),
    #[encoding(id = 0x02)]
    PluginMessage(PluginMessage),
    #[encoding(id = 0x03)]
    AcknowledgeFinishConfiguration(AcknowledgeFinishConfiguration),
    #[encoding(id = 0x04)]
    KeepAlive(KeepAlive),
    #[encoding(id = 0x05)]
    Pong(Pong),
    #[encoding(id = 0x06)]
    ResourcePackResponse(ResourcePackResponse),
    #[encoding(id = 0x07)]
    KnownPacks(KnownPacks),
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct ClientInformation {
    #[encoding(length_prefix = "inferred")]
    pub ignored_data: Vec<u8>,
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct CookieResponse {
    #[encoding(length_prefix = "inferred")]
    pub ignored_data: Vec<u8>,
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct PluginMessage {
    #[encoding(length_prefix = "inferred")]
    pub ignored_data: Vec<u8>,
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct AcknowledgeFinishConfiguration {}

#[derive(Debug, Clone, Encode, Decode)]
pub struct KeepAlive {
    pub id: i64,
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct Pong {
    #[encoding(length_prefix = "inferred")]
    pub ignored_data: Vec<u8>,
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct ResourcePackResponse {
    #[encoding(length_prefix = "inferred")]
    pub ignored_data: Vec<u8>,
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct KnownPacks {
    #[encoding(length_prefix = "inferred")]
    pub ignored_data: Vec<u8>,
}
