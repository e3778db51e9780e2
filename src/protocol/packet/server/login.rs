use minecraft_wake_proxy_macros::{Decode, Encode};
use uuid::Uuid;

#[derive(Debug, Clone, Encode, Decode, strum::AsRefStr)]
#[encoding(discriminant = "varint")]
pub enum Packet {
    #[encoding(id = 0x02)]
    LoginSuccess(LoginSuccess),
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct LoginSuccess {
    pub uuid: Uuid,
    pub username: String,
    #[encoding(length_prefix = "varint")]
    pub properties: Vec<Property>,
}

impl LoginSuccess {
    /// Login success for an unauthenticated player, with no
    /// profile properties.
    pub fn offline(username: String) -> Self {
        Self {
            uuid: offline_uuid(&username),
            username,
            properties: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Property {
    pub name: String,
    pub value: String,
    #[encoding(bool_prefixed)]
    pub signature: Option<String>,
}

/// The UUID an offline-mode server assigns to `username`.
///
/// Version 3 (MD5) over the DNS namespace with the name
/// `OfflinePlayer:<username>`.
pub fn offline_uuid(username: &str) -> Uuid {
    Uuid::new_v3(
        &Uuid::NAMESPACE_DNS,
        format!("OfflinePlayer:{username}").as_bytes(),
    )
}
