//! The status descriptor shown in the client's server list.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Version advertised by the placeholder status.
pub const OFFLINE_VERSION_NAME: &str = "1.21.5";
pub const OFFLINE_PROTOCOL_VERSION: i32 = 770;

pub const DEFAULT_MOTD: &str = "§aServer Down, Connect to Start";

/// Status JSON as sent in a Status Response.
///
/// Fields this proxy does not model are kept in `extra`, so a status
/// mirrored from the backend reaches the client unchanged. Every field is
/// optional: what a server leaves out is not added back when mirroring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub players: Option<Players>,
    /// Either a plain string or a text component.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    #[serde(
        rename = "enforcesSecureChat",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub enforces_secure_chat: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub name: String,
    pub protocol: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Players {
    pub max: i32,
    pub online: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample: Option<Vec<PlayerSample>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSample {
    pub name: String,
    pub id: String,
}

impl ServerStatus {
    /// Placeholder shown while the backend is asleep.
    pub fn offline(motd: &str) -> Self {
        Self {
            version: Some(Version {
                name: OFFLINE_VERSION_NAME.to_owned(),
                protocol: OFFLINE_PROTOCOL_VERSION,
            }),
            players: Some(Players {
                max: 1,
                online: 0,
                sample: None,
            }),
            description: Some(serde_json::json!({ "text": motd })),
            favicon: None,
            enforces_secure_chat: None,
            extra: Map::new(),
        }
    }

    /// Parses a status sent by a server.
    ///
    /// Any JSON object is accepted. If a known field has an unexpected
    /// shape, the whole object is kept untyped in `extra` so it is still
    /// mirrored verbatim.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let object: Map<String, Value> = serde_json::from_str(json)?;
        match serde_json::from_value(Value::Object(object.clone())) {
            Ok(status) => Ok(status),
            Err(e) => {
                tracing::debug!("Keeping status untyped: {e}");
                Ok(Self {
                    version: None,
                    players: None,
                    description: None,
                    favicon: None,
                    enforces_secure_chat: None,
                    extra: object,
                })
            }
        }
    }

    /// Plain text of the description, ignoring formatting and `extra` children.
    pub fn description_text(&self) -> Option<&str> {
        match self.description.as_ref()? {
            Value::String(text) => Some(text),
            Value::Object(component) => component.get("text").and_then(Value::as_str),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_placeholder_json() {
        let json = serde_json::to_value(ServerStatus::offline(DEFAULT_MOTD)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "version": {"name": "1.21.5", "protocol": 770},
                "players": {"max": 1, "online": 0},
                "description": {"text": "§aServer Down, Connect to Start"},
            })
        );
    }

    #[test]
    fn mirrored_status_keeps_unknown_fields() {
        let backend = r#"{
            "version": {"name": "Paper 1.21.5", "protocol": 770},
            "players": {"max": 20, "online": 1, "sample": [{"name": "Alice", "id": "9c3ea9af-60a3-35b9-b037-8c93d26d0168"}]},
            "description": "A Minecraft Server",
            "enforcesSecureChat": true,
            "preventsChatReports": false,
            "modinfo": {"type": "FML", "modList": []}
        }"#;
        let status: ServerStatus = serde_json::from_str(backend).unwrap();
        assert_eq!(status.players.as_ref().unwrap().online, 1);
        assert_eq!(status.description_text(), Some("A Minecraft Server"));
        assert_eq!(status.enforces_secure_chat, Some(true));
        assert!(status.extra.contains_key("modinfo"));

        let reserialized: Value = serde_json::to_value(&status).unwrap();
        let original: Value = serde_json::from_str(backend).unwrap();
        assert_eq!(reserialized, original);
    }

    #[test]
    fn missing_fields_stay_missing() {
        for backend in [
            r#"{"version": {"name": "1.21.5", "protocol": 770}, "description": {"text": "up"}}"#,
            r#"{"version": {"name": "1.21.5", "protocol": 770}, "players": {"max": 5, "online": 0}}"#,
            r#"{}"#,
        ] {
            let status: ServerStatus = serde_json::from_str(backend).unwrap();
            let reserialized = serde_json::to_value(&status).unwrap();
            let original: Value = serde_json::from_str(backend).unwrap();
            assert_eq!(reserialized, original, "{backend}");
        }
    }

    #[test]
    fn oddly_shaped_status_is_mirrored_untyped() {
        let backend = r#"{"version": "1.21.5", "players": {"max": "lots"}, "description": "hi"}"#;
        let status = ServerStatus::from_json(backend).unwrap();
        assert_eq!(status.version, None);
        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            serde_json::from_str::<Value>(backend).unwrap()
        );
    }

    #[test]
    fn from_json_requires_an_object() {
        assert!(ServerStatus::from_json("{not json").is_err());
        assert!(ServerStatus::from_json("[1, 2]").is_err());
        assert!(ServerStatus::from_json("{}").is_ok());
    }

    #[test]
    fn description_text_without_description() {
        let status: ServerStatus = serde_json::from_str(r#"{"players": {"max": 1, "online": 0}}"#).unwrap();
        assert_eq!(status.description_text(), None);
    }
}
