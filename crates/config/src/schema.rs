use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root of `courier.{toml,yaml,yml,json}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CourierConfig {
    pub matrix: MatrixConfig,
    pub media: MediaConfig,
}

/// Account the bot posts as. Login happens elsewhere; only the issued
/// access token is used.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixConfig {
    /// Base URL of the homeserver, e.g. `https://matrix.example.org`.
    pub homeserver: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,

    #[serde(serialize_with = "serialize_secret")]
    pub access_token: Secret<String>,

    /// Room used when a send names none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            homeserver: String::new(),
            user_id: None,
            device_id: None,
            access_token: Secret::new(String::new()),
            room_id: None,
        }
    }
}

impl std::fmt::Debug for MatrixConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatrixConfig")
            .field("homeserver", &self.homeserver)
            .field("user_id", &self.user_id)
            .field("device_id", &self.device_id)
            .field("access_token", &"[REDACTED]")
            .field("room_id", &self.room_id)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MediaConfig {
    /// Report the downloaded body length as the size of remote media served
    /// without `Content-Length`, instead of `0`.
    pub measure_missing_content_length: bool,
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_token() {
        let config = MatrixConfig {
            access_token: Secret::new("syt_super_secret".into()),
            ..Default::default()
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("syt_super_secret"));
    }

    #[test]
    fn token_survives_toml_round_trip() {
        let config: CourierConfig = toml::from_str(
            r#"
[matrix]
homeserver = "https://matrix.example.org"
access_token = "syt_abc"
room_id = "!room:example.org"
"#,
        )
        .unwrap();
        let written = toml::to_string(&config).unwrap();
        let reread: CourierConfig = toml::from_str(&written).unwrap();
        assert_eq!(reread.matrix.access_token.expose_secret(), "syt_abc");
        assert_eq!(reread.matrix.room_id.as_deref(), Some("!room:example.org"));
        assert!(!reread.media.measure_missing_content_length);
    }
}
