//! Configuration management
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! environment variables prefixed `NEGOTIATOR__` (for example
//! `NEGOTIATOR__LOGGING__LEVEL=debug`).

use crate::domain::negotiation::health::HealthEvent;
use crate::domain::negotiation::session::SessionConfig;
use crate::domain::negotiation::value_object::{
    IceCandidate, IceServer, MediaConstraints, MediaMode,
};
use crate::domain::shared::error::NegotiationError;
use crate::domain::shared::result::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const ENV_PREFIX: &str = "NEGOTIATOR";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub negotiation: NegotiationSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Defaults applied to every session built from these settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationSettings {
    #[serde(default = "IceServer::default_servers")]
    pub ice_servers: Vec<IceServer>,
    #[serde(default)]
    pub simulcast: bool,
    #[serde(default)]
    pub mode: MediaMode,
}

impl Default for NegotiationSettings {
    fn default() -> Self {
        Self {
            ice_servers: IceServer::default_servers(),
            simulcast: false,
            mode: MediaMode::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, overridden by `RUST_LOG` when set
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl Settings {
    /// Load settings, optionally reading a TOML file first
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }

        let settings: Settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| NegotiationError::Configuration(e.to_string()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)
            .map_err(|e| NegotiationError::Configuration(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        for server in &self.negotiation.ice_servers {
            if server.urls.is_empty() || server.urls.iter().any(|url| url.trim().is_empty()) {
                return Err(NegotiationError::Configuration(
                    "ICE server with empty url".to_string(),
                ));
            }
            if server.is_turn() && (server.username.is_none() || server.credential.is_none()) {
                return Err(NegotiationError::Configuration(format!(
                    "TURN server {} requires username and credential",
                    server.urls.join(",")
                )));
            }
        }
        Ok(())
    }
}

impl SessionConfig {
    /// Seed a session configuration from loaded settings
    pub fn from_settings<C, E>(
        settings: &NegotiationSettings,
        media_constraints: MediaConstraints,
        on_ice_candidate: C,
        on_connectivity_exception: E,
    ) -> Self
    where
        C: Fn(&IceCandidate) + Send + Sync + 'static,
        E: Fn(&HealthEvent) + Send + Sync + 'static,
    {
        SessionConfig::new(
            media_constraints,
            settings.simulcast,
            on_ice_candidate,
            on_connectivity_exception,
        )
        .with_mode(settings.mode)
        .with_ice_servers(settings.ice_servers.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.negotiation.ice_servers, IceServer::default_servers());
        assert!(!settings.negotiation.simulcast);
        assert_eq!(settings.negotiation.mode, MediaMode::SendReceive);
        assert_eq!(settings.logging.level, "info");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_settings_from_toml() {
        let toml = r#"
[negotiation]
simulcast = true
mode = "receive-only"

[[negotiation.ice_servers]]
urls = ["turn:turn.example.com:3478"]
username = "alice"
credential = "secret"

[logging]
level = "negotiator=debug"
format = "compact"
"#;

        let settings = Settings::from_toml(toml).unwrap();
        assert!(settings.negotiation.simulcast);
        assert_eq!(settings.negotiation.mode, MediaMode::ReceiveOnly);
        assert_eq!(
            settings.negotiation.ice_servers,
            vec![IceServer::turn("turn:turn.example.com:3478", "alice", "secret")]
        );
        assert_eq!(settings.logging.format, LogFormat::Compact);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let settings = Settings::from_toml("[logging]\nlevel = \"warn\"\n").unwrap();
        assert_eq!(settings.negotiation, NegotiationSettings::default());
        assert_eq!(settings.logging.level, "warn");
    }

    #[test]
    fn test_turn_without_credentials_rejected() {
        let mut settings = Settings::default();
        settings.negotiation.ice_servers = vec![IceServer {
            urls: vec!["turns:turn.example.com:5349".to_string()],
            username: Some("alice".to_string()),
            credential: None,
        }];

        let err = settings.validate().unwrap_err();
        assert!(matches!(err, NegotiationError::Configuration(_)));
    }

    #[test]
    fn test_empty_url_rejected() {
        let mut settings = Settings::default();
        settings.negotiation.ice_servers = vec![IceServer::stun("  ")];
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_reads_toml_file() {
        let path = std::env::temp_dir().join(format!("negotiator-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[negotiation]\nmode = \"send-only\"\n").unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(settings.negotiation.mode, MediaMode::SendOnly);
        assert_eq!(settings.negotiation.ice_servers, IceServer::default_servers());
    }

    #[test]
    fn test_load_missing_file_fails() {
        let err = Settings::load(Some(Path::new("/nonexistent/negotiator.toml"))).unwrap_err();
        assert!(matches!(err, NegotiationError::Configuration(_)));
    }

    #[test]
    fn test_session_config_from_settings() {
        let settings = NegotiationSettings {
            ice_servers: vec![IceServer::stun("stun:stun.example.com:3478")],
            simulcast: true,
            mode: MediaMode::ReceiveOnly,
        };

        let (session, _) =
            SessionConfig::from_settings(&settings, MediaConstraints::audio_only(), |_| {}, |_| {})
                .into_session();

        assert_eq!(session.mode(), MediaMode::ReceiveOnly);
        assert!(session.simulcast_enabled());
        assert_eq!(session.ice_servers(), settings.ice_servers.as_slice());
    }
}
