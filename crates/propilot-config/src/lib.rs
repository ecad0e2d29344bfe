//! Layered TOML configuration for Propilot.
//!
//! Precedence, highest first: CLI flags, environment variables,
//! `~/.propilot/config.toml`, defaults.

use propilot_api::{DEFAULT_AUTH_BASE_URL, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
use propilot_types::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the settings file inside the config directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Where answers come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// Talk to the model directly.
    Gemini {
        api_key: String,
        base_url: String,
        model: String,
    },
    /// Forward messages to a chat relay that holds the key.
    Relay { url: String },
}

/// Identity provider settings. Absent means the session runs anonymously.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub api_key: String,
    pub base_url: String,
}

/// Resolved configuration for a Propilot session.
#[derive(Debug, Clone)]
pub struct PropilotConfig {
    pub backend: Backend,
    pub auth: Option<AuthConfig>,
    pub config_dir: PathBuf,
}

/// Settings read from the TOML config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub auth: AuthSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiSettings {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub relay_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthSettings {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

/// CLI overrides that take highest precedence.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub api_key: Option<String>,
    pub model: Option<String>,
}

impl PropilotConfig {
    /// Load configuration from the process environment and the config file.
    pub fn load(overrides: CliOverrides) -> Result<Self, ConfigError> {
        let config_dir = config_dir();
        let settings = match read_settings(&config_dir.join(CONFIG_FILE)) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("{e}");
                SettingsFile::default()
            }
        };
        Self::resolve(overrides, settings, config_dir, |key| std::env::var(key).ok())
    }

    /// Apply precedence rules. `env` looks up an environment variable.
    ///
    /// A relay URL wins over a Gemini key from the environment or the file.
    /// An explicit `--api-key` always selects Gemini.
    pub fn resolve(
        overrides: CliOverrides,
        settings: SettingsFile,
        config_dir: PathBuf,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let cli_key = overrides.api_key.filter(|key| !key.trim().is_empty());
        let relay_url = match cli_key {
            Some(_) => None,
            None => env("PROPILOT_RELAY_URL")
                .or(settings.api.relay_url)
                .filter(|url| !url.trim().is_empty()),
        };

        let backend = match relay_url {
            Some(url) => Backend::Relay {
                url: check_url("relay_url", url)?,
            },
            None => {
                let api_key = cli_key
                    .or_else(|| env("GEMINI_API_KEY"))
                    .or(settings.api.api_key)
                    .filter(|key| !key.trim().is_empty())
                    .ok_or_else(|| ConfigError::MissingKey {
                        key: "api_key (set GEMINI_API_KEY or PROPILOT_RELAY_URL, \
                              or add one to ~/.propilot/config.toml)"
                            .into(),
                    })?;
                let model = overrides
                    .model
                    .or_else(|| env("PROPILOT_MODEL"))
                    .or(settings.api.model)
                    .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());
                let base_url = env("PROPILOT_API_BASE_URL")
                    .or(settings.api.base_url)
                    .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string());
                Backend::Gemini {
                    api_key,
                    base_url: check_url("base_url", base_url)?,
                    model,
                }
            }
        };

        let auth = match env("FIREBASE_API_KEY")
            .or(settings.auth.api_key)
            .filter(|key| !key.trim().is_empty())
        {
            Some(api_key) => {
                let base_url = settings
                    .auth
                    .base_url
                    .unwrap_or_else(|| DEFAULT_AUTH_BASE_URL.to_string());
                Some(AuthConfig {
                    api_key,
                    base_url: check_url("auth.base_url", base_url)?,
                })
            }
            None => None,
        };

        Ok(PropilotConfig {
            backend,
            auth,
            config_dir,
        })
    }
}

fn check_url(key: &str, url: String) -> Result<String, ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url)
    } else {
        Err(ConfigError::InvalidValue {
            key: key.into(),
            message: format!("expected an http(s) URL, got '{url}'"),
        })
    }
}

/// Get the Propilot config directory path (~/.propilot/).
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PROPILOT_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".propilot")
}

/// Read a settings file. A missing file yields the defaults.
pub fn read_settings(path: &Path) -> Result<SettingsFile, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(SettingsFile::default()),
        Err(e) => {
            return Err(ConfigError::Parse {
                path: path.display().to_string(),
                message: e.to_string(),
            });
        }
    };
    toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn resolve(
        overrides: CliOverrides,
        settings: SettingsFile,
        env: &[(&str, &str)],
    ) -> Result<PropilotConfig, ConfigError> {
        PropilotConfig::resolve(overrides, settings, PathBuf::from("/tmp/p"), env_of(env))
    }

    #[test]
    fn default_settings_are_empty() {
        let settings = SettingsFile::default();
        assert!(settings.api.api_key.is_none());
        assert!(settings.api.relay_url.is_none());
        assert!(settings.auth.api_key.is_none());
    }

    #[test]
    fn settings_toml_parse() {
        let toml_str = r#"
[api]
model = "gemini-2.5-pro"
relay_url = "https://relay.example.com/chat"

[auth]
api_key = "fb-key"
"#;
        let settings: SettingsFile = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.api.model.as_deref(), Some("gemini-2.5-pro"));
        assert_eq!(
            settings.api.relay_url.as_deref(),
            Some("https://relay.example.com/chat")
        );
        assert_eq!(settings.auth.api_key.as_deref(), Some("fb-key"));
        assert!(settings.auth.base_url.is_none());
    }

    #[test]
    fn missing_backend_is_an_error() {
        let err = resolve(CliOverrides::default(), SettingsFile::default(), &[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey { .. }));
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let err = resolve(
            CliOverrides::default(),
            SettingsFile::default(),
            &[("GEMINI_API_KEY", "  ")],
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey { .. }));
    }

    #[test]
    fn gemini_defaults_fill_in() {
        let config = resolve(
            CliOverrides::default(),
            SettingsFile::default(),
            &[("GEMINI_API_KEY", "env-key")],
        )
        .unwrap();
        assert_eq!(
            config.backend,
            Backend::Gemini {
                api_key: "env-key".into(),
                base_url: DEFAULT_GEMINI_BASE_URL.into(),
                model: DEFAULT_GEMINI_MODEL.into(),
            }
        );
        assert!(config.auth.is_none());
        assert_eq!(config.config_dir, PathBuf::from("/tmp/p"));
    }

    #[test]
    fn cli_beats_env_beats_file() {
        let mut settings = SettingsFile::default();
        settings.api.api_key = Some("file-key".into());
        settings.api.model = Some("file-model".into());

        let config = resolve(
            CliOverrides {
                api_key: Some("cli-key".into()),
                model: None,
            },
            settings.clone(),
            &[("GEMINI_API_KEY", "env-key"), ("PROPILOT_MODEL", "env-model")],
        )
        .unwrap();
        let Backend::Gemini { api_key, model, .. } = config.backend else {
            panic!("expected gemini backend");
        };
        assert_eq!(api_key, "cli-key");
        assert_eq!(model, "env-model");

        let config = resolve(CliOverrides::default(), settings, &[]).unwrap();
        let Backend::Gemini { api_key, model, .. } = config.backend else {
            panic!("expected gemini backend");
        };
        assert_eq!(api_key, "file-key");
        assert_eq!(model, "file-model");
    }

    #[test]
    fn relay_wins_over_env_key() {
        let config = resolve(
            CliOverrides::default(),
            SettingsFile::default(),
            &[
                ("GEMINI_API_KEY", "env-key"),
                ("PROPILOT_RELAY_URL", "http://localhost:8787/chat"),
            ],
        )
        .unwrap();
        assert_eq!(
            config.backend,
            Backend::Relay {
                url: "http://localhost:8787/chat".into()
            }
        );
    }

    #[test]
    fn cli_key_beats_configured_relay() {
        let mut settings = SettingsFile::default();
        settings.api.relay_url = Some("https://relay.example.com/chat".into());
        let config = resolve(
            CliOverrides {
                api_key: Some("cli-key".into()),
                model: None,
            },
            settings,
            &[("PROPILOT_RELAY_URL", "http://localhost:8787/chat")],
        )
        .unwrap();
        let Backend::Gemini { api_key, .. } = config.backend else {
            panic!("expected gemini backend");
        };
        assert_eq!(api_key, "cli-key");
    }

    #[test]
    fn non_http_url_is_rejected() {
        let err = resolve(
            CliOverrides::default(),
            SettingsFile::default(),
            &[("PROPILOT_RELAY_URL", "ftp://nope")],
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "relay_url"));
    }

    #[test]
    fn auth_enabled_by_firebase_key() {
        let mut settings = SettingsFile::default();
        settings.auth.base_url = Some("http://127.0.0.1:9099".into());
        let config = resolve(
            CliOverrides::default(),
            settings,
            &[("GEMINI_API_KEY", "k"), ("FIREBASE_API_KEY", "fb")],
        )
        .unwrap();
        assert_eq!(
            config.auth,
            Some(AuthConfig {
                api_key: "fb".into(),
                base_url: "http://127.0.0.1:9099".into(),
            })
        );
    }

    #[test]
    fn read_settings_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let settings = read_settings(&dir.path().join(CONFIG_FILE)).unwrap();
        assert!(settings.api.api_key.is_none());
    }

    #[test]
    fn read_settings_reports_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[api\nmodel = ").unwrap();
        let err = read_settings(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn read_settings_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[api]\napi_key = \"disk-key\"\n").unwrap();
        let settings = read_settings(&path).unwrap();
        assert_eq!(settings.api.api_key.as_deref(), Some("disk-key"));
    }
}
