use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;

use crate::api::parse_base_url;

pub const DEFAULT_CONFIG_FILE: &str = "workforce.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub api_base_url: String,
    pub session_database_url: String,
    pub request_timeout_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8080/api/".into(),
            session_database_url: "sqlite://./data/session.db".into(),
            request_timeout_secs: 30,
        }
    }
}

impl ClientSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    session_database_url: Option<String>,
    request_timeout_secs: Option<u64>,
}

/// Defaults, then the config file if it exists, then `APP__*` variables.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<ClientSettings> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    let mut settings = ClientSettings::default();

    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let file_cfg: FileSettings = toml::from_str(&raw)
            .with_context(|| format!("invalid config file '{}'", path.display()))?;
        if let Some(v) = file_cfg.api_base_url {
            settings.api_base_url = v;
        }
        if let Some(v) = file_cfg.session_database_url {
            settings.session_database_url = v;
        }
        if let Some(v) = file_cfg.request_timeout_secs {
            settings.request_timeout_secs = v;
        }
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    finish(settings)
}

fn apply_env_overrides(settings: &mut ClientSettings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = var("APP__SESSION_DATABASE_URL") {
        settings.session_database_url = v;
    }
    if let Some(v) = var("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }
}

fn finish(mut settings: ClientSettings) -> anyhow::Result<ClientSettings> {
    parse_base_url(&settings.api_base_url).context("invalid api_base_url")?;
    settings.session_database_url = normalize_database_url(&settings.session_database_url);
    if settings.request_timeout_secs == 0 {
        settings.request_timeout_secs = ClientSettings::default().request_timeout_secs;
    }
    Ok(settings)
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return ClientSettings::default().session_database_url;
    }

    if raw_database_url.starts_with("sqlite:") || raw_database_url.contains("://") {
        return raw_database_url.to_string();
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn normalizes_plain_file_path_to_sqlite_url() {
        assert_eq!(
            normalize_database_url("./data/test.db"),
            "sqlite://./data/test.db"
        );
        assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(
            normalize_database_url(" "),
            ClientSettings::default().session_database_url
        );
    }

    #[test]
    fn env_overrides_win_over_defaults() {
        let vars = HashMap::from([
            ("APP__API_BASE_URL", "https://api.example.com/v1"),
            ("APP__REQUEST_TIMEOUT_SECS", "5"),
        ]);
        let mut settings = ClientSettings::default();
        apply_env_overrides(&mut settings, |key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(settings.api_base_url, "https://api.example.com/v1");
        assert_eq!(settings.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn only_app_prefixed_variables_apply() {
        let vars = HashMap::from([("WORKFORCE_API_URL", "https://other.example.com/")]);
        let mut settings = ClientSettings::default();
        apply_env_overrides(&mut settings, |key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(settings, ClientSettings::default());
    }

    #[test]
    fn ignores_unparseable_timeout() {
        let mut settings = ClientSettings::default();
        apply_env_overrides(&mut settings, |key| {
            (key == "APP__REQUEST_TIMEOUT_SECS").then(|| "soon".to_string())
        });
        assert_eq!(settings.request_timeout_secs, 30);
    }

    #[test]
    fn reads_config_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("workforce.toml");
        fs::write(
            &path,
            "api_base_url = \"https://hq.example.org/api\"\nsession_database_url = \"state/session.db\"\nrequest_timeout_secs = 0\n",
        )
        .expect("write");

        let settings = load_settings(Some(&path)).expect("settings");
        if std::env::var("APP__API_BASE_URL").is_err() {
            assert_eq!(settings.api_base_url, "https://hq.example.org/api");
        }
        if std::env::var("APP__SESSION_DATABASE_URL").is_err() {
            assert_eq!(settings.session_database_url, "sqlite://state/session.db");
        }
        if std::env::var("APP__REQUEST_TIMEOUT_SECS").is_err() {
            assert_eq!(settings.request_timeout_secs, 30);
        }
    }

    #[test]
    fn rejects_non_http_base_url() {
        let settings = ClientSettings {
            api_base_url: "ftp://example.com".into(),
            ..ClientSettings::default()
        };
        assert!(finish(settings).is_err());
    }
}
