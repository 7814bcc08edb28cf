use std::{fs, path::Path};

use anyhow::Context;
use serde::Deserialize;
use shared::domain::SessionId;

pub const SETTINGS_FILE: &str = "page_state.toml";

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub session_id: Option<SessionId>,
    pub log_filter: String,
    pub resources: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://./data/page_state.db".into(),
            session_id: None,
            log_filter: "info".into(),
            resources: vec!["apiservice".into(), "webfrontend".into(), "cache".into()],
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    database_url: Option<String>,
    session_id: Option<SessionId>,
    log_filter: Option<String>,
    resources: Option<Vec<String>>,
}

pub fn load_settings() -> anyhow::Result<Settings> {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then the settings file (if present), then environment variables.
pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
        let file_cfg: FileSettings = toml::from_str(&raw)
            .with_context(|| format!("invalid settings file '{}'", path.display()))?;
        if let Some(v) = file_cfg.database_url {
            settings.database_url = v;
        }
        if let Some(v) = file_cfg.session_id {
            settings.session_id = Some(v);
        }
        if let Some(v) = file_cfg.log_filter {
            settings.log_filter = v;
        }
        if let Some(v) = file_cfg.resources {
            settings.resources = v;
        }
    }

    if let Some(v) = env("PAGE_STATE_DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = env("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = env("APP__SESSION_ID") {
        let session_id = v
            .parse()
            .with_context(|| format!("APP__SESSION_ID is not a session id: '{v}'"))?;
        settings.session_id = Some(session_id);
    }

    if let Some(v) = env("APP__LOG_FILTER") {
        settings.log_filter = v;
    }

    if let Some(v) = env("APP__RESOURCES") {
        settings.resources = split_resources(&v);
    }

    Ok(settings)
}

fn split_resources(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
