use std::{fs, path::Path, time::Duration};

use anyhow::bail;
use client_core::{PollingPolicy, SessionConfig};
use shared::domain::SessionIds;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub launch_id: Option<String>,
    pub user_id: Option<String>,
    pub assignment_id: Option<String>,
    pub instance_refresh_secs: u64,
    pub challenge_refresh_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        let polling = PollingPolicy::default();
        Self {
            server_url: "http://127.0.0.1:5000".into(),
            launch_id: None,
            user_id: None,
            assignment_id: None,
            instance_refresh_secs: polling.instance_refresh.as_secs(),
            challenge_refresh_secs: polling.challenge_refresh.as_secs(),
        }
    }
}

impl Settings {
    pub fn into_session_config(self) -> anyhow::Result<SessionConfig> {
        let Some(launch_id) = non_empty(self.launch_id) else {
            bail!("launch_id is required (lab_console.toml, LAB_LAUNCH_ID or --launch-id)");
        };
        let Some(user_id) = non_empty(self.user_id) else {
            bail!("user_id is required (lab_console.toml, LAB_USER_ID or --user-id)");
        };
        let Some(assignment_id) = non_empty(self.assignment_id) else {
            bail!("assignment_id is required (lab_console.toml, LAB_ASSIGNMENT_ID or --assignment-id)");
        };
        if self.instance_refresh_secs == 0 || self.challenge_refresh_secs == 0 {
            bail!("refresh intervals must be at least one second");
        }

        let mut config = SessionConfig::new(
            self.server_url,
            SessionIds::new(launch_id, user_id, assignment_id),
        );
        config.polling.instance_refresh = Duration::from_secs(self.instance_refresh_secs);
        config.polling.challenge_refresh = Duration::from_secs(self.challenge_refresh_secs);
        Ok(config)
    }
}

pub fn load_settings(path: &Path) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());

    settings
}

pub(crate) fn apply_file(settings: &mut Settings, raw: &str) {
    let table = match toml::from_str::<toml::Table>(raw) {
        Ok(table) => table,
        Err(err) => {
            warn!(error = %err, "ignoring unreadable settings file");
            return;
        }
    };
    let get = |key: &str| -> Option<String> {
        match table.get(key)? {
            toml::Value::String(v) => Some(v.clone()),
            toml::Value::Integer(v) => Some(v.to_string()),
            _ => None,
        }
    };

    if let Some(v) = get("server_url") {
        settings.server_url = v;
    }
    if let Some(v) = get("launch_id") {
        settings.launch_id = Some(v);
    }
    if let Some(v) = get("user_id") {
        settings.user_id = Some(v);
    }
    if let Some(v) = get("assignment_id") {
        settings.assignment_id = Some(v);
    }
    if let Some(v) = get("instance_refresh_secs").and_then(|v| v.parse().ok()) {
        settings.instance_refresh_secs = v;
    }
    if let Some(v) = get("challenge_refresh_secs").and_then(|v| v.parse().ok()) {
        settings.challenge_refresh_secs = v;
    }
}

pub(crate) fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    let either = |short: &str, long: &str| var(long).or_else(|| var(short));

    if let Some(v) = either("LAB_SERVER_URL", "APP__SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = either("LAB_LAUNCH_ID", "APP__LAUNCH_ID") {
        settings.launch_id = Some(v);
    }
    if let Some(v) = either("LAB_USER_ID", "APP__USER_ID") {
        settings.user_id = Some(v);
    }
    if let Some(v) = either("LAB_ASSIGNMENT_ID", "APP__ASSIGNMENT_ID") {
        settings.assignment_id = Some(v);
    }
    if let Some(v) = var("APP__INSTANCE_REFRESH_SECS").and_then(|v| v.parse().ok()) {
        settings.instance_refresh_secs = v;
    }
    if let Some(v) = var("APP__CHALLENGE_REFRESH_SECS").and_then(|v| v.parse().ok()) {
        settings.challenge_refresh_secs = v;
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
