use std::time::Duration;

use shared::domain::SessionIds;

/// Every timer the controllers run, in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingPolicy {
    pub instance_refresh: Duration,
    pub challenge_refresh: Duration,
    pub provisioning_interval: Duration,
    pub provisioning_ceiling: Duration,
    pub restart_follow_up: Duration,
    pub shutdown_follow_up: Duration,
    pub notification: Duration,
}

impl Default for PollingPolicy {
    fn default() -> Self {
        Self {
            instance_refresh: Duration::from_secs(30),
            challenge_refresh: Duration::from_secs(5),
            provisioning_interval: Duration::from_secs(5),
            provisioning_ceiling: Duration::from_secs(300),
            restart_follow_up: Duration::from_secs(5),
            shutdown_follow_up: Duration::from_secs(2),
            notification: Duration::from_millis(3000),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub server_url: String,
    pub ids: SessionIds,
    pub polling: PollingPolicy,
}

impl SessionConfig {
    pub fn new(server_url: impl Into<String>, ids: SessionIds) -> Self {
        Self {
            server_url: server_url.into(),
            ids,
            polling: PollingPolicy::default(),
        }
    }
}
