use serde::{Deserialize, Serialize};

use crate::{domain::ChallengeId, error::DomainFailure};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    Running,
    Starting,
    Stopped,
    Expired,
    #[serde(other)]
    Unknown,
}

/// Why a previously provisioned instance is no longer available.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UnavailableReason {
    ContainerNotRunning,
    #[serde(other)]
    Other,
}

/// Body of `GET /api/instance-status/{launch}/{user}`. The backend returns the
/// whole instance row, so unknown fields are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstanceStatusResponse {
    #[serde(default)]
    pub exists: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<InstanceStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<UnavailableReason>,
}

impl InstanceStatusResponse {
    pub fn running(url: impl Into<String>) -> Self {
        Self {
            exists: true,
            url: Some(url.into()),
            status: Some(InstanceStatus::Running),
            created_at: None,
            reason: None,
        }
    }

    pub fn missing() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: InstanceStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_reason(mut self, reason: UnavailableReason) -> Self {
        self.reason = Some(reason);
        self
    }
}

/// Body of the create/restart/shutdown provisioning commands.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CommandResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }

    pub fn into_result(self, fallback: &str) -> Result<Self, DomainFailure> {
        if self.success {
            Ok(self)
        } else {
            Err(DomainFailure::new(self.message, fallback))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChallengeRecord {
    pub id: ChallengeId,
    pub name: String,
    #[serde(default)]
    pub difficulty: u8,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Challenge catalog or completion snapshot. Counts are server-authoritative
/// and are never recomputed from `challenges`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChallengeSet {
    #[serde(default)]
    pub challenges: Vec<ChallengeRecord>,
    #[serde(default)]
    pub completed: u32,
    #[serde(default)]
    pub total: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScoreResponse {
    pub fn into_result(self) -> Result<(), DomainFailure> {
        if self.success {
            Ok(())
        } else {
            Err(DomainFailure::new(self.error, "score was not accepted"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_status_ignores_row_columns_and_unknown_status() {
        let raw = r#"{
            "exists": true,
            "id": 7,
            "container_id": "abc123",
            "port": 3011,
            "status": "paused",
            "url": "http://10.0.0.4:3011",
            "created_at": "2024-03-01T10:15:00.123456"
        }"#;
        let parsed: InstanceStatusResponse = serde_json::from_str(raw).expect("parse");
        assert!(parsed.exists);
        assert_eq!(parsed.status, Some(InstanceStatus::Unknown));
        assert_eq!(parsed.url.as_deref(), Some("http://10.0.0.4:3011"));
        assert_eq!(parsed.reason, None);
    }

    #[test]
    fn instance_status_reads_container_reason() {
        let parsed: InstanceStatusResponse =
            serde_json::from_str(r#"{"exists": false, "reason": "ContainerNotRunning"}"#)
                .expect("parse");
        assert!(!parsed.exists);
        assert_eq!(parsed.reason, Some(UnavailableReason::ContainerNotRunning));

        let other: InstanceStatusResponse =
            serde_json::from_str(r#"{"exists": false, "reason": "Expired"}"#).expect("parse");
        assert_eq!(other.reason, Some(UnavailableReason::Other));
    }

    #[test]
    fn rejected_command_falls_back_when_message_blank() {
        let failure = CommandResponse::rejected("  ")
            .into_result("Failed to create instance")
            .expect_err("rejected");
        assert_eq!(failure.message, "Failed to create instance");
        assert!(!failure.server_supplied);

        let failure = CommandResponse::rejected("User already has a running instance")
            .into_result("Failed to create instance")
            .expect_err("rejected");
        assert_eq!(failure.message, "User already has a running instance");
        assert!(failure.server_supplied);
    }

    #[test]
    fn challenge_set_defaults_missing_counts() {
        let parsed: ChallengeSet = serde_json::from_str(
            r#"{"challenges": [{"id": 3, "name": "Score Board", "difficulty": 1}]}"#,
        )
        .expect("parse");
        assert_eq!(parsed.completed, 0);
        assert_eq!(parsed.total, 0);
        assert!(!parsed.challenges[0].completed);
        assert_eq!(parsed.challenges[0].id, ChallengeId(3));
    }
}
