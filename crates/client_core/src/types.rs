use chrono::{DateTime, NaiveDateTime};
use shared::protocol::{InstanceStatus, InstanceStatusResponse, UnavailableReason};

/// What the client believes about the learner's sandbox after one status
/// fetch. Replaced wholesale on every successful fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceRecord {
    pub exists: bool,
    pub running: bool,
    pub status: Option<InstanceStatus>,
    /// Present iff `exists && running`.
    pub url: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    /// Only set when `exists` is false.
    pub unavailable_reason: Option<UnavailableReason>,
}

impl InstanceRecord {
    pub fn absent() -> Self {
        Self {
            exists: false,
            running: false,
            status: None,
            url: None,
            created_at: None,
            unavailable_reason: None,
        }
    }

    /// A record that exists but whose container is not alive.
    pub fn is_orphaned(&self) -> bool {
        self.exists && !self.running
    }

    pub fn container_died(&self) -> bool {
        !self.exists && self.unavailable_reason == Some(UnavailableReason::ContainerNotRunning)
    }
}

impl From<InstanceStatusResponse> for InstanceRecord {
    fn from(value: InstanceStatusResponse) -> Self {
        // Backends that predate the status column only report live rows.
        let running = value.exists
            && value
                .status
                .map_or(true, |status| status == InstanceStatus::Running);
        let url = if running {
            value.url.filter(|url| !url.trim().is_empty())
        } else {
            None
        };
        Self {
            exists: value.exists,
            running,
            status: value.status,
            url,
            created_at: value.created_at.as_deref().and_then(parse_created_at),
            unavailable_reason: if value.exists { None } else { value.reason },
        }
    }
}

/// Accepts RFC 3339 as well as the naive ISO-8601 stamps the backend writes.
pub fn parse_created_at(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.naive_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_url_unless_running() {
        let starting = InstanceRecord::from(
            InstanceStatusResponse::running("http://lab:3001").with_status(InstanceStatus::Starting),
        );
        assert!(starting.is_orphaned());
        assert_eq!(starting.url, None);

        let gone = InstanceRecord::from(InstanceStatusResponse {
            exists: false,
            url: Some("http://lab:3001".into()),
            ..Default::default()
        });
        assert_eq!(gone.url, None);
        assert!(!gone.running);
    }

    #[test]
    fn missing_status_counts_as_running() {
        let record = InstanceRecord::from(InstanceStatusResponse {
            exists: true,
            url: Some("http://lab:3002".into()),
            ..Default::default()
        });
        assert!(record.running);
        assert_eq!(record.url.as_deref(), Some("http://lab:3002"));
    }

    #[test]
    fn reason_only_kept_for_missing_instances() {
        let record = InstanceRecord::from(
            InstanceStatusResponse::running("http://lab:3003")
                .with_reason(UnavailableReason::ContainerNotRunning),
        );
        assert_eq!(record.unavailable_reason, None);

        let record = InstanceRecord::from(
            InstanceStatusResponse::missing().with_reason(UnavailableReason::ContainerNotRunning),
        );
        assert!(record.container_died());
    }

    #[test]
    fn parses_backend_timestamps() {
        assert!(parse_created_at("2024-03-01T10:15:00.123456").is_some());
        assert!(parse_created_at("2024-03-01T10:15:00Z").is_some());
        assert!(parse_created_at("2024-03-01 10:15:00").is_some());
        assert!(parse_created_at("yesterday").is_none());
    }
}
