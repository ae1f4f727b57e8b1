//! HTTP contract with the lab backend.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::SessionIds,
    error::ErrorBody,
    protocol::{ChallengeSet, CommandResponse, InstanceStatusResponse, ScoreResponse},
};
use tracing::debug;
use url::Url;

use crate::error::ClientError;

/// Whether a status check may be answered from optimistic server state or
/// must reflect the live container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    Cached,
    Strict,
}

#[async_trait]
pub trait LabApi: Send + Sync {
    async fn instance_status(
        &self,
        verification: Verification,
    ) -> Result<InstanceStatusResponse, ClientError>;
    async fn create_instance(&self) -> Result<CommandResponse, ClientError>;
    async fn restart_instance(&self) -> Result<CommandResponse, ClientError>;
    async fn shutdown_instance(&self) -> Result<CommandResponse, ClientError>;
    async fn challenge_list(&self) -> Result<ChallengeSet, ClientError>;
    async fn challenge_status(&self) -> Result<ChallengeSet, ClientError>;
    async fn submit_score(&self, score: u32) -> Result<ScoreResponse, ClientError>;
}

pub struct HttpLabApi {
    http: Client,
    base: Url,
    ids: SessionIds,
}

impl HttpLabApi {
    pub fn new(server_url: &str, ids: SessionIds) -> Result<Self, ClientError> {
        Self::with_client(Client::new(), server_url, ids)
    }

    pub fn with_client(http: Client, server_url: &str, ids: SessionIds) -> Result<Self, ClientError> {
        let base = Url::parse(server_url)?;
        if base.cannot_be_a_base() {
            return Err(ClientError::CannotBeABase(server_url.to_string()));
        }
        Ok(Self { http, base, ids })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::CannotBeABase(self.base.to_string()))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    fn instance_endpoint(&self, action: &str) -> Result<Url, ClientError> {
        self.endpoint(&[
            action,
            self.ids.launch_id.as_str(),
            self.ids.user_id.as_str(),
        ])
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ClientError> {
        let endpoint = url.path().to_string();
        debug!(%endpoint, "GET");
        let res = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;
        decode(endpoint, res).await
    }

    async fn post_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ClientError> {
        let endpoint = url.path().to_string();
        debug!(%endpoint, "POST");
        let res = self
            .http
            .post(url)
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;
        decode(endpoint, res).await
    }
}

async fn decode<T: DeserializeOwned>(endpoint: String, res: Response) -> Result<T, ClientError> {
    let status = res.status();
    if !status.is_success() {
        let message = res
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(ErrorBody::into_message);
        return Err(ClientError::Status {
            endpoint,
            status: status.as_u16(),
            message,
        });
    }
    res.json::<T>()
        .await
        .map_err(|source| ClientError::Transport { endpoint, source })
}

#[async_trait]
impl LabApi for HttpLabApi {
    async fn instance_status(
        &self,
        verification: Verification,
    ) -> Result<InstanceStatusResponse, ClientError> {
        let mut url = self.instance_endpoint("instance-status")?;
        if verification == Verification::Strict {
            url.query_pairs_mut().append_pair("verification", "strict");
        }
        self.get_json(url).await
    }

    async fn create_instance(&self) -> Result<CommandResponse, ClientError> {
        self.post_json(self.instance_endpoint("create-instance")?)
            .await
    }

    async fn restart_instance(&self) -> Result<CommandResponse, ClientError> {
        self.post_json(self.instance_endpoint("restart-instance")?)
            .await
    }

    async fn shutdown_instance(&self) -> Result<CommandResponse, ClientError> {
        self.post_json(self.instance_endpoint("shutdown-instance")?)
            .await
    }

    async fn challenge_list(&self) -> Result<ChallengeSet, ClientError> {
        let url = self.endpoint(&[
            "challenge-list",
            self.ids.launch_id.as_str(),
            self.ids.assignment_id.as_str(),
        ])?;
        self.get_json(url).await
    }

    async fn challenge_status(&self) -> Result<ChallengeSet, ClientError> {
        let url = self.endpoint(&[
            "challenge-status",
            self.ids.launch_id.as_str(),
            self.ids.user_id.as_str(),
            self.ids.assignment_id.as_str(),
        ])?;
        self.get_json(url).await
    }

    async fn submit_score(&self, score: u32) -> Result<ScoreResponse, ClientError> {
        let score = score.to_string();
        let url = self.endpoint(&["score", self.ids.launch_id.as_str(), score.as_str()])?;
        self.post_json(url).await
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
