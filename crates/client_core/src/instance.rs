//! Belief about the learner's sandbox instance: existence, readiness, URL.

use std::{sync::Arc, time::Duration};

use shared::protocol::{CommandResponse, InstanceStatusResponse, UnavailableReason};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    api::{LabApi, Verification},
    config::PollingPolicy,
    error::ClientError,
    polling::{schedule_once, BoundedPoll, PollOutcome, Tick},
    types::InstanceRecord,
    view::{Navigator, View},
};

pub const CONTAINER_DIED_MESSAGE: &str =
    "Your instance's container is no longer running. Create a new instance to continue.";
pub const INSTANCE_EXPIRED_MESSAGE: &str =
    "Your instance has expired or was shut down. Create a new instance to continue.";
pub const URL_UNAVAILABLE_MESSAGE: &str = "Instance URL not available";
const STATUS_FAILED_MESSAGE: &str = "Failed to check instance status";
const OPEN_FAILED_MESSAGE: &str = "Failed to get instance URL";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InstanceCommand {
    Create,
    Restart,
    Shutdown,
}

impl InstanceCommand {
    fn name(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Restart => "restart",
            Self::Shutdown => "shutdown",
        }
    }

    fn list_message(self) -> &'static str {
        match self {
            Self::Create => "Creating instance and loading challenges...",
            Self::Restart => "Restarting instance and loading challenges...",
            Self::Shutdown => "Instance is shutting down...",
        }
    }

    fn rejected_message(self) -> &'static str {
        match self {
            Self::Create => "Failed to create instance",
            Self::Restart => "Failed to restart instance",
            Self::Shutdown => "Failed to shut down instance",
        }
    }

    fn transport_message(self) -> &'static str {
        match self {
            Self::Create => "An error occurred while creating the instance",
            Self::Restart => "An error occurred while restarting the instance",
            Self::Shutdown => "An error occurred while shutting down the instance",
        }
    }
}

/// How [`InstanceController::open`] resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    Opened { url: String },
    /// The instance was live at the last check and its container has died.
    ContainerDied,
    /// The instance was live at the last check and is now gone.
    Expired,
    Unavailable,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProvisioningResult {
    Running,
    ContainerFailed,
}

#[derive(Default)]
struct InstanceState {
    record: Option<InstanceRecord>,
    ready: bool,
    url: Option<String>,
}

impl InstanceState {
    fn apply(&mut self, record: &InstanceRecord) {
        self.ready = record.exists && record.running;
        self.url = record.url.clone();
        self.record = Some(record.clone());
    }

    fn invalidate(&mut self) {
        self.ready = false;
        self.url = None;
    }
}

pub struct InstanceController {
    api: Arc<dyn LabApi>,
    view: View,
    navigator: Arc<dyn Navigator>,
    policy: PollingPolicy,
    state: Mutex<InstanceState>,
}

impl InstanceController {
    pub fn new(
        api: Arc<dyn LabApi>,
        view: View,
        navigator: Arc<dyn Navigator>,
        policy: PollingPolicy,
    ) -> Arc<Self> {
        Arc::new(Self {
            api,
            view,
            navigator,
            policy,
            state: Mutex::new(InstanceState::default()),
        })
    }

    pub async fn is_ready(&self) -> bool {
        self.state.lock().await.ready
    }

    pub async fn instance_url(&self) -> Option<String> {
        self.state.lock().await.url.clone()
    }

    /// `None` until the first status fetch resolves.
    pub async fn record(&self) -> Option<InstanceRecord> {
        self.state.lock().await.record.clone()
    }

    /// Fetches status, replaces the cached record and renders exactly one of
    /// the instance views. Resolves to `None` on transport failure.
    pub async fn refresh_status(&self) -> Option<InstanceRecord> {
        self.view.show_loading();

        let response = match self.api.instance_status(Verification::Cached).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "instance status check failed");
                {
                    let mut state = self.state.lock().await;
                    state.record = Some(InstanceRecord::absent());
                    state.invalidate();
                }
                self.view.show_error(STATUS_FAILED_MESSAGE);
                return None;
            }
        };

        let record = InstanceRecord::from(response);
        self.state.lock().await.apply(&record);
        self.render(&record);
        Some(record)
    }

    /// Same fetch as [`Self::refresh_status`] without touching the instance
    /// section. A missing instance still clears readiness and the cached URL.
    pub async fn peek_status(&self) -> Option<InstanceRecord> {
        match self.fetch(Verification::Cached).await {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(error = %err, "instance status peek failed");
                None
            }
        }
    }

    /// Re-checks the live container before navigating so a sandbox that died
    /// since the last periodic check is never opened. Any previously known
    /// instance, running or not, makes a vanished one a death or expiry.
    pub async fn open(&self) -> OpenOutcome {
        let had_instance = {
            let state = self.state.lock().await;
            state.url.is_some() || state.record.as_ref().is_some_and(|record| record.exists)
        };

        let record = match self.fetch(Verification::Strict).await {
            Ok(record) => record,
            Err(err) => {
                warn!(error = %err, "strict instance check failed");
                self.view.show_error(OPEN_FAILED_MESSAGE);
                return OpenOutcome::Failed;
            }
        };

        if let Some(url) = record.url.clone() {
            self.state.lock().await.apply(&record);
            info!(%url, "opening instance");
            self.navigator.open_in_new_context(&url);
            return OpenOutcome::Opened { url };
        }

        self.state.lock().await.invalidate();
        if !had_instance || record.exists {
            self.view.show_error(URL_UNAVAILABLE_MESSAGE);
            return OpenOutcome::Unavailable;
        }

        match record.unavailable_reason {
            Some(UnavailableReason::ContainerNotRunning) => {
                info!("instance container died since last check");
                self.view.show_container_error(CONTAINER_DIED_MESSAGE);
                OpenOutcome::ContainerDied
            }
            _ => {
                info!("instance expired since last check");
                self.view.show_error(INSTANCE_EXPIRED_MESSAGE);
                OpenOutcome::Expired
            }
        }
    }

    pub async fn create(self: &Arc<Self>) -> Option<CommandResponse> {
        let response = self.run_command(InstanceCommand::Create).await?;
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            controller.poll_until_running().await;
        });
        Some(response)
    }

    pub async fn restart(self: &Arc<Self>) -> Option<CommandResponse> {
        let response = self.run_command(InstanceCommand::Restart).await?;
        self.schedule_refresh(self.policy.restart_follow_up);
        Some(response)
    }

    pub async fn shutdown(self: &Arc<Self>) -> Option<CommandResponse> {
        let response = self.run_command(InstanceCommand::Shutdown).await?;
        self.schedule_refresh(self.policy.shutdown_follow_up);
        Some(response)
    }

    /// Peeks every provisioning interval until the instance runs, its
    /// container is reported dead, or the ceiling elapses.
    pub async fn poll_until_running(&self) {
        let poll = BoundedPoll::new(
            self.policy.provisioning_interval,
            self.policy.provisioning_ceiling,
        );
        let outcome = poll
            .run(move || async move {
                let Some(record) = self.peek_status().await else {
                    return Tick::Continue;
                };
                if record.exists && record.running {
                    Tick::Done(ProvisioningResult::Running)
                } else if record.container_died() {
                    Tick::Done(ProvisioningResult::ContainerFailed)
                } else {
                    debug!(status = ?record.status, "instance not running yet");
                    Tick::Continue
                }
            })
            .await;

        match outcome {
            PollOutcome::Finished(ProvisioningResult::Running) => {
                info!("instance is running");
                self.refresh_status().await;
            }
            PollOutcome::Finished(ProvisioningResult::ContainerFailed) => {
                warn!("instance container stopped during provisioning");
                self.view.show_container_error(CONTAINER_DIED_MESSAGE);
            }
            PollOutcome::CeilingReached => {
                warn!(
                    ceiling_secs = self.policy.provisioning_ceiling.as_secs(),
                    "instance did not start before the polling ceiling"
                );
                self.refresh_status().await;
            }
        }
    }

    async fn fetch(&self, verification: Verification) -> Result<InstanceRecord, ClientError> {
        let response: InstanceStatusResponse = self.api.instance_status(verification).await?;
        let record = InstanceRecord::from(response);
        if !record.exists {
            let mut state = self.state.lock().await;
            state.record = Some(record.clone());
            state.invalidate();
        }
        Ok(record)
    }

    async fn run_command(&self, command: InstanceCommand) -> Option<CommandResponse> {
        match command {
            InstanceCommand::Shutdown => self.view.show_loading(),
            InstanceCommand::Create | InstanceCommand::Restart => {
                self.view.show_creating_instance()
            }
        }
        self.view
            .set_challenge_list_loading_message(command.list_message());
        self.state.lock().await.invalidate();

        let result = match command {
            InstanceCommand::Create => self.api.create_instance().await,
            InstanceCommand::Restart => self.api.restart_instance().await,
            InstanceCommand::Shutdown => self.api.shutdown_instance().await,
        };

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                warn!(command = command.name(), error = %err, "instance command failed");
                self.view.show_error(command.transport_message());
                return None;
            }
        };

        match response.into_result(command.rejected_message()) {
            Ok(response) => {
                info!(command = command.name(), "instance command accepted");
                Some(response)
            }
            Err(failure) => {
                warn!(command = command.name(), reason = %failure, "instance command rejected");
                self.view.show_error(&failure.message);
                None
            }
        }
    }

    fn schedule_refresh(self: &Arc<Self>, delay: Duration) {
        let controller = Arc::clone(self);
        schedule_once(delay, async move {
            controller.refresh_status().await;
        });
    }

    fn render(&self, record: &InstanceRecord) {
        if record.exists {
            self.view.show_instance_exists(record);
        } else if record.container_died() {
            self.view.show_container_error(CONTAINER_DIED_MESSAGE);
        } else {
            self.view.show_no_instance();
        }
    }
}

#[cfg(test)]
#[path = "tests/instance_tests.rs"]
mod tests;
