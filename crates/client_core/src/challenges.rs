//! Challenge list, completion tracking and score reporting.

use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use shared::{
    domain::ChallengeId,
    protocol::{ChallengeRecord, ChallengeSet},
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    api::LabApi,
    config::PollingPolicy,
    instance::InstanceController,
    polling::RepeatingTask,
    view::{challenge_deep_link, View},
};

pub const MAX_SCORE: u32 = 100;
const WAITING_FOR_INSTANCE_MESSAGE: &str = "Waiting for instance to be ready...";
const LOADING_MESSAGE: &str = "Loading challenges...";

/// Percentage of completed challenges, or `None` while nothing is completed.
pub fn completion_score(completed: u32, total: u32) -> Option<u32> {
    if total == 0 || completed == 0 {
        return None;
    }
    let score = (f64::from(completed) / f64::from(total) * f64::from(MAX_SCORE)).round() as u32;
    Some(score.min(MAX_SCORE))
}

#[derive(Default)]
struct ChallengeState {
    challenges: Vec<ChallengeRecord>,
    last_submitted_score: u32,
    /// Score whose POST has not resolved yet.
    pending_score: Option<u32>,
}

pub struct ChallengeController {
    api: Arc<dyn LabApi>,
    view: View,
    instance: Arc<InstanceController>,
    policy: PollingPolicy,
    state: Mutex<ChallengeState>,
    poller: std::sync::Mutex<Option<RepeatingTask>>,
}

impl ChallengeController {
    pub fn new(
        api: Arc<dyn LabApi>,
        view: View,
        instance: Arc<InstanceController>,
        policy: PollingPolicy,
    ) -> Arc<Self> {
        Arc::new(Self {
            api,
            view,
            instance,
            policy,
            state: Mutex::new(ChallengeState::default()),
            poller: std::sync::Mutex::new(None),
        })
    }

    pub async fn challenges(&self) -> Vec<ChallengeRecord> {
        self.state.lock().await.challenges.clone()
    }

    pub async fn last_submitted_score(&self) -> u32 {
        self.state.lock().await.last_submitted_score
    }

    /// Fetches the full catalog and redraws the list. Only placeholder output
    /// while the instance is not ready.
    pub async fn load_challenge_list(&self) -> Option<ChallengeSet> {
        if !self.instance.is_ready().await {
            debug!("instance not ready; skipping challenge load");
            self.view
                .set_challenge_list_loading_message(WAITING_FOR_INSTANCE_MESSAGE);
            return None;
        }

        self.view.set_challenge_list_loading_message(LOADING_MESSAGE);
        match self.api.challenge_list().await {
            Ok(set) => {
                info!(
                    count = set.challenges.len(),
                    completed = set.completed,
                    total = set.total,
                    "challenges loaded"
                );
                self.state.lock().await.challenges = set.challenges.clone();
                self.view.display_challenge_list(&set.challenges);
                self.view.update_progress(set.completed, set.total);
                Some(set)
            }
            Err(err) => {
                warn!(error = %err, "failed to load challenges");
                self.view
                    .show_challenge_list_error(&format!("Failed to load challenges: {err}"));
                None
            }
        }
    }

    /// Patches completion indicators and progress from a fresh snapshot. The
    /// first non-empty snapshot seen while the list is still a placeholder
    /// triggers a full load instead.
    pub async fn refresh_challenge_status(&self) -> Option<ChallengeSet> {
        if !self.instance.is_ready().await {
            return None;
        }

        let set = match self.api.challenge_status().await {
            Ok(set) => set,
            Err(err) => {
                warn!(error = %err, "challenge status check failed");
                return None;
            }
        };
        debug!(completed = set.completed, total = set.total, "challenge status");

        let first_snapshot = {
            let mut state = self.state.lock().await;
            let first_snapshot = !set.challenges.is_empty()
                && (state.challenges.is_empty() || self.view.challenge_list_is_placeholder());
            state.challenges = set.challenges.clone();
            first_snapshot
        };

        if first_snapshot {
            info!("initial challenge data received; populating list");
            self.load_challenge_list().await;
        } else {
            self.view.update_progress(set.completed, set.total);
            for challenge in &set.challenges {
                self.view.update_challenge_status(challenge);
            }
        }

        if let Some(score) = completion_score(set.completed, set.total) {
            self.submit_score(score, MAX_SCORE).await;
        }

        Some(set)
    }

    pub async fn show_details(&self, id: ChallengeId) {
        let challenge = {
            let state = self.state.lock().await;
            state
                .challenges
                .iter()
                .find(|challenge| challenge.id == id)
                .cloned()
        };
        let Some(challenge) = challenge else {
            warn!(challenge_id = id.0, "challenge not found; ignoring stale selection");
            return;
        };

        self.view.show_challenge_details(&challenge);

        if let Some(record) = self.instance.peek_status().await {
            if let Some(url) = record.url.as_deref().filter(|_| record.exists) {
                self.view.add_open_challenge_button(&challenge_deep_link(url));
            }
        }
    }

    /// Reports a score unless it equals the last accepted one or one already
    /// in flight. Returns whether the server accepted a new score.
    pub async fn submit_score(&self, score: u32, max_score: u32) -> bool {
        {
            let mut state = self.state.lock().await;
            if score == state.last_submitted_score || state.pending_score == Some(score) {
                return false;
            }
            state.pending_score = Some(score);
        }

        let result = self.api.submit_score(score).await;

        let accepted = {
            let mut state = self.state.lock().await;
            if state.pending_score == Some(score) {
                state.pending_score = None;
            }
            match result.map(|response| response.into_result()) {
                Ok(Ok(())) => {
                    state.last_submitted_score = score;
                    true
                }
                Ok(Err(failure)) => {
                    warn!(score, reason = %failure, "score rejected");
                    false
                }
                Err(err) => {
                    warn!(score, error = %err, "score submission failed");
                    false
                }
            }
        };

        if accepted {
            info!(score, max_score, "score submitted");
            self.view.show_notification(
                &format!("Score submitted: {score}/{max_score}"),
                self.policy.notification,
            );
        }
        accepted
    }

    /// Replaces any running status poller with one ticking every `interval`.
    pub fn start_polling(self: &Arc<Self>, interval: Duration) {
        let controller: Weak<Self> = Arc::downgrade(self);
        let task = RepeatingTask::spawn("challenge-status", interval, move || {
            let controller = controller.clone();
            async move {
                let Some(controller) = controller.upgrade() else {
                    return false;
                };
                controller.refresh_challenge_status().await;
                true
            }
        });

        let previous = self.poller_slot().replace(task);
        if let Some(previous) = previous {
            previous.stop();
        }
    }

    pub fn stop_polling(&self) {
        if let Some(task) = self.poller_slot().take() {
            task.stop();
        }
    }

    pub fn is_polling(&self) -> bool {
        self.poller_slot()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    fn poller_slot(&self) -> std::sync::MutexGuard<'_, Option<RepeatingTask>> {
        self.poller
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
#[path = "tests/challenges_tests.rs"]
mod tests;
