//! Wires the controllers together and owns the two background timers.

use std::sync::{Arc, Weak};

use tracing::info;

use crate::{
    api::LabApi,
    challenges::ChallengeController,
    config::SessionConfig,
    instance::InstanceController,
    polling::RepeatingTask,
    view::{Navigator, View, ViewProjector},
};

pub struct LabSession {
    instance: Arc<InstanceController>,
    challenges: Arc<ChallengeController>,
    instance_refresh: Option<RepeatingTask>,
}

impl LabSession {
    /// Checks the instance, then challenge status, then installs the instance
    /// and challenge timers.
    pub async fn start(
        config: &SessionConfig,
        api: Arc<dyn LabApi>,
        projector: Arc<dyn ViewProjector>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let view = View::new(projector);
        let instance =
            InstanceController::new(Arc::clone(&api), view.clone(), navigator, config.polling);
        let challenges =
            ChallengeController::new(api, view, Arc::clone(&instance), config.polling);

        info!(
            launch_id = %config.ids.launch_id,
            user_id = %config.ids.user_id,
            assignment_id = %config.ids.assignment_id,
            "starting lab session"
        );

        instance.refresh_status().await;
        challenges.refresh_challenge_status().await;

        let weak_instance: Weak<InstanceController> = Arc::downgrade(&instance);
        let instance_refresh = RepeatingTask::spawn(
            "instance-status",
            config.polling.instance_refresh,
            move || {
                let instance = weak_instance.clone();
                async move {
                    let Some(instance) = instance.upgrade() else {
                        return false;
                    };
                    instance.refresh_status().await;
                    true
                }
            },
        );
        challenges.start_polling(config.polling.challenge_refresh);

        Self {
            instance,
            challenges,
            instance_refresh: Some(instance_refresh),
        }
    }

    pub fn instance(&self) -> &Arc<InstanceController> {
        &self.instance
    }

    pub fn challenges(&self) -> &Arc<ChallengeController> {
        &self.challenges
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.instance_refresh.take() {
            task.stop();
        }
        self.challenges.stop_polling();
        info!("lab session timers stopped");
    }
}

impl Drop for LabSession {
    fn drop(&mut self) {
        self.challenges.stop_polling();
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
