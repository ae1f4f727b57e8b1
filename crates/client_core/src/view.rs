//! Projection surface the controllers render into.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use shared::protocol::ChallengeRecord;

use crate::types::InstanceRecord;

pub const MAX_DIFFICULTY: u8 = 6;

/// Pure projection: given state, update what the learner sees. Implementations
/// must not call back into the controllers.
pub trait ViewProjector: Send + Sync {
    fn show_loading(&self);
    fn show_instance_exists(&self, record: &InstanceRecord);
    fn show_no_instance(&self);
    fn show_container_error(&self, message: &str);
    fn show_creating_instance(&self);
    fn show_error(&self, message: &str);
    fn set_challenge_list_loading_message(&self, message: &str);
    fn display_challenge_list(&self, challenges: &[ChallengeRecord]);
    fn update_progress(&self, completed: u32, total: u32);
    fn update_challenge_status(&self, challenge: &ChallengeRecord);
    fn show_challenge_details(&self, challenge: &ChallengeRecord);
    fn add_open_challenge_button(&self, url: &str);
    fn show_notification(&self, message: &str, duration: Duration);

    /// Inline error in place of the challenge list.
    fn show_challenge_list_error(&self, message: &str) {
        self.set_challenge_list_loading_message(message);
    }
}

pub trait Navigator: Send + Sync {
    fn open_in_new_context(&self, url: &str);
}

/// Shared handle to the projector that also remembers whether the challenge
/// list currently holds a placeholder message instead of challenges.
#[derive(Clone)]
pub struct View {
    projector: Arc<dyn ViewProjector>,
    list_populated: Arc<AtomicBool>,
}

impl View {
    pub fn new(projector: Arc<dyn ViewProjector>) -> Self {
        Self {
            projector,
            list_populated: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn challenge_list_is_placeholder(&self) -> bool {
        !self.list_populated.load(Ordering::SeqCst)
    }

    pub fn show_loading(&self) {
        self.projector.show_loading();
    }

    pub fn show_instance_exists(&self, record: &InstanceRecord) {
        self.projector.show_instance_exists(record);
    }

    pub fn show_no_instance(&self) {
        self.projector.show_no_instance();
    }

    pub fn show_container_error(&self, message: &str) {
        self.projector.show_container_error(message);
    }

    pub fn show_creating_instance(&self) {
        self.projector.show_creating_instance();
    }

    pub fn show_error(&self, message: &str) {
        self.projector.show_error(message);
    }

    pub fn set_challenge_list_loading_message(&self, message: &str) {
        self.list_populated.store(false, Ordering::SeqCst);
        self.projector.set_challenge_list_loading_message(message);
    }

    pub fn show_challenge_list_error(&self, message: &str) {
        self.list_populated.store(false, Ordering::SeqCst);
        self.projector.show_challenge_list_error(message);
    }

    pub fn display_challenge_list(&self, challenges: &[ChallengeRecord]) {
        self.list_populated
            .store(!challenges.is_empty(), Ordering::SeqCst);
        self.projector.display_challenge_list(challenges);
    }

    pub fn update_progress(&self, completed: u32, total: u32) {
        self.projector.update_progress(completed, total);
    }

    pub fn update_challenge_status(&self, challenge: &ChallengeRecord) {
        self.projector.update_challenge_status(challenge);
    }

    pub fn show_challenge_details(&self, challenge: &ChallengeRecord) {
        self.projector.show_challenge_details(challenge);
    }

    pub fn add_open_challenge_button(&self, url: &str) {
        self.projector.add_open_challenge_button(url);
    }

    pub fn show_notification(&self, message: &str, duration: Duration) {
        self.projector.show_notification(message, duration);
    }
}

pub fn progress_percent(completed: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    f64::from(completed) / f64::from(total) * 100.0
}

pub fn difficulty_stars(level: u8) -> String {
    let level = level.min(MAX_DIFFICULTY);
    let mut stars = "★".repeat(usize::from(level));
    stars.push_str(&"☆".repeat(usize::from(MAX_DIFFICULTY - level)));
    stars
}

/// The sandbox routes to its challenge board through a fixed hash fragment.
pub fn challenge_deep_link(instance_url: &str) -> String {
    format!("{}/#/challenge", instance_url.trim_end_matches('/'))
}
