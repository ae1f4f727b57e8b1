//! Line-oriented projector for running a lab session from a terminal.

use std::{
    io::{self, Stdout, Write},
    sync::Mutex,
    time::Duration,
};

use client_core::{
    view::{difficulty_stars, progress_percent},
    InstanceRecord, Navigator, ViewProjector,
};
use shared::protocol::ChallengeRecord;
use tracing::warn;

const PROGRESS_WIDTH: usize = 20;

pub struct TerminalView<W: Write + Send> {
    out: Mutex<W>,
}

impl TerminalView<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn line(&self, section: &str, text: &str) {
        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(err) = writeln!(out, "[{section}] {text}").and_then(|_| out.flush()) {
            warn!(error = %err, "failed to write to terminal");
        }
    }
}

pub fn render_progress(completed: u32, total: u32) -> String {
    let percent = progress_percent(completed, total);
    let filled = ((percent / 100.0) * PROGRESS_WIDTH as f64).round() as usize;
    let filled = filled.min(PROGRESS_WIDTH);
    format!(
        "[{}{}] {completed}/{total} ({percent:.0}%)",
        "#".repeat(filled),
        "-".repeat(PROGRESS_WIDTH - filled)
    )
}

fn status_mark(challenge: &ChallengeRecord) -> &'static str {
    if challenge.completed {
        "[x]"
    } else {
        "[ ]"
    }
}

impl<W: Write + Send> ViewProjector for TerminalView<W> {
    fn show_loading(&self) {
        self.line("instance", "Checking instance status...");
    }

    fn show_instance_exists(&self, record: &InstanceRecord) {
        let started = record
            .created_at
            .map(|at| format!(" (started {})", at.format("%Y-%m-%d %H:%M:%S")))
            .unwrap_or_default();
        if record.is_orphaned() {
            self.line(
                "instance",
                &format!("Instance exists but is not ready yet{started}"),
            );
        } else {
            self.line("instance", &format!("Instance is running{started}"));
        }
    }

    fn show_no_instance(&self) {
        self.line("instance", "No instance. Type `create` to start one.");
    }

    fn show_container_error(&self, message: &str) {
        self.line("instance", &format!("{message} Type `create` to start a new one."));
    }

    fn show_creating_instance(&self) {
        self.line("instance", "Working on your instance...");
    }

    fn show_error(&self, message: &str) {
        self.line("error", message);
    }

    fn set_challenge_list_loading_message(&self, message: &str) {
        self.line("challenges", message);
    }

    fn show_challenge_list_error(&self, message: &str) {
        self.line("challenges", &format!("error: {message}"));
    }

    fn display_challenge_list(&self, challenges: &[ChallengeRecord]) {
        if challenges.is_empty() {
            self.line("challenges", "No challenges in this assignment.");
            return;
        }
        for challenge in challenges {
            self.line(
                "challenges",
                &format!(
                    "{} #{} {} {}",
                    status_mark(challenge),
                    challenge.id,
                    challenge.name,
                    difficulty_stars(challenge.difficulty)
                ),
            );
        }
    }

    fn update_progress(&self, completed: u32, total: u32) {
        self.line("progress", &render_progress(completed, total));
    }

    fn update_challenge_status(&self, challenge: &ChallengeRecord) {
        self.line(
            "challenges",
            &format!("{} #{} {}", status_mark(challenge), challenge.id, challenge.name),
        );
    }

    fn show_challenge_details(&self, challenge: &ChallengeRecord) {
        self.line(
            "details",
            &format!(
                "#{} {} {}",
                challenge.id,
                challenge.name,
                difficulty_stars(challenge.difficulty)
            ),
        );
        self.line(
            "details",
            challenge
                .description
                .as_deref()
                .unwrap_or("No description available."),
        );
        let status = if challenge.completed {
            "completed"
        } else {
            "not completed"
        };
        self.line("details", &format!("Status: {status}"));
    }

    fn add_open_challenge_button(&self, url: &str) {
        self.line("details", &format!("Open challenge: {url}"));
    }

    fn show_notification(&self, message: &str, _duration: Duration) {
        self.line("notice", message);
    }
}

/// A terminal cannot open browser tabs; the URL is printed for the learner
/// to follow.
pub struct PrintNavigator;

impl Navigator for PrintNavigator {
    fn open_in_new_context(&self, url: &str) {
        println!("[open] {url}");
    }
}
