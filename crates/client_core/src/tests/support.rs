use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use shared::{
    domain::ChallengeId,
    protocol::{ChallengeRecord, ChallengeSet, CommandResponse, InstanceStatusResponse, ScoreResponse},
};

use crate::{
    api::{LabApi, Verification},
    error::ClientError,
    types::InstanceRecord,
    view::{Navigator, View, ViewProjector},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    InstanceStatus(Verification),
    Create,
    Restart,
    Shutdown,
    ChallengeList,
    ChallengeStatus,
    Score(u32),
}

/// One scripted answer. `None` stands for an HTTP 500.
#[derive(Debug, Clone)]
pub struct Reply<T> {
    delay: Duration,
    body: Option<T>,
}

impl<T> Reply<T> {
    pub fn ok(body: T) -> Self {
        Self {
            delay: Duration::ZERO,
            body: Some(body),
        }
    }

    pub fn failure() -> Self {
        Self {
            delay: Duration::ZERO,
            body: None,
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Queue of replies for one endpoint; the last reply set with `fallback`
/// answers once the queue is drained.
struct Script<T> {
    queue: VecDeque<Reply<T>>,
    fallback: Reply<T>,
}

impl<T: Clone> Script<T> {
    fn new(fallback: Reply<T>) -> Self {
        Self {
            queue: VecDeque::new(),
            fallback,
        }
    }

    fn next(&mut self) -> Reply<T> {
        self.queue
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

pub struct FakeLabApi {
    calls: Mutex<Vec<ApiCall>>,
    status: Mutex<Script<InstanceStatusResponse>>,
    commands: Mutex<Script<CommandResponse>>,
    challenge_list: Mutex<Script<ChallengeSet>>,
    challenge_status: Mutex<Script<ChallengeSet>>,
    score: Mutex<Script<ScoreResponse>>,
}

impl FakeLabApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            status: Mutex::new(Script::new(Reply::ok(InstanceStatusResponse::missing()))),
            commands: Mutex::new(Script::new(Reply::ok(CommandResponse::ok()))),
            challenge_list: Mutex::new(Script::new(Reply::ok(ChallengeSet::default()))),
            challenge_status: Mutex::new(Script::new(Reply::ok(ChallengeSet::default()))),
            score: Mutex::new(Script::new(Reply::ok(ScoreResponse {
                success: true,
                error: None,
            }))),
        })
    }

    pub fn push_status(&self, reply: Reply<InstanceStatusResponse>) {
        self.status.lock().expect("status").queue.push_back(reply);
    }

    pub fn set_status(&self, reply: Reply<InstanceStatusResponse>) {
        self.status.lock().expect("status").fallback = reply;
    }

    pub fn push_command(&self, reply: Reply<CommandResponse>) {
        self.commands.lock().expect("commands").queue.push_back(reply);
    }

    pub fn set_challenge_list(&self, reply: Reply<ChallengeSet>) {
        self.challenge_list.lock().expect("list").fallback = reply;
    }

    pub fn set_challenge_status(&self, reply: Reply<ChallengeSet>) {
        self.challenge_status.lock().expect("status").fallback = reply;
    }

    pub fn push_score(&self, reply: Reply<ScoreResponse>) {
        self.score.lock().expect("score").queue.push_back(reply);
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().expect("calls").clone()
    }

    pub fn count(&self, predicate: impl Fn(&ApiCall) -> bool) -> usize {
        self.calls().iter().filter(|call| predicate(call)).count()
    }

    fn record(&self, call: ApiCall) {
        self.calls.lock().expect("calls").push(call);
    }

    async fn answer<T>(endpoint: &str, reply: Reply<T>) -> Result<T, ClientError> {
        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }
        reply.body.ok_or_else(|| ClientError::Status {
            endpoint: endpoint.to_string(),
            status: 500,
            message: Some("scripted failure".into()),
        })
    }
}

#[async_trait]
impl LabApi for FakeLabApi {
    async fn instance_status(
        &self,
        verification: Verification,
    ) -> Result<InstanceStatusResponse, ClientError> {
        self.record(ApiCall::InstanceStatus(verification));
        let reply = self.status.lock().expect("status").next();
        Self::answer("/api/instance-status", reply).await
    }

    async fn create_instance(&self) -> Result<CommandResponse, ClientError> {
        self.record(ApiCall::Create);
        let reply = self.commands.lock().expect("commands").next();
        Self::answer("/api/create-instance", reply).await
    }

    async fn restart_instance(&self) -> Result<CommandResponse, ClientError> {
        self.record(ApiCall::Restart);
        let reply = self.commands.lock().expect("commands").next();
        Self::answer("/api/restart-instance", reply).await
    }

    async fn shutdown_instance(&self) -> Result<CommandResponse, ClientError> {
        self.record(ApiCall::Shutdown);
        let reply = self.commands.lock().expect("commands").next();
        Self::answer("/api/shutdown-instance", reply).await
    }

    async fn challenge_list(&self) -> Result<ChallengeSet, ClientError> {
        self.record(ApiCall::ChallengeList);
        let reply = self.challenge_list.lock().expect("list").next();
        Self::answer("/api/challenge-list", reply).await
    }

    async fn challenge_status(&self) -> Result<ChallengeSet, ClientError> {
        self.record(ApiCall::ChallengeStatus);
        let reply = self.challenge_status.lock().expect("status").next();
        Self::answer("/api/challenge-status", reply).await
    }

    async fn submit_score(&self, score: u32) -> Result<ScoreResponse, ClientError> {
        self.record(ApiCall::Score(score));
        let reply = self.score.lock().expect("score").next();
        Self::answer("/api/score", reply).await
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Loading,
    InstanceExists(InstanceRecord),
    NoInstance,
    ContainerError(String),
    CreatingInstance,
    Error(String),
    ListMessage(String),
    ListError(String),
    ChallengeList(Vec<ChallengeRecord>),
    Progress { completed: u32, total: u32 },
    ChallengeStatus(ChallengeRecord),
    Details(ChallengeRecord),
    OpenChallengeButton(String),
    Notification(String, Duration),
}

#[derive(Default)]
pub struct RecordingView {
    events: Mutex<Vec<Rendered>>,
}

impl RecordingView {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Rendered> {
        self.events.lock().expect("events").clone()
    }

    pub fn count(&self, predicate: impl Fn(&Rendered) -> bool) -> usize {
        self.events().iter().filter(|event| predicate(event)).count()
    }

    pub fn last(&self) -> Option<Rendered> {
        self.events().last().cloned()
    }

    /// Last render that belongs to the instance section.
    pub fn last_instance_view(&self) -> Option<Rendered> {
        self.events().into_iter().rev().find(|event| {
            matches!(
                event,
                Rendered::Loading
                    | Rendered::InstanceExists(_)
                    | Rendered::NoInstance
                    | Rendered::ContainerError(_)
                    | Rendered::CreatingInstance
                    | Rendered::Error(_)
            )
        })
    }

    pub fn clear(&self) {
        self.events.lock().expect("events").clear();
    }

    fn push(&self, event: Rendered) {
        self.events.lock().expect("events").push(event);
    }
}

impl ViewProjector for RecordingView {
    fn show_loading(&self) {
        self.push(Rendered::Loading);
    }

    fn show_instance_exists(&self, record: &InstanceRecord) {
        self.push(Rendered::InstanceExists(record.clone()));
    }

    fn show_no_instance(&self) {
        self.push(Rendered::NoInstance);
    }

    fn show_container_error(&self, message: &str) {
        self.push(Rendered::ContainerError(message.to_string()));
    }

    fn show_creating_instance(&self) {
        self.push(Rendered::CreatingInstance);
    }

    fn show_error(&self, message: &str) {
        self.push(Rendered::Error(message.to_string()));
    }

    fn set_challenge_list_loading_message(&self, message: &str) {
        self.push(Rendered::ListMessage(message.to_string()));
    }

    fn show_challenge_list_error(&self, message: &str) {
        self.push(Rendered::ListError(message.to_string()));
    }

    fn display_challenge_list(&self, challenges: &[ChallengeRecord]) {
        self.push(Rendered::ChallengeList(challenges.to_vec()));
    }

    fn update_progress(&self, completed: u32, total: u32) {
        self.push(Rendered::Progress { completed, total });
    }

    fn update_challenge_status(&self, challenge: &ChallengeRecord) {
        self.push(Rendered::ChallengeStatus(challenge.clone()));
    }

    fn show_challenge_details(&self, challenge: &ChallengeRecord) {
        self.push(Rendered::Details(challenge.clone()));
    }

    fn add_open_challenge_button(&self, url: &str) {
        self.push(Rendered::OpenChallengeButton(url.to_string()));
    }

    fn show_notification(&self, message: &str, duration: Duration) {
        self.push(Rendered::Notification(message.to_string(), duration));
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    opened: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().expect("opened").clone()
    }
}

impl Navigator for RecordingNavigator {
    fn open_in_new_context(&self, url: &str) {
        self.opened.lock().expect("opened").push(url.to_string());
    }
}

pub fn challenge(id: i64, name: &str, completed: bool) -> ChallengeRecord {
    ChallengeRecord {
        id: ChallengeId(id),
        name: name.to_string(),
        difficulty: 2,
        completed,
        description: Some(format!("{name} description")),
    }
}

pub fn challenge_set(challenges: Vec<ChallengeRecord>, completed: u32, total: u32) -> ChallengeSet {
    ChallengeSet {
        challenges,
        completed,
        total,
    }
}

pub struct Harness {
    pub api: Arc<FakeLabApi>,
    pub view: Arc<RecordingView>,
    pub navigator: Arc<RecordingNavigator>,
    pub handle: View,
}

impl Harness {
    pub fn new() -> Self {
        let view = RecordingView::new();
        Self {
            api: FakeLabApi::new(),
            handle: View::new(view.clone()),
            view,
            navigator: RecordingNavigator::new(),
        }
    }
}
