//! Scripted in-memory judge used by unit tests.

use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
    time::Duration,
};

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::judge::{
    JudgeClient, JudgeError, JudgePayload, JudgeStatus, JudgeSubmission, JudgeTime, JudgeToken,
    orchestrator::Sleeper,
};

/// Unscripted creates hand out `tok-N` tokens; unscripted polls report the
/// submission as still queued.
#[derive(Default)]
pub struct ScriptedJudge {
    creates: Mutex<VecDeque<Result<JudgeToken, JudgeError>>>,
    polls: Mutex<VecDeque<Result<JudgePayload, JudgeError>>>,
    batch_creates: Mutex<VecDeque<Result<Vec<JudgeToken>, JudgeError>>>,
    batch_polls: Mutex<HashMap<String, VecDeque<JudgePayload>>>,
    batch_poll_errors: Mutex<VecDeque<JudgeError>>,
    submitted: Mutex<Vec<JudgeSubmission>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedJudge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_create(self, result: Result<JudgeToken, JudgeError>) -> Self {
        self.creates.lock().unwrap().push_back(result);
        self
    }

    pub fn on_poll(self, result: Result<JudgePayload, JudgeError>) -> Self {
        self.polls.lock().unwrap().push_back(result);
        self
    }

    pub fn on_create_batch(self, result: Result<Vec<JudgeToken>, JudgeError>) -> Self {
        self.batch_creates.lock().unwrap().push_back(result);
        self
    }

    pub fn on_batch_poll(self, token: &str, payload: JudgePayload) -> Self {
        self.batch_polls
            .lock()
            .unwrap()
            .entry(token.to_string())
            .or_default()
            .push_back(payload);
        self
    }

    pub fn on_batch_poll_error(self, err: JudgeError) -> Self {
        self.batch_poll_errors.lock().unwrap().push_back(err);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.split(' ').next() == Some(prefix))
            .count()
    }

    pub fn submitted(&self) -> Vec<JudgeSubmission> {
        self.submitted.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

pub fn payload(status_id: u32, description: &str, stdout: &str) -> JudgePayload {
    JudgePayload {
        status: JudgeStatus {
            id: status_id,
            description: description.to_string(),
        },
        stdout: (!stdout.is_empty()).then(|| STANDARD.encode(stdout)),
        time: Some(JudgeTime::Text("0.010".to_string())),
        memory: Some(2_048),
        exit_code: Some(0),
        ..JudgePayload::default()
    }
}

pub fn queued() -> JudgePayload {
    payload(1, "In Queue", "")
}

pub fn accepted(stdout: &str) -> JudgePayload {
    payload(3, "Accepted", stdout)
}

#[async_trait]
impl JudgeClient for ScriptedJudge {
    async fn create(&self, submission: &JudgeSubmission) -> Result<JudgeToken, JudgeError> {
        self.record("create".to_string());
        self.submitted.lock().unwrap().push(submission.clone());
        let scripted = self.creates.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(JudgeToken::new("tok-0")))
    }

    async fn fetch(&self, token: &str) -> Result<JudgePayload, JudgeError> {
        self.record(format!("fetch {token}"));
        let scripted = self.polls.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(queued()))
    }

    async fn create_batch(
        &self,
        submissions: &[JudgeSubmission],
    ) -> Result<Vec<JudgeToken>, JudgeError> {
        self.record(format!("create_batch {}", submissions.len()));
        self.submitted
            .lock()
            .unwrap()
            .extend(submissions.iter().cloned());
        let scripted = self.batch_creates.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| {
            Ok((0..submissions.len())
                .map(|i| JudgeToken::new(format!("tok-{i}")))
                .collect())
        })
    }

    async fn fetch_batch(&self, tokens: &[String]) -> Result<Vec<JudgePayload>, JudgeError> {
        self.record(format!("fetch_batch {}", tokens.join(",")));
        if let Some(err) = self.batch_poll_errors.lock().unwrap().pop_front() {
            return Err(err);
        }
        let mut scripted = self.batch_polls.lock().unwrap();
        Ok(tokens
            .iter()
            .map(|token| {
                let mut payload = scripted
                    .get_mut(token)
                    .and_then(VecDeque::pop_front)
                    .unwrap_or_else(queued);
                payload.token = Some(token.clone());
                payload
            })
            .collect())
    }
}

#[derive(Default)]
pub struct RecordingSleeper {
    naps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn naps(&self) -> Vec<Duration> {
        self.naps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.naps.lock().unwrap().push(duration);
    }
}
