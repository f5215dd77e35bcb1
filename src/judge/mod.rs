pub mod classifier;
pub mod http;
pub mod orchestrator;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::harness::SynthesizedProgram;

/// Resource limits attached to every submission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionLimits {
    /// Seconds of CPU time.
    pub cpu_time_limit: f64,
    /// Seconds of wall-clock time.
    pub wall_time_limit: f64,
    pub memory_limit_kb: u64,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            cpu_time_limit: 5.0,
            wall_time_limit: 10.0,
            memory_limit_kb: 128_000,
        }
    }
}

/// Creation body for `POST /submissions`. Text fields are base64-encoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JudgeSubmission {
    pub source_code: String,
    pub language_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<String>,
    pub cpu_time_limit: f64,
    pub wall_time_limit: f64,
    pub memory_limit: u64,
}

impl JudgeSubmission {
    pub fn encode(
        program: &SynthesizedProgram,
        stdin: Option<&str>,
        expected_output: Option<&str>,
        limits: &ExecutionLimits,
    ) -> Self {
        Self {
            source_code: STANDARD.encode(&program.text),
            language_id: program.language.judge_id(),
            stdin: stdin.map(|s| STANDARD.encode(s)),
            expected_output: expected_output.map(|s| STANDARD.encode(s)),
            cpu_time_limit: limits.cpu_time_limit,
            wall_time_limit: limits.wall_time_limit,
            memory_limit: limits.memory_limit_kb,
        }
    }
}

/// Creation response. A batch item the judge refused carries field errors
/// instead of a token.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct JudgeToken {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(flatten)]
    pub rejected: serde_json::Map<String, serde_json::Value>,
}

impl JudgeToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            rejected: serde_json::Map::new(),
        }
    }

    pub fn rejection(&self) -> String {
        if self.rejected.is_empty() {
            "no token returned".to_string()
        } else {
            serde_json::Value::Object(self.rejected.clone()).to_string()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeStatus {
    pub id: u32,
    #[serde(default)]
    pub description: String,
}

/// Judge0 reports `time` as a decimal string; some deployments send a number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum JudgeTime {
    Text(String),
    Seconds(f64),
}

impl JudgeTime {
    pub fn as_millis(&self) -> Option<f64> {
        let secs = match self {
            Self::Text(raw) => raw.trim().parse::<f64>().ok()?,
            Self::Seconds(secs) => *secs,
        };
        Some((secs * 1_000_000.0).round() / 1_000.0)
    }
}

/// Submission state as returned by `GET /submissions/{token}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct JudgePayload {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub status: JudgeStatus,
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default)]
    pub compile_output: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub time: Option<JudgeTime>,
    #[serde(default)]
    pub memory: Option<u64>,
    #[serde(default)]
    pub exit_code: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JudgeError {
    #[error("judge rate limit exceeded")]
    RateLimited,
    #[error("judge request failed: {0}")]
    Transport(String),
    #[error("judge responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("judge response could not be decoded: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for JudgeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

#[async_trait]
pub trait JudgeClient: Send + Sync {
    async fn create(&self, submission: &JudgeSubmission) -> Result<JudgeToken, JudgeError>;

    async fn fetch(&self, token: &str) -> Result<JudgePayload, JudgeError>;

    async fn create_batch(
        &self,
        submissions: &[JudgeSubmission],
    ) -> Result<Vec<JudgeToken>, JudgeError>;

    async fn fetch_batch(&self, tokens: &[String]) -> Result<Vec<JudgePayload>, JudgeError>;
}
