//! Terminal judge payloads to [`ExecutionResult`].

use std::fmt;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::judge::JudgePayload;

pub const STATUS_WRONG_ANSWER: u32 = 4;
/// Status code for classifications made locally, without a judge verdict.
pub const STATUS_LOCAL: u32 = 0;

const COMPILE_FALLBACK: &str = "Compilation failed";
const INTERNAL_FALLBACK: &str = "Judge internal error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    InQueue,
    Processing,
    Accepted,
    WrongAnswer,
    TimeLimitExceeded,
    CompilationError,
    RuntimeError,
    InternalError,
    ExecFormatError,
    RateLimited,
    Timeout,
    NetworkError,
}

impl Verdict {
    pub const ALL: [Verdict; 12] = [
        Verdict::InQueue,
        Verdict::Processing,
        Verdict::Accepted,
        Verdict::WrongAnswer,
        Verdict::TimeLimitExceeded,
        Verdict::CompilationError,
        Verdict::RuntimeError,
        Verdict::InternalError,
        Verdict::ExecFormatError,
        Verdict::RateLimited,
        Verdict::Timeout,
        Verdict::NetworkError,
    ];

    /// Judge0 status ids; 7 to 12 are the runtime error signals.
    pub fn from_status_id(id: u32) -> Self {
        match id {
            1 => Self::InQueue,
            2 => Self::Processing,
            3 => Self::Accepted,
            4 => Self::WrongAnswer,
            5 => Self::TimeLimitExceeded,
            6 => Self::CompilationError,
            7..=12 => Self::RuntimeError,
            14 => Self::ExecFormatError,
            _ => Self::InternalError,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::InQueue => "in_queue",
            Self::Processing => "processing",
            Self::Accepted => "accepted",
            Self::WrongAnswer => "wrong_answer",
            Self::TimeLimitExceeded => "time_limit_exceeded",
            Self::CompilationError => "compilation_error",
            Self::RuntimeError => "runtime_error",
            Self::InternalError => "internal_error",
            Self::ExecFormatError => "exec_format_error",
            Self::RateLimited => "rate_limited",
            Self::Timeout => "timeout",
            Self::NetworkError => "network_error",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical outcome of one program run. `passed` holds exactly when the
/// judge reported Accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub passed: bool,
    pub verdict: Verdict,
    pub status_code: u32,
    pub status_description: String,
    #[serde(rename = "output")]
    pub stdout: String,
    pub stderr: String,
    #[serde(rename = "compilationOutput")]
    pub compile_output: String,
    pub error: Option<String>,
    #[serde(rename = "executionTimeMs")]
    pub time_ms: Option<f64>,
    pub memory_kb: Option<u64>,
    pub exit_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl ExecutionResult {
    /// A failure decided on this side of the wire: rate limit, poll
    /// exhaustion or transport trouble.
    pub fn local(verdict: Verdict, error: impl Into<String>) -> Self {
        let description = match verdict {
            Verdict::RateLimited => "Rate Limited",
            Verdict::Timeout => "Timed Out Waiting For Judge",
            Verdict::NetworkError => "Network Error",
            _ => "Internal Error",
        };
        Self {
            passed: false,
            verdict,
            status_code: STATUS_LOCAL,
            status_description: description.to_string(),
            stdout: String::new(),
            stderr: String::new(),
            compile_output: String::new(),
            error: Some(error.into()),
            time_ms: None,
            memory_kb: None,
            exit_code: None,
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Rewrites an accepted run whose output did not match the expectation.
    pub fn into_wrong_answer(mut self) -> Self {
        self.passed = false;
        self.verdict = Verdict::WrongAnswer;
        self.status_code = STATUS_WRONG_ANSWER;
        self.status_description = "Wrong Answer".to_string();
        self.error = None;
        self
    }
}

pub fn classify(payload: &JudgePayload) -> ExecutionResult {
    let verdict = Verdict::from_status_id(payload.status.id);
    let stdout = decode_field(payload.stdout.as_deref());
    let stderr = decode_field(payload.stderr.as_deref());
    let compile_output = decode_field(payload.compile_output.as_deref());
    let message = decode_field(payload.message.as_deref());
    let description = payload.status.description.clone();

    let error = match verdict {
        Verdict::Accepted => None,
        Verdict::WrongAnswer => non_empty(&stderr),
        Verdict::CompilationError => {
            Some(non_empty(&compile_output).unwrap_or_else(|| COMPILE_FALLBACK.to_string()))
        }
        Verdict::RuntimeError | Verdict::TimeLimitExceeded | Verdict::ExecFormatError => {
            first_non_empty(&[&stderr, &message, &description])
        }
        Verdict::InQueue | Verdict::Processing => {
            Some(format!("submission still {}", verdict.as_str().replace('_', " ")))
        }
        Verdict::InternalError | Verdict::RateLimited | Verdict::Timeout | Verdict::NetworkError => {
            Some(first_non_empty(&[&message, &stderr]).unwrap_or_else(|| INTERNAL_FALLBACK.to_string()))
        }
    };

    ExecutionResult {
        passed: verdict == Verdict::Accepted,
        verdict,
        status_code: payload.status.id,
        status_description: description,
        stdout,
        stderr,
        compile_output,
        error,
        time_ms: payload.time.as_ref().and_then(|t| t.as_millis()),
        memory_kb: payload.memory,
        exit_code: payload.exit_code,
        token: payload.token.clone(),
    }
}

/// Decodes a base64 judge field. Line breaks inside the encoding are
/// ignored; data that is not valid base64 is returned as-is.
pub fn decode_field(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return String::new();
    };
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    match STANDARD.decode(compact.as_bytes()) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(_) => raw.to_string(),
    }
}

/// Blank text counts as absent; anything else is kept verbatim.
fn non_empty(text: &str) -> Option<String> {
    (!text.trim().is_empty()).then(|| text.to_string())
}

fn first_non_empty(candidates: &[&str]) -> Option<String> {
    candidates.iter().find_map(|text| non_empty(text))
}

#[cfg(test)]
mod tests {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use serde_json::json;

    use super::{ExecutionResult, Verdict, classify, decode_field};
    use crate::judge::{JudgePayload, JudgeStatus, JudgeTime};

    fn payload(id: u32, description: &str) -> JudgePayload {
        JudgePayload {
            status: JudgeStatus {
                id,
                description: description.to_string(),
            },
            ..JudgePayload::default()
        }
    }

    fn b64(text: &str) -> Option<String> {
        Some(STANDARD.encode(text))
    }

    #[test]
    fn accepted_decodes_output_and_time() {
        let mut p = payload(3, "Accepted");
        p.stdout = b64("[0,1]\n");
        p.time = Some(JudgeTime::Text("0.045".into()));
        p.memory = Some(9_216);
        p.exit_code = Some(0);

        let result = classify(&p);
        assert!(result.passed);
        assert_eq!(result.verdict, Verdict::Accepted);
        assert_eq!(result.stdout, "[0,1]\n");
        assert_eq!(result.error, None);
        assert_eq!(result.time_ms, Some(45.0));
        assert_eq!(result.memory_kb, Some(9_216));
    }

    #[test]
    fn compilation_error_carries_compile_output() {
        let mut p = payload(6, "Compilation Error");
        p.compile_output = b64("Main.java:3: error: ';' expected");

        let result = classify(&p);
        assert!(!result.passed);
        assert_eq!(result.verdict, Verdict::CompilationError);
        assert_eq!(result.error.as_deref(), Some("Main.java:3: error: ';' expected"));

        let result = classify(&payload(6, "Compilation Error"));
        assert_eq!(result.error.as_deref(), Some("Compilation failed"));
    }

    #[test]
    fn compile_output_is_kept_verbatim() {
        let output = "Main.java:5: error: cannot find symbol\n        retrun x;\n        ^\n1 error\n";
        let mut p = payload(6, "Compilation Error");
        p.compile_output = b64(output);

        let result = classify(&p);
        assert_eq!(result.compile_output, output);
        assert_eq!(result.error.as_deref(), Some(output));

        p.compile_output = b64("  \n");
        assert_eq!(classify(&p).error.as_deref(), Some("Compilation failed"));
    }

    #[test]
    fn runtime_stderr_keeps_trailing_newline() {
        let mut p = payload(11, "Runtime Error (NZEC)");
        p.stderr = b64("Traceback (most recent call last):\nZeroDivisionError: division by zero\n");
        assert_eq!(
            classify(&p).error.as_deref(),
            Some("Traceback (most recent call last):\nZeroDivisionError: division by zero\n")
        );
    }

    #[test]
    fn runtime_errors_prefer_stderr_then_message_then_description() {
        let mut p = payload(11, "Runtime Error (NZEC)");
        p.stderr = b64("IndexError: list index out of range");
        p.message = b64("Exited with error status 1");
        assert_eq!(
            classify(&p).error.as_deref(),
            Some("IndexError: list index out of range")
        );

        p.stderr = None;
        assert_eq!(classify(&p).error.as_deref(), Some("Exited with error status 1"));

        let tle = classify(&payload(5, "Time Limit Exceeded"));
        assert_eq!(tle.verdict, Verdict::TimeLimitExceeded);
        assert_eq!(tle.error.as_deref(), Some("Time Limit Exceeded"));

        assert_eq!(classify(&payload(14, "Exec Format Error")).verdict, Verdict::ExecFormatError);
    }

    #[test]
    fn wrong_answer_has_no_error_unless_stderr() {
        let result = classify(&payload(4, "Wrong Answer"));
        assert!(!result.passed);
        assert_eq!(result.error, None);

        let mut p = payload(4, "Wrong Answer");
        p.stderr = b64("warning: deprecated");
        assert_eq!(classify(&p).error.as_deref(), Some("warning: deprecated"));
    }

    #[test]
    fn internal_error_prefers_judge_message() {
        let mut p = payload(13, "Internal Error");
        p.stderr = b64("boom");
        assert_eq!(classify(&p).error.as_deref(), Some("boom"));

        p.message = b64("sandbox crashed");
        assert_eq!(classify(&p).error.as_deref(), Some("sandbox crashed"));

        assert_eq!(
            classify(&payload(13, "Internal Error")).error.as_deref(),
            Some("Judge internal error")
        );
    }

    #[test]
    fn base64_fields_tolerate_line_breaks_and_garbage() {
        assert_eq!(decode_field(Some("aGVsbG8g\nd29ybGQ=\n")), "hello world");
        assert_eq!(decode_field(None), "");
        assert_eq!(decode_field(Some("not base64!")), "not base64!");
    }

    #[test]
    fn local_results_never_pass() {
        for verdict in [Verdict::RateLimited, Verdict::Timeout, Verdict::NetworkError] {
            let result = ExecutionResult::local(verdict, "x");
            assert!(!result.passed);
            assert_eq!(result.status_code, 0);
            assert_eq!(result.error.as_deref(), Some("x"));
        }

        let mut p = payload(3, "Accepted");
        p.stdout = b64("[1,0]");
        let rewritten = classify(&p).into_wrong_answer();
        assert!(!rewritten.passed);
        assert_eq!(rewritten.status_code, 4);
        assert_eq!(rewritten.error, None);
    }

    #[test]
    fn serialized_result_uses_public_field_names() {
        let mut p = payload(3, "Accepted");
        p.stdout = b64("[0,1]\n");
        p.time = Some(JudgeTime::Text("0.045".into()));
        p.memory = Some(3_100);
        p.exit_code = Some(0);

        let value = serde_json::to_value(classify(&p)).unwrap();
        let mut keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "compilationOutput",
                "error",
                "executionTimeMs",
                "exitCode",
                "memoryKb",
                "output",
                "passed",
                "statusCode",
                "statusDescription",
                "stderr",
                "verdict",
            ]
        );
        assert_eq!(value["output"], json!("[0,1]\n"));
        assert_eq!(value["executionTimeMs"], json!(45.0));
        assert_eq!(value["verdict"], json!("accepted"));
    }
}
