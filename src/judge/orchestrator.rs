use std::{sync::Arc, time::Duration};

use async_trait::async_trait;

use crate::{
    harness::SynthesizedProgram,
    judge::{
        ExecutionLimits, JudgeClient, JudgeError, JudgePayload, JudgeSubmission,
        classifier::{ExecutionResult, Verdict, classify},
    },
    metrics::MetricsRegistry,
};

/// Bounded polling: sleep `delay`, then poll, at most `max_polls` times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_polls: u32,
    pub delay: Duration,
}

impl PollPolicy {
    pub const SINGLE: Self = Self {
        max_polls: 10,
        delay: Duration::from_millis(1_000),
    };
    pub const BATCH: Self = Self {
        max_polls: 20,
        delay: Duration::from_millis(1_500),
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    InQueue,
    Processing,
    Terminal,
}

impl PollState {
    pub fn of(payload: &JudgePayload) -> Self {
        match Verdict::from_status_id(payload.status.id) {
            Verdict::InQueue => Self::InQueue,
            Verdict::Processing => Self::Processing,
            _ => Self::Terminal,
        }
    }
}

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Submits programs to the judge and waits for their verdicts. Every judge
/// failure comes back as an [`ExecutionResult`]; nothing is resubmitted.
#[derive(Clone)]
pub struct Orchestrator {
    client: Arc<dyn JudgeClient>,
    sleeper: Arc<dyn Sleeper>,
    metrics: Arc<MetricsRegistry>,
    limits: ExecutionLimits,
    single: PollPolicy,
    batch: PollPolicy,
}

impl Orchestrator {
    pub fn new(
        client: Arc<dyn JudgeClient>,
        sleeper: Arc<dyn Sleeper>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            client,
            sleeper,
            metrics,
            limits: ExecutionLimits::default(),
            single: PollPolicy::SINGLE,
            batch: PollPolicy::BATCH,
        }
    }

    pub fn with_limits(mut self, limits: ExecutionLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_policies(mut self, single: PollPolicy, batch: PollPolicy) -> Self {
        self.single = single;
        self.batch = batch;
        self
    }

    pub async fn submit_one(
        &self,
        program: &SynthesizedProgram,
        stdin: Option<&str>,
        expected_output: Option<&str>,
    ) -> ExecutionResult {
        let submission = JudgeSubmission::encode(program, stdin, expected_output, &self.limits);
        self.metrics.submitted(1);

        let token = match self.client.create(&submission).await {
            Ok(created) => match created.token {
                Some(token) => token,
                None => {
                    let reason = created.rejection();
                    tracing::warn!(language = %program.language, reason = %reason, "judge rejected submission");
                    return self.finish(ExecutionResult::local(
                        Verdict::InternalError,
                        format!("judge rejected submission: {reason}"),
                    ));
                }
            },
            Err(err) => {
                tracing::warn!(language = %program.language, error = %err, "submission create failed");
                return self.finish(failure(err));
            }
        };

        tracing::debug!(token = %token, language = %program.language, "submission created");
        let result = self.poll_one(&token).await;
        self.finish(result.with_token(token))
    }

    async fn poll_one(&self, token: &str) -> ExecutionResult {
        let policy = self.single;
        for attempt in 1..=policy.max_polls {
            self.sleeper.sleep(policy.delay).await;
            self.metrics.polled(1);

            match self.client.fetch(token).await {
                Ok(payload) => match PollState::of(&payload) {
                    PollState::Terminal => return classify(&payload),
                    state => tracing::debug!(token, attempt, ?state, "submission pending"),
                },
                Err(err) => {
                    tracing::warn!(token, attempt, error = %err, "submission poll failed");
                    return failure(err);
                }
            }
        }

        tracing::warn!(token, polls = policy.max_polls, "submission never reached a terminal state");
        timed_out(policy)
    }

    /// One result per program, in input order.
    pub async fn submit_batch(&self, programs: &[SynthesizedProgram]) -> Vec<ExecutionResult> {
        if programs.is_empty() {
            return Vec::new();
        }

        let submissions: Vec<JudgeSubmission> = programs
            .iter()
            .map(|program| JudgeSubmission::encode(program, None, None, &self.limits))
            .collect();
        self.metrics.submitted(programs.len() as u64);

        let created = match self.client.create_batch(&submissions).await {
            Ok(created) => created,
            Err(err) => {
                tracing::warn!(size = programs.len(), error = %err, "batch create failed");
                let result = failure(err);
                return programs.iter().map(|_| self.finish(result.clone())).collect();
            }
        };

        let mut results: Vec<Option<ExecutionResult>> = vec![None; programs.len()];
        let mut pending: Vec<(usize, String)> = Vec::new();
        for idx in 0..programs.len() {
            match created.get(idx).and_then(|item| item.token.clone()) {
                Some(token) => pending.push((idx, token)),
                None => {
                    let reason = created
                        .get(idx)
                        .map(|item| item.rejection())
                        .unwrap_or_else(|| "missing from batch response".to_string());
                    tracing::warn!(index = idx, reason = %reason, "judge rejected batch item");
                    results[idx] = Some(ExecutionResult::local(
                        Verdict::InternalError,
                        format!("judge rejected batch item {idx}: {reason}"),
                    ));
                }
            }
        }

        let policy = self.batch;
        let mut polls = 0;
        while !pending.is_empty() && polls < policy.max_polls {
            polls += 1;
            self.sleeper.sleep(policy.delay).await;
            self.metrics.polled(1);

            let tokens: Vec<String> = pending.iter().map(|(_, token)| token.clone()).collect();
            let payloads = match self.client.fetch_batch(&tokens).await {
                Ok(payloads) => payloads,
                Err(err) => {
                    tracing::warn!(pending = pending.len(), polls, error = %err, "batch poll failed");
                    let result = failure(err);
                    for (idx, token) in pending.drain(..) {
                        results[idx] = Some(result.clone().with_token(token));
                    }
                    break;
                }
            };

            let mut still_pending = Vec::new();
            for (pos, (idx, token)) in pending.into_iter().enumerate() {
                let payload = payloads
                    .iter()
                    .find(|p| p.token.as_deref() == Some(token.as_str()))
                    .or_else(|| payloads.get(pos).filter(|p| p.token.is_none()));
                match payload {
                    Some(payload) if PollState::of(payload) == PollState::Terminal => {
                        results[idx] = Some(classify(payload).with_token(token));
                    }
                    _ => still_pending.push((idx, token)),
                }
            }
            tracing::debug!(polls, pending = still_pending.len(), "batch poll finished");
            pending = still_pending;
        }

        if !pending.is_empty() {
            tracing::warn!(pending = pending.len(), polls, "batch items never reached a terminal state");
        }
        for (idx, token) in pending {
            results[idx] = Some(timed_out(policy).with_token(token));
        }

        results
            .into_iter()
            .map(|result| {
                self.finish(result.unwrap_or_else(|| {
                    ExecutionResult::local(Verdict::InternalError, "missing batch result")
                }))
            })
            .collect()
    }

    fn finish(&self, result: ExecutionResult) -> ExecutionResult {
        self.metrics.record_verdict(result.verdict);
        result
    }
}

fn failure(err: JudgeError) -> ExecutionResult {
    match err {
        JudgeError::RateLimited => ExecutionResult::local(Verdict::RateLimited, err.to_string()),
        other => ExecutionResult::local(Verdict::NetworkError, other.to_string()),
    }
}

fn timed_out(policy: PollPolicy) -> ExecutionResult {
    ExecutionResult::local(
        Verdict::Timeout,
        format!(
            "judge did not finish after {} polls ({} ms apart)",
            policy.max_polls,
            policy.delay.as_millis()
        ),
    )
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use super::{Orchestrator, PollPolicy};
    use crate::{
        harness::SynthesizedProgram,
        judge::{
            JudgeError, JudgeToken,
            classifier::Verdict,
            fake::{RecordingSleeper, ScriptedJudge, accepted, payload, queued},
        },
        language::Language,
        metrics::MetricsRegistry,
    };

    fn program(text: &str) -> SynthesizedProgram {
        SynthesizedProgram {
            language: Language::Python,
            text: text.to_string(),
        }
    }

    fn orchestrator(judge: &Arc<ScriptedJudge>, sleeper: &Arc<RecordingSleeper>) -> Orchestrator {
        Orchestrator::new(judge.clone(), sleeper.clone(), Arc::new(MetricsRegistry::new()))
    }

    #[tokio::test]
    async fn polls_until_terminal() {
        let judge = Arc::new(
            ScriptedJudge::new()
                .on_poll(Ok(queued()))
                .on_poll(Ok(queued()))
                .on_poll(Ok(payload(2, "Processing", "")))
                .on_poll(Ok(accepted("[0,1]\n"))),
        );
        let sleeper = Arc::new(RecordingSleeper::default());

        let result = orchestrator(&judge, &sleeper)
            .submit_one(&program("print([0,1])"), None, None)
            .await;

        assert!(result.passed);
        assert_eq!(result.stdout, "[0,1]\n");
        assert_eq!(result.token.as_deref(), Some("tok-0"));
        assert_eq!(judge.count("create"), 1);
        assert_eq!(judge.count("fetch"), 4);
        assert_eq!(sleeper.naps(), vec![Duration::from_millis(1_000); 4]);
    }

    #[tokio::test]
    async fn never_terminating_submission_times_out_after_max_polls() {
        let judge = Arc::new(ScriptedJudge::new());
        let sleeper = Arc::new(RecordingSleeper::default());

        let result = orchestrator(&judge, &sleeper)
            .submit_one(&program("while True: pass"), None, None)
            .await;

        assert!(!result.passed);
        assert_eq!(result.verdict, Verdict::Timeout);
        assert_eq!(result.status_code, 0);
        assert_eq!(judge.count("fetch"), PollPolicy::SINGLE.max_polls as usize);
    }

    #[tokio::test]
    async fn rate_limit_on_create_skips_polling() {
        let judge = Arc::new(ScriptedJudge::new().on_create(Err(JudgeError::RateLimited)));
        let sleeper = Arc::new(RecordingSleeper::default());

        let result = orchestrator(&judge, &sleeper)
            .submit_one(&program("print(1)"), None, None)
            .await;

        assert_eq!(result.verdict, Verdict::RateLimited);
        assert!(!result.passed);
        assert!(result.error.is_some());
        assert_eq!(judge.calls(), vec!["create"]);
        assert!(sleeper.naps().is_empty());
    }

    #[tokio::test]
    async fn rate_limit_while_polling_stops_immediately() {
        let judge = Arc::new(
            ScriptedJudge::new()
                .on_poll(Ok(queued()))
                .on_poll(Err(JudgeError::RateLimited)),
        );
        let sleeper = Arc::new(RecordingSleeper::default());

        let result = orchestrator(&judge, &sleeper)
            .submit_one(&program("print(1)"), None, None)
            .await;

        assert_eq!(result.verdict, Verdict::RateLimited);
        assert_eq!(judge.count("fetch"), 2);
        assert_eq!(judge.count("create"), 1);
    }

    #[tokio::test]
    async fn transport_failures_become_network_errors() {
        let judge = Arc::new(ScriptedJudge::new().on_create(Err(JudgeError::Status {
            status: 500,
            body: "oops".to_string(),
        })));
        let sleeper = Arc::new(RecordingSleeper::default());

        let result = orchestrator(&judge, &sleeper)
            .submit_one(&program("print(1)"), Some("in"), Some("out"))
            .await;

        assert_eq!(result.verdict, Verdict::NetworkError);
        assert!(result.error.unwrap().contains("500"));
        let sent = judge.submitted();
        assert_eq!(sent[0].stdin.as_deref(), Some("aW4="));
        assert_eq!(sent[0].expected_output.as_deref(), Some("b3V0"));
    }

    #[tokio::test]
    async fn batch_keeps_order_and_refetches_only_pending_tokens() {
        let judge = Arc::new(
            ScriptedJudge::new()
                .on_batch_poll("tok-0", queued())
                .on_batch_poll("tok-0", accepted("a"))
                .on_batch_poll("tok-1", payload(6, "Compilation Error", ""))
                .on_batch_poll("tok-2", accepted("c")),
        );
        let sleeper = Arc::new(RecordingSleeper::default());
        let programs = [program("a"), program("b"), program("c")];

        let results = orchestrator(&judge, &sleeper).submit_batch(&programs).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].stdout, "a");
        assert_eq!(results[1].verdict, Verdict::CompilationError);
        assert_eq!(results[2].stdout, "c");
        assert_eq!(
            judge.calls(),
            vec!["create_batch 3", "fetch_batch tok-0,tok-1,tok-2", "fetch_batch tok-0"]
        );
        assert_eq!(sleeper.naps(), vec![Duration::from_millis(1_500); 2]);
    }

    #[tokio::test]
    async fn rejected_batch_item_fails_alone() {
        let mut rejected = JudgeToken::default();
        rejected
            .rejected
            .insert("language_id".to_string(), serde_json::json!(["is invalid"]));
        let judge = Arc::new(
            ScriptedJudge::new()
                .on_create_batch(Ok(vec![JudgeToken::new("t1"), rejected]))
                .on_batch_poll("t1", accepted("ok")),
        );
        let sleeper = Arc::new(RecordingSleeper::default());

        let results = orchestrator(&judge, &sleeper)
            .submit_batch(&[program("a"), program("b")])
            .await;

        assert!(results[0].passed);
        assert_eq!(results[1].verdict, Verdict::InternalError);
        assert!(results[1].error.as_deref().unwrap().contains("is invalid"));
        assert_eq!(judge.count("fetch_batch"), 1);
    }

    #[tokio::test]
    async fn batch_times_out_and_rate_limits_per_item() {
        let judge = Arc::new(ScriptedJudge::new().on_batch_poll("tok-1", accepted("done")));
        let sleeper = Arc::new(RecordingSleeper::default());
        let policy = PollPolicy {
            max_polls: 3,
            delay: Duration::from_millis(5),
        };

        let results = orchestrator(&judge, &sleeper)
            .with_policies(PollPolicy::SINGLE, policy)
            .submit_batch(&[program("a"), program("b")])
            .await;
        assert_eq!(results[0].verdict, Verdict::Timeout);
        assert!(results[1].passed);
        assert_eq!(judge.count("fetch_batch"), 3);

        let judge = Arc::new(ScriptedJudge::new().on_batch_poll_error(JudgeError::RateLimited));
        let results = orchestrator(&judge, &sleeper)
            .submit_batch(&[program("a"), program("b")])
            .await;
        assert!(results.iter().all(|r| r.verdict == Verdict::RateLimited));
        assert_eq!(judge.count("fetch_batch"), 1);
    }
}
