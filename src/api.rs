use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;

use crate::{
    error::{ServiceError, ServiceResult},
    evaluation::{self, EvaluationReport, EvaluationRequest},
    harness::{self, Submission, SynthesizedProgram},
    judge::{classifier::ExecutionResult, orchestrator::Orchestrator},
    language::{self, Language, LanguageInfo},
    metrics::MetricsRegistry,
};

#[derive(Clone)]
pub struct AppState {
    orchestrator: Orchestrator,
    metrics: Arc<MetricsRegistry>,
    max_test_cases: usize,
    max_source_bytes: usize,
}

impl AppState {
    pub fn new(
        orchestrator: Orchestrator,
        metrics: Arc<MetricsRegistry>,
        max_test_cases: usize,
        max_source_bytes: usize,
    ) -> Self {
        Self {
            orchestrator,
            metrics,
            max_test_cases,
            max_source_bytes,
        }
    }
}

/// Raw program execution without a harness.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub source_code: String,
    pub language: Language,
    #[serde(default)]
    pub stdin: Option<String>,
    #[serde(default)]
    pub expected_output: Option<String>,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/metrics", get(metrics))
        .route("/v1/languages", get(languages))
        .route("/v1/harness", post(build_harness))
        .route("/v1/evaluate", post(evaluate))
        .route("/v1/run", post(run))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

async fn metrics(State(state): State<AppState>) -> (StatusCode, String) {
    (StatusCode::OK, state.metrics.render_prometheus())
}

async fn languages() -> Json<Vec<LanguageInfo>> {
    Json(language::registry())
}

async fn build_harness(
    State(state): State<AppState>,
    Json(submission): Json<Submission>,
) -> ServiceResult<Json<SynthesizedProgram>> {
    check_source(&state, &submission.source_code)?;
    match harness::synthesize(&submission) {
        Ok(program) => {
            state.metrics.synthesized();
            Ok(Json(program))
        }
        Err(err) => {
            state.metrics.synthesis_failed();
            Err(err.into())
        }
    }
}

async fn evaluate(
    State(state): State<AppState>,
    Json(request): Json<EvaluationRequest>,
) -> ServiceResult<Json<EvaluationReport>> {
    check_source(&state, &request.source_code)?;
    if request.test_cases.is_empty() {
        return Err(ServiceError::InvalidRequest(
            "at least one test case is required".to_string(),
        ));
    }
    if request.test_cases.len() > state.max_test_cases {
        return Err(ServiceError::InvalidRequest(format!(
            "too many test cases; max is {}",
            state.max_test_cases
        )));
    }

    let report = evaluation::evaluate(&state.orchestrator, &state.metrics, request).await?;
    Ok(Json(report))
}

async fn run(
    State(state): State<AppState>,
    Json(request): Json<RunRequest>,
) -> ServiceResult<Json<ExecutionResult>> {
    check_source(&state, &request.source_code)?;
    let program = SynthesizedProgram {
        language: request.language,
        text: request.source_code,
    };
    let result = state
        .orchestrator
        .submit_one(
            &program,
            request.stdin.as_deref(),
            request.expected_output.as_deref(),
        )
        .await;
    Ok(Json(result))
}

fn check_source(state: &AppState, source: &str) -> ServiceResult<()> {
    if source.trim().is_empty() {
        return Err(ServiceError::InvalidRequest("sourceCode is empty".to_string()));
    }
    if source.len() > state.max_source_bytes {
        return Err(ServiceError::InvalidRequest(format!(
            "sourceCode exceeds {} bytes",
            state.max_source_bytes
        )));
    }
    Ok(())
}
