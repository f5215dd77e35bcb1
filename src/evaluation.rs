use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    harness::{
        HarnessSynthesisError, Submission, SynthesizedProgram, canonical, synthesize,
    },
    judge::{
        classifier::{ExecutionResult, Verdict},
        orchestrator::Orchestrator,
    },
    language::Language,
    metrics::MetricsRegistry,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    #[serde(default)]
    pub arguments: Vec<Value>,
    /// Canonical expected output; strings are taken verbatim, anything else
    /// is rendered in canonical form first.
    #[serde(default)]
    pub expected_output: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRequest {
    pub source_code: String,
    pub language: Language,
    pub entry_point_name: String,
    pub test_cases: Vec<TestCase>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseReport {
    pub index: usize,
    pub expected_output: Option<String>,
    #[serde(flatten)]
    pub result: ExecutionResult,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationReport {
    pub id: Uuid,
    pub language: Language,
    pub passed: usize,
    pub total: usize,
    pub all_passed: bool,
    pub results: Vec<CaseReport>,
    pub completed_at: DateTime<Utc>,
}

/// Synthesizes one harness per test case, runs them and compares outputs.
/// Synthesis failures abort before anything reaches the judge.
pub async fn evaluate(
    orchestrator: &Orchestrator,
    metrics: &MetricsRegistry,
    request: EvaluationRequest,
) -> Result<EvaluationReport, HarnessSynthesisError> {
    let id = Uuid::new_v4();
    let programs = synthesize_cases(&request).inspect_err(|err| {
        metrics.synthesis_failed();
        tracing::info!(evaluation = %id, language = %request.language, error = %err, "harness synthesis failed");
    })?;
    for _ in &programs {
        metrics.synthesized();
    }

    tracing::info!(
        evaluation = %id,
        language = %request.language,
        entry_point = %request.entry_point_name,
        cases = programs.len(),
        "evaluating submission"
    );

    let raw = match programs.as_slice() {
        [] => Vec::new(),
        [single] => vec![orchestrator.submit_one(single, None, None).await],
        many => orchestrator.submit_batch(many).await,
    };

    let results: Vec<CaseReport> = request
        .test_cases
        .iter()
        .zip(raw)
        .enumerate()
        .map(|(index, (case, result))| {
            let expected = case.expected_output.as_ref().map(canonical::render);
            CaseReport {
                index,
                result: compare(result, expected.as_deref()),
                expected_output: expected,
            }
        })
        .collect();

    let total = results.len();
    let passed = results.iter().filter(|case| case.result.passed).count();
    metrics.evaluated(passed as u64, (total - passed) as u64);
    tracing::info!(evaluation = %id, passed, total, "evaluation finished");

    Ok(EvaluationReport {
        id,
        language: request.language,
        passed,
        total,
        all_passed: total > 0 && passed == total,
        results,
        completed_at: Utc::now(),
    })
}

fn synthesize_cases(request: &EvaluationRequest) -> Result<Vec<SynthesizedProgram>, HarnessSynthesisError> {
    request
        .test_cases
        .iter()
        .map(|case| {
            synthesize(&Submission {
                source_code: request.source_code.clone(),
                language: request.language,
                entry_point_name: request.entry_point_name.clone(),
                arguments: case.arguments.clone(),
            })
        })
        .collect()
}

/// Accepted runs whose stdout differs from the expected canonical output
/// become Wrong Answer.
fn compare(result: ExecutionResult, expected: Option<&str>) -> ExecutionResult {
    match expected {
        Some(expected)
            if result.verdict == Verdict::Accepted
                && !canonical::outputs_match(&result.stdout, expected) =>
        {
            result.into_wrong_answer()
        }
        _ => result,
    }
}
