use std::sync::atomic::{AtomicU64, Ordering};

use crate::judge::classifier::Verdict;

#[derive(Debug, Default)]
pub struct MetricsRegistry {
    harness_synthesized_total: AtomicU64,
    harness_failed_total: AtomicU64,
    judge_submissions_total: AtomicU64,
    judge_polls_total: AtomicU64,
    evaluations_total: AtomicU64,
    cases_passed_total: AtomicU64,
    cases_failed_total: AtomicU64,
    verdicts: [AtomicU64; Verdict::ALL.len()],
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn synthesized(&self) {
        self.harness_synthesized_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn synthesis_failed(&self) {
        self.harness_failed_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn submitted(&self, count: u64) {
        self.judge_submissions_total.fetch_add(count, Ordering::Relaxed);
    }

    pub fn polled(&self, count: u64) {
        self.judge_polls_total.fetch_add(count, Ordering::Relaxed);
    }

    pub fn evaluated(&self, passed: u64, failed: u64) {
        self.evaluations_total.fetch_add(1, Ordering::Relaxed);
        self.cases_passed_total.fetch_add(passed, Ordering::Relaxed);
        self.cases_failed_total.fetch_add(failed, Ordering::Relaxed);
    }

    pub fn record_verdict(&self, verdict: Verdict) {
        if let Some(idx) = Verdict::ALL.iter().position(|v| *v == verdict) {
            self.verdicts[idx].fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn render_prometheus(&self) -> String {
        let mut out = format!(
            concat!(
                "# TYPE harness_synthesized_total counter\n",
                "harness_synthesized_total {}\n",
                "# TYPE harness_failed_total counter\n",
                "harness_failed_total {}\n",
                "# TYPE judge_submissions_total counter\n",
                "judge_submissions_total {}\n",
                "# TYPE judge_polls_total counter\n",
                "judge_polls_total {}\n",
                "# TYPE evaluations_total counter\n",
                "evaluations_total {}\n",
                "# TYPE evaluation_cases_passed_total counter\n",
                "evaluation_cases_passed_total {}\n",
                "# TYPE evaluation_cases_failed_total counter\n",
                "evaluation_cases_failed_total {}\n",
                "# TYPE judge_verdicts_total counter\n"
            ),
            self.harness_synthesized_total.load(Ordering::Relaxed),
            self.harness_failed_total.load(Ordering::Relaxed),
            self.judge_submissions_total.load(Ordering::Relaxed),
            self.judge_polls_total.load(Ordering::Relaxed),
            self.evaluations_total.load(Ordering::Relaxed),
            self.cases_passed_total.load(Ordering::Relaxed),
            self.cases_failed_total.load(Ordering::Relaxed),
        );
        for (verdict, counter) in Verdict::ALL.iter().zip(&self.verdicts) {
            out.push_str(&format!(
                "judge_verdicts_total{{verdict=\"{verdict}\"}} {}\n",
                counter.load(Ordering::Relaxed)
            ));
        }
        out
    }
}
