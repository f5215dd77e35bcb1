use anyhow::{Context, Result, anyhow, ensure};
use std::{env, net::SocketAddr, str::FromStr, time::Duration};

use crate::judge::{ExecutionLimits, orchestrator::PollPolicy};

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    pub judge: JudgeConfig,
    pub polling: PollingConfig,
    pub max_test_cases: usize,
    pub max_source_bytes: usize,
    pub log: LogConfig,
}

#[derive(Debug, Clone)]
pub struct JudgeConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub auth_header: String,
    pub host_header: Option<String>,
    pub timeout_ms: u64,
    pub limits: ExecutionLimits,
}

#[derive(Debug, Clone, Copy)]
pub struct PollingConfig {
    pub single: PollPolicy,
    pub batch: PollPolicy,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" | "text" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!("unsupported log format: {other}")),
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = var("BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string())
            .parse::<SocketAddr>()
            .context("invalid BIND_ADDR")?;

        let base_url = var("JUDGE_BASE_URL")
            .unwrap_or_else(|| "http://127.0.0.1:2358".to_string())
            .trim_end_matches('/')
            .to_string();
        ensure!(
            base_url.starts_with("http://") || base_url.starts_with("https://"),
            "JUDGE_BASE_URL must be an http(s) URL, got {base_url:?}"
        );

        let judge = JudgeConfig {
            base_url,
            api_key: var("JUDGE_API_KEY"),
            auth_header: var("JUDGE_AUTH_HEADER").unwrap_or_else(|| "X-Auth-Token".to_string()),
            host_header: var("JUDGE_HOST_HEADER"),
            timeout_ms: parse_var(&var, "JUDGE_TIMEOUT_MS", 10_000u64)?,
            limits: ExecutionLimits {
                cpu_time_limit: parse_var(&var, "JUDGE_CPU_TIME_LIMIT", 5.0f64)?,
                wall_time_limit: parse_var(&var, "JUDGE_WALL_TIME_LIMIT", 10.0f64)?,
                memory_limit_kb: parse_var(&var, "JUDGE_MEMORY_LIMIT_KB", 128_000u64)?,
            },
        };
        ensure!(judge.timeout_ms > 0, "JUDGE_TIMEOUT_MS must be greater than zero");
        ensure!(
            judge.limits.cpu_time_limit > 0.0
                && judge.limits.wall_time_limit > 0.0
                && judge.limits.memory_limit_kb > 0,
            "judge execution limits must be greater than zero"
        );

        let polling = PollingConfig {
            single: PollPolicy {
                max_polls: parse_var(&var, "POLL_MAX_RETRIES", PollPolicy::SINGLE.max_polls)?,
                delay: Duration::from_millis(parse_var(&var, "POLL_DELAY_MS", 1_000u64)?),
            },
            batch: PollPolicy {
                max_polls: parse_var(&var, "BATCH_POLL_MAX_RETRIES", PollPolicy::BATCH.max_polls)?,
                delay: Duration::from_millis(parse_var(&var, "BATCH_POLL_DELAY_MS", 1_500u64)?),
            },
        };
        ensure!(
            polling.single.max_polls > 0 && polling.batch.max_polls > 0,
            "poll retry counts must be greater than zero"
        );

        let max_test_cases = parse_var(&var, "MAX_TEST_CASES", 50usize)?;
        ensure!(max_test_cases > 0, "MAX_TEST_CASES must be greater than zero");

        let log = LogConfig {
            level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            format: var("LOG_FORMAT")
                .map(|raw| raw.parse::<LogFormat>().map_err(|e| anyhow!(e)))
                .transpose()?
                .unwrap_or_default(),
        };

        Ok(Self {
            bind_addr,
            judge,
            polling,
            max_test_cases,
            max_source_bytes: parse_var(&var, "MAX_SOURCE_BYTES", 64 * 1024usize)?,
            log,
        })
    }
}

fn parse_var<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|err| anyhow!("invalid {key} value {raw:?}: {err}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, time::Duration};

    use super::{LogFormat, ServiceConfig};

    fn load(pairs: &[(&str, &str)]) -> anyhow::Result<ServiceConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_match_judge_conventions() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.judge.base_url, "http://127.0.0.1:2358");
        assert_eq!(cfg.polling.single.max_polls, 10);
        assert_eq!(cfg.polling.single.delay, Duration::from_millis(1_000));
        assert_eq!(cfg.polling.batch.max_polls, 20);
        assert_eq!(cfg.polling.batch.delay, Duration::from_millis(1_500));
        assert_eq!(cfg.log.format, LogFormat::Compact);
        assert!(cfg.judge.api_key.is_none());
    }

    #[test]
    fn reads_overrides() {
        let cfg = load(&[
            ("JUDGE_BASE_URL", "https://judge0.example.com/"),
            ("JUDGE_API_KEY", "k"),
            ("JUDGE_HOST_HEADER", "judge0-ce.p.rapidapi.com"),
            ("POLL_MAX_RETRIES", "3"),
            ("LOG_FORMAT", "json"),
        ])
        .unwrap();
        assert_eq!(cfg.judge.base_url, "https://judge0.example.com");
        assert_eq!(cfg.judge.api_key.as_deref(), Some("k"));
        assert_eq!(cfg.polling.single.max_polls, 3);
        assert_eq!(cfg.log.format, LogFormat::Json);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(load(&[("JUDGE_BASE_URL", "judge:2358")]).is_err());
        assert!(load(&[("JUDGE_TIMEOUT_MS", "0")]).is_err());
        assert!(load(&[("POLL_MAX_RETRIES", "ten")]).is_err());
        assert!(load(&[("LOG_FORMAT", "xml")]).is_err());
        assert!(load(&[("BIND_ADDR", "nowhere")]).is_err());
    }
}
