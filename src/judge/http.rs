use std::time::Duration;

use async_trait::async_trait;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    config::JudgeConfig,
    judge::{JudgeClient, JudgeError, JudgePayload, JudgeSubmission, JudgeToken},
};

const ERROR_BODY_LIMIT: usize = 512;

/// Judge0-compatible client speaking the base64 variant of the API.
#[derive(Clone)]
pub struct HttpJudgeClient {
    client: reqwest::Client,
    base_url: String,
    headers: HeaderMap,
    timeout: Duration,
}

#[derive(Serialize)]
struct BatchRequest<'a> {
    submissions: &'a [JudgeSubmission],
}

#[derive(Deserialize)]
struct BatchPayload {
    #[serde(default)]
    submissions: Vec<Option<JudgePayload>>,
}

impl HttpJudgeClient {
    pub fn new(config: &JudgeConfig) -> Result<Self, JudgeError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            headers.insert(
                header_name(&config.auth_header)?,
                header_value(key)?,
            );
        }
        if let Some(host) = &config.host_header {
            headers.insert(HeaderName::from_static("x-rapidapi-host"), header_value(host)?);
        }

        let client = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_nodelay(true)
            .build()
            .map_err(JudgeError::from)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            headers,
            timeout: Duration::from_millis(config.timeout_ms),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send<T>(&self, request: reqwest::RequestBuilder) -> Result<T, JudgeError>
    where
        T: DeserializeOwned,
    {
        let response = request
            .headers(self.headers.clone())
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(JudgeError::RateLimited);
        }
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > ERROR_BODY_LIMIT {
                let cut = (0..=ERROR_BODY_LIMIT)
                    .rev()
                    .find(|i| body.is_char_boundary(*i))
                    .unwrap_or(0);
                body.truncate(cut);
            }
            return Err(JudgeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|err| JudgeError::Decode(err.to_string()))
    }
}

#[async_trait]
impl JudgeClient for HttpJudgeClient {
    async fn create(&self, submission: &JudgeSubmission) -> Result<JudgeToken, JudgeError> {
        let request = self
            .client
            .post(self.url("/submissions"))
            .query(&[("base64_encoded", "true"), ("wait", "false")])
            .json(submission);
        self.send(request).await
    }

    async fn fetch(&self, token: &str) -> Result<JudgePayload, JudgeError> {
        let request = self
            .client
            .get(self.url(&format!("/submissions/{token}")))
            .query(&[("base64_encoded", "true"), ("fields", "*")]);
        self.send(request).await
    }

    async fn create_batch(
        &self,
        submissions: &[JudgeSubmission],
    ) -> Result<Vec<JudgeToken>, JudgeError> {
        let request = self
            .client
            .post(self.url("/submissions/batch"))
            .query(&[("base64_encoded", "true")])
            .json(&BatchRequest { submissions });
        self.send(request).await
    }

    async fn fetch_batch(&self, tokens: &[String]) -> Result<Vec<JudgePayload>, JudgeError> {
        let joined = tokens.join(",");
        let request = self
            .client
            .get(self.url("/submissions/batch"))
            .query(&[
                ("tokens", joined.as_str()),
                ("base64_encoded", "true"),
                ("fields", "*"),
            ]);
        let payload: BatchPayload = self.send(request).await?;
        Ok(payload
            .submissions
            .into_iter()
            .map(Option::unwrap_or_default)
            .collect())
    }
}

fn header_name(raw: &str) -> Result<HeaderName, JudgeError> {
    HeaderName::from_bytes(raw.trim().as_bytes())
        .map_err(|err| JudgeError::Transport(format!("invalid judge auth header {raw:?}: {err}")))
}

fn header_value(raw: &str) -> Result<HeaderValue, JudgeError> {
    HeaderValue::from_str(raw.trim())
        .map_err(|err| JudgeError::Transport(format!("invalid judge header value: {err}")))
}
