//! Client for the Hugging Face Inference API.
//!
//! Text classification, audio classification and speech recognition all go
//! through `POST {endpoint}/models/{model}`. Cold models answer 503 while
//! loading, so every call is wrapped in [`retry_with_backoff`].

use crate::config::{ApiKey, HfConfig};
use crate::emotion::LabelScore;
use crate::util::retry::{is_http_retryable, retry_with_backoff, RetryConfig};
use bytes::Bytes;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

const LOG_TARGET: &str = "hf";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(thiserror::Error, Debug)]
pub enum HfError {
    #[error("invalid endpoint: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl HfError {
    fn is_retryable(&self) -> bool {
        match self {
            HfError::Status { status, .. } => is_http_retryable(*status),
            HfError::Network(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

#[derive(Serialize)]
struct TextRequest<'a> {
    inputs: &'a str,
    options: RequestOptions,
}

#[derive(Serialize)]
struct RequestOptions {
    wait_for_model: bool,
}

// Text classification nests one list per input; audio classification does not.
#[derive(Deserialize)]
#[serde(untagged)]
enum ClassificationResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

#[derive(Deserialize)]
struct AsrResponse {
    text: String,
}

#[derive(Clone)]
pub struct HfInferenceClient {
    client: Client,
    endpoint: Url,
    token: Option<ApiKey>,
    retry: RetryConfig,
}

impl HfInferenceClient {
    pub fn new(config: &HfConfig) -> Result<Self, HfError> {
        let mut endpoint = Url::parse(&config.endpoint)?;
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint,
            token: config.api_token.clone(),
            retry: RetryConfig::default(),
        })
    }

    pub fn model_url(&self, model: &str) -> Result<Url, HfError> {
        Ok(self.endpoint.join(&format!("models/{model}"))?)
    }

    fn post(&self, url: Url) -> RequestBuilder {
        let req = self.client.post(url);
        match &self.token {
            Some(token) => req.bearer_auth(token.expose()),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<String, HfError> {
        let response = req.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(HfError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    /// Labels for `text`, best first.
    pub async fn classify_text(&self, model: &str, text: &str) -> Result<Vec<LabelScore>, HfError> {
        let url = self.model_url(model)?;
        let body = retry_with_backoff(
            &self.retry,
            || {
                let req = self.post(url.clone()).json(&TextRequest {
                    inputs: text,
                    options: RequestOptions {
                        wait_for_model: true,
                    },
                });
                self.send(req)
            },
            HfError::is_retryable,
        )
        .await?;
        tracing::debug!(target: LOG_TARGET, model, "text classification response received");
        parse_classification(&body)
    }

    /// Labels for an encoded audio file, best first.
    pub async fn classify_audio(
        &self,
        model: &str,
        audio: Bytes,
    ) -> Result<Vec<LabelScore>, HfError> {
        let url = self.model_url(model)?;
        let body = retry_with_backoff(
            &self.retry,
            || self.send(self.post(url.clone()).body(audio.clone())),
            HfError::is_retryable,
        )
        .await?;
        tracing::debug!(target: LOG_TARGET, model, "audio classification response received");
        parse_classification(&body)
    }

    pub async fn transcribe(&self, model: &str, audio: Bytes) -> Result<String, HfError> {
        let url = self.model_url(model)?;
        let body = retry_with_backoff(
            &self.retry,
            || self.send(self.post(url.clone()).body(audio.clone())),
            HfError::is_retryable,
        )
        .await?;
        let parsed: AsrResponse = serde_json::from_str(&body)
            .map_err(|e| HfError::InvalidResponse(format!("failed to parse JSON: {e}")))?;
        Ok(parsed.text)
    }
}

pub(crate) fn parse_classification(body: &str) -> Result<Vec<LabelScore>, HfError> {
    let parsed: ClassificationResponse = serde_json::from_str(body)
        .map_err(|e| HfError::InvalidResponse(format!("failed to parse JSON: {e}")))?;
    let mut labels = match parsed {
        ClassificationResponse::Nested(mut outer) => {
            if outer.is_empty() {
                Vec::new()
            } else {
                outer.swap_remove(0)
            }
        }
        ClassificationResponse::Flat(labels) => labels,
    };
    labels.sort_by(|a, b| b.score.total_cmp(&a.score));
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_response_is_sorted_best_first() {
        let body = r#"[[{"label":"sadness","score":0.1},{"label":"joy","score":0.8},{"label":"neutral","score":0.1}]]"#;
        let labels = parse_classification(body).expect("parse");
        assert_eq!(labels[0].label, "joy");
        assert_eq!(labels.len(), 3);
    }

    #[test]
    fn flat_response_parses() {
        let body = r#"[{"label":"neu","score":0.3},{"label":"hap","score":0.6}]"#;
        let labels = parse_classification(body).expect("parse");
        assert_eq!(labels[0].label, "hap");
    }

    #[test]
    fn error_body_is_invalid_response() {
        let err = parse_classification(r#"{"error":"Model is loading"}"#).unwrap_err();
        assert!(matches!(err, HfError::InvalidResponse(_)));
    }

    #[test]
    fn model_url_keeps_endpoint_path() {
        let client = HfInferenceClient::new(&HfConfig {
            endpoint: "http://localhost:8080/proxy".to_owned(),
            api_token: None,
        })
        .expect("client");
        let url = client.model_url("superb/wav2vec2-base-superb-er").expect("url");
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/proxy/models/superb/wav2vec2-base-superb-er"
        );
    }

    #[test]
    fn loading_model_is_retryable() {
        let err = HfError::Status {
            status: 503,
            body: "loading".to_owned(),
        };
        assert!(err.is_retryable());
        let err = HfError::Status {
            status: 401,
            body: "unauthorized".to_owned(),
        };
        assert!(!err.is_retryable());
    }
}
