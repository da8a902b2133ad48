use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::Result;

/// Backend failures split into the two classes the pipeline cares about:
/// transient ones are retried by the worker, fatal ones abort the batch.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("transient backend error: {0}")]
    Transient(String),

    #[error("fatal backend error: {0}")]
    Fatal(String),
}

/// The black-box translation call the pipeline orchestrates around.
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    async fn translate(
        &self,
        text: &str,
        target_lang: &str,
        source_lang: &str,
    ) -> std::result::Result<String, BackendError>;
}

pub struct HttpTranslationBackend {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

impl HttpTranslationBackend {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }
}

#[async_trait]
impl TranslationBackend for HttpTranslationBackend {
    async fn translate(
        &self,
        text: &str,
        target_lang: &str,
        source_lang: &str,
    ) -> std::result::Result<String, BackendError> {
        let request = TranslateRequest {
            q: text,
            source: source_lang,
            target: target_lang,
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Transient(format!(
                "backend returned {status}: {body}"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Fatal(format!(
                "backend returned {status}: {body}"
            )));
        }

        let body: TranslateResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Fatal(format!("malformed backend response: {e}")))?;

        Ok(body.translated_text)
    }
}

fn classify_transport_error(e: reqwest::Error) -> BackendError {
    if e.is_timeout() || e.is_connect() {
        BackendError::Transient(e.to_string())
    } else {
        BackendError::Fatal(e.to_string())
    }
}
