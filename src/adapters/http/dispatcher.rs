//! HTTP evaluation dispatcher.
//!
//! POSTs `{"sessionId": ...}` to the external evaluation service. Transient
//! transport and 5xx failures are retried in-call with exponential backoff;
//! 4xx responses are surfaced immediately since retrying a rejected request
//! cannot succeed.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{DispatcherConfig, RetryConfig};
use crate::domain::ports::EvaluationDispatcher;

pub struct HttpEvaluationDispatcher {
    client: Client,
    base_url: String,
    retry: RetryConfig,
}

impl HttpEvaluationDispatcher {
    pub fn new(config: &DispatcherConfig, retry: RetryConfig) -> DomainResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DomainError::DispatchFailed(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry,
        })
    }

    fn evaluate_url(&self) -> String {
        format!("{}/evaluate", self.base_url)
    }
}

#[async_trait]
impl EvaluationDispatcher for HttpEvaluationDispatcher {
    async fn dispatch(&self, session_id: Uuid) -> DomainResult<()> {
        let url = self.evaluate_url();
        let body = json!({ "sessionId": session_id });

        let mut backoff_ms = self.retry.initial_backoff_ms;
        let mut last_error = String::new();

        for attempt in 0..=self.retry.max_retries {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms = (backoff_ms * 2).min(self.retry.max_backoff_ms);
            }

            match self.client.post(&url).json(&body).send().await {
                Ok(response) if response.status().is_success() => return Ok(()),
                Ok(response) if response.status().is_client_error() => {
                    return Err(DomainError::DispatchFailed(format!(
                        "evaluation endpoint rejected request: {}",
                        response.status()
                    )));
                }
                Ok(response) => {
                    last_error = format!("evaluation endpoint returned {}", response.status());
                }
                Err(e) => {
                    last_error = e.to_string();
                }
            }

            warn!(
                %session_id,
                attempt = attempt + 1,
                error = %last_error,
                "evaluation dispatch attempt failed"
            );
        }

        Err(DomainError::DispatchFailed(last_error))
    }
}
