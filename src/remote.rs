//! [`LogStore`] over the ledger's REST API.

use crate::models::{LogEntry, LogId, LogWrite, Ritual};
use crate::store::{LogStore, StoreError};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

#[derive(Clone)]
pub struct RemoteStore {
    base_url: String,
    client: Client,
}

impl RemoteStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(10))
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ritual_ledger/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn json<T: DeserializeOwned>(response: Response, target: Option<LogId>) -> Result<T, StoreError> {
        let response = check(response, target).await?;
        response
            .json()
            .await
            .map_err(|err| StoreError::Transport(format!("invalid response body: {err}")))
    }
}

/// Maps non-2xx answers; a 404 on `target` means that log is gone.
async fn check(response: Response, target: Option<LogId>) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(match (status, target) {
        (StatusCode::NOT_FOUND, Some(id)) => StoreError::NotFound { kind: "log", id },
        (status, _) if status.is_client_error() => StoreError::Rejected(format!("HTTP {status}: {body}")),
        (status, _) => StoreError::Transport(format!("HTTP {status}: {body}")),
    })
}

fn transport(err: reqwest::Error) -> StoreError {
    StoreError::Transport(err.to_string())
}

#[async_trait]
impl LogStore for RemoteStore {
    async fn list_rituals(&self) -> Result<Vec<Ritual>, StoreError> {
        let response = self
            .client
            .get(self.url("/api/rituals"))
            .send()
            .await
            .map_err(transport)?;
        Self::json(response, None).await
    }

    async fn list_logs(&self) -> Result<Vec<LogEntry>, StoreError> {
        let response = self
            .client
            .get(self.url("/api/logs"))
            .send()
            .await
            .map_err(transport)?;
        Self::json(response, None).await
    }

    async fn create_log(&self, write: LogWrite) -> Result<LogEntry, StoreError> {
        debug!(ritual_id = ?write.ritual_id, timestamp = %write.timestamp, "POST log");
        let response = self
            .client
            .post(self.url("/api/logs"))
            .json(&write)
            .send()
            .await
            .map_err(transport)?;
        Self::json(response, None).await
    }

    async fn update_log(&self, id: LogId, write: LogWrite) -> Result<LogEntry, StoreError> {
        debug!(log_id = id, "PUT log");
        let response = self
            .client
            .put(self.url(&format!("/api/logs/{id}")))
            .json(&write)
            .send()
            .await
            .map_err(transport)?;
        Self::json(response, Some(id)).await
    }

    async fn delete_log(&self, id: LogId) -> Result<(), StoreError> {
        debug!(log_id = id, "DELETE log");
        let response = self
            .client
            .delete(self.url(&format!("/api/logs/{id}")))
            .send()
            .await
            .map_err(transport)?;
        check(response, Some(id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_trimmed() {
        let store = RemoteStore::new("http://127.0.0.1:8080/");
        assert_eq!(store.url("/api/logs"), "http://127.0.0.1:8080/api/logs");
    }

    #[tokio::test]
    async fn unreachable_store_is_a_transport_error() {
        let store = RemoteStore::with_timeout("http://127.0.0.1:9", Duration::from_millis(500));
        assert!(matches!(store.list_logs().await, Err(StoreError::Transport(_))));
    }
}
