//! Store double that records every write before forwarding it.

use crate::dates::DayNormalizer;
use crate::models::{LedgerData, LogEntry, LogId, LogWrite, Ritual, RitualId};
use crate::store::{LocalStore, LogStore, StoreError};
use async_trait::async_trait;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create(LogWrite),
    Update(LogId, LogWrite),
    Delete(LogId),
}

pub struct RecordingStore {
    inner: LocalStore,
    calls: Mutex<Vec<Call>>,
    fail_on: Mutex<Option<usize>>,
}

impl RecordingStore {
    pub async fn with_rituals(ids: &[RitualId]) -> Self {
        let data = LedgerData {
            rituals: ids
                .iter()
                .map(|id| Ritual {
                    id: *id,
                    name: format!("ritual {id}"),
                    target_value: 10.0,
                    unit: "count".into(),
                    period: Default::default(),
                    sort_order: 0,
                    icon: None,
                    default_tag: None,
                })
                .collect(),
            next_id: ids.iter().copied().max().unwrap_or(0),
            ..LedgerData::default()
        };
        Self {
            inner: LocalStore::in_memory_with(DayNormalizer::default(), data),
            calls: Mutex::new(Vec::new()),
            fail_on: Mutex::new(None),
        }
    }

    pub fn inner(&self) -> &LocalStore {
        &self.inner
    }

    /// Writes a log without recording the call.
    pub async fn seed(&self, write: LogWrite) -> LogEntry {
        self.inner.create_log(write).await.unwrap()
    }

    /// The `n`th recorded write (1-based) fails before reaching the store.
    pub async fn fail_on_call(&self, n: usize) {
        *self.fail_on.lock().await = Some(n);
    }

    pub async fn calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }

    async fn record(&self, call: Call) -> Result<(), StoreError> {
        let mut calls = self.calls.lock().await;
        calls.push(call);
        if *self.fail_on.lock().await == Some(calls.len()) {
            return Err(StoreError::Transport("injected failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl LogStore for RecordingStore {
    async fn list_rituals(&self) -> Result<Vec<Ritual>, StoreError> {
        self.inner.list_rituals().await
    }

    async fn list_logs(&self) -> Result<Vec<LogEntry>, StoreError> {
        self.inner.list_logs().await
    }

    async fn create_log(&self, write: LogWrite) -> Result<LogEntry, StoreError> {
        self.record(Call::Create(write.clone())).await?;
        self.inner.create_log(write).await
    }

    async fn update_log(&self, id: LogId, write: LogWrite) -> Result<LogEntry, StoreError> {
        self.record(Call::Update(id, write.clone())).await?;
        self.inner.update_log(id, write).await
    }

    async fn delete_log(&self, id: LogId) -> Result<(), StoreError> {
        self.record(Call::Delete(id)).await?;
        self.inner.delete_log(id).await
    }
}
