//! The log/ritual store the grid reads from and reconciles into.

use crate::dates::DayNormalizer;
use crate::models::{
    LedgerData, LogEntry, LogId, LogWrite, MetricType, Quota, QuotaId, QuotaInput, Ritual,
    RitualId, RitualInput,
};
use crate::storage::persist_data;
use async_trait::async_trait;
use std::{collections::BTreeSet, path::PathBuf, sync::Arc};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },
    #[error("rejected: {0}")]
    Rejected(String),
    #[error("store unreachable: {0}")]
    Transport(String),
    #[error("failed to persist ledger: {0}")]
    Persist(String),
}

impl StoreError {
    fn rejected(message: impl Into<String>) -> Self {
        StoreError::Rejected(message.into())
    }
}

/// Operations the week grid needs from a store. Each call is awaited to
/// completion by the caller before the next one is issued.
#[async_trait]
pub trait LogStore: Send + Sync {
    async fn list_rituals(&self) -> Result<Vec<Ritual>, StoreError>;

    /// Every log, unfiltered; windowing happens client-side.
    async fn list_logs(&self) -> Result<Vec<LogEntry>, StoreError>;

    async fn create_log(&self, write: LogWrite) -> Result<LogEntry, StoreError>;

    /// Full overwrite of value, timestamp, tag and association.
    async fn update_log(&self, id: LogId, write: LogWrite) -> Result<LogEntry, StoreError>;

    async fn delete_log(&self, id: LogId) -> Result<(), StoreError>;
}

/// In-process store backed by a JSON file. Without a path it only lives in memory.
#[derive(Clone)]
pub struct LocalStore {
    path: Option<PathBuf>,
    normalizer: DayNormalizer,
    data: Arc<Mutex<LedgerData>>,
}

impl LocalStore {
    pub fn new(path: PathBuf, normalizer: DayNormalizer, data: LedgerData) -> Self {
        Self {
            path: Some(path),
            normalizer,
            data: Arc::new(Mutex::new(data)),
        }
    }

    pub fn in_memory(normalizer: DayNormalizer) -> Self {
        Self::in_memory_with(normalizer, LedgerData::default())
    }

    pub fn in_memory_with(normalizer: DayNormalizer, data: LedgerData) -> Self {
        Self {
            path: None,
            normalizer,
            data: Arc::new(Mutex::new(data)),
        }
    }

    /// Applies `change` to a copy, persists the copy, and only then publishes it.
    async fn mutate<T>(
        &self,
        change: impl FnOnce(&mut LedgerData) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        let output = change(&mut next)?;
        if let Some(path) = &self.path {
            persist_data(path, &next).await?;
        }
        *data = next;
        Ok(output)
    }

    pub async fn rituals(&self) -> Vec<Ritual> {
        let mut rituals = self.data.lock().await.rituals.clone();
        rituals.sort_by_key(|ritual| (ritual.sort_order, ritual.id));
        rituals
    }

    pub async fn create_ritual(&self, input: RitualInput) -> Result<Ritual, StoreError> {
        validate_ritual(&input)?;
        self.mutate(|data| {
            let ritual = input.into_ritual(data.allocate_id());
            data.rituals.push(ritual.clone());
            Ok(ritual)
        })
        .await
    }

    pub async fn update_ritual(&self, id: RitualId, input: RitualInput) -> Result<Ritual, StoreError> {
        validate_ritual(&input)?;
        self.mutate(|data| {
            let slot = data
                .rituals
                .iter_mut()
                .find(|ritual| ritual.id == id)
                .ok_or(StoreError::NotFound { kind: "ritual", id })?;
            *slot = input.into_ritual(id);
            Ok(slot.clone())
        })
        .await
    }

    /// Removes the ritual together with its logs.
    pub async fn delete_ritual(&self, id: RitualId) -> Result<(), StoreError> {
        self.mutate(|data| {
            let before = data.rituals.len();
            data.rituals.retain(|ritual| ritual.id != id);
            if data.rituals.len() == before {
                return Err(StoreError::NotFound { kind: "ritual", id });
            }
            data.logs.retain(|log| log.ritual_id != Some(id));
            Ok(())
        })
        .await
    }

    /// Sets `sort_order` from position; unknown ids are ignored.
    pub async fn reorder_rituals(&self, ids: &[RitualId]) -> Result<(), StoreError> {
        self.mutate(|data| {
            for (index, id) in ids.iter().enumerate() {
                if let Some(ritual) = data.rituals.iter_mut().find(|ritual| ritual.id == *id) {
                    ritual.sort_order = sort_position(index);
                }
            }
            Ok(())
        })
        .await
    }

    pub async fn quotas(&self) -> Vec<Quota> {
        let mut quotas = self.data.lock().await.quotas.clone();
        quotas.sort_by_key(|quota| (quota.sort_order, quota.id));
        quotas
    }

    pub async fn create_quota(&self, input: QuotaInput) -> Result<Quota, StoreError> {
        validate_name(&input.name)?;
        self.mutate(|data| {
            let quota = input.into_quota(data.allocate_id());
            data.quotas.push(quota.clone());
            Ok(quota)
        })
        .await
    }

    pub async fn update_quota(&self, id: QuotaId, input: QuotaInput) -> Result<Quota, StoreError> {
        validate_name(&input.name)?;
        self.mutate(|data| {
            let slot = data
                .quotas
                .iter_mut()
                .find(|quota| quota.id == id)
                .ok_or(StoreError::NotFound { kind: "quota", id })?;
            *slot = input.into_quota(id);
            Ok(slot.clone())
        })
        .await
    }

    pub async fn delete_quota(&self, id: QuotaId) -> Result<(), StoreError> {
        self.mutate(|data| {
            let before = data.quotas.len();
            data.quotas.retain(|quota| quota.id != id);
            if data.quotas.len() == before {
                return Err(StoreError::NotFound { kind: "quota", id });
            }
            data.logs.retain(|log| log.quota_id != Some(id));
            Ok(())
        })
        .await
    }

    pub async fn reorder_quotas(&self, ids: &[QuotaId]) -> Result<(), StoreError> {
        self.mutate(|data| {
            for (index, id) in ids.iter().enumerate() {
                if let Some(quota) = data.quotas.iter_mut().find(|quota| quota.id == *id) {
                    quota.sort_order = sort_position(index);
                }
            }
            Ok(())
        })
        .await
    }

    /// Newest day first, then newest id.
    pub async fn logs(&self) -> Vec<LogEntry> {
        let mut logs = self.data.lock().await.logs.clone();
        logs.sort_by(|a, b| {
            let day_a = self.normalizer.canonicalize(a.timestamp.as_str()).ok();
            let day_b = self.normalizer.canonicalize(b.timestamp.as_str()).ok();
            day_b.cmp(&day_a).then(b.id.cmp(&a.id))
        });
        logs
    }

    /// Unique whitespace-separated tag words, sorted.
    pub async fn tags(&self) -> Vec<String> {
        let data = self.data.lock().await;
        data.logs
            .iter()
            .filter_map(|log| log.tag.as_deref())
            .flat_map(str::split_whitespace)
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn validate_write(&self, data: &LedgerData, write: &LogWrite) -> Result<(), StoreError> {
        match (write.ritual_id, write.quota_id) {
            (Some(ritual_id), None) => {
                if write.metric_type != MetricType::Ritual {
                    return Err(StoreError::rejected("ritual logs must use metric_type \"ritual\""));
                }
                if !data.rituals.iter().any(|ritual| ritual.id == ritual_id) {
                    return Err(StoreError::rejected(format!("unknown ritual {ritual_id}")));
                }
                // A zero or negative entry cannot be shown in the week grid
                // without the next save deleting or skipping it.
                if write.value.is_nan() || write.value <= 0.0 {
                    return Err(StoreError::rejected("ritual log value must be greater than zero"));
                }
            }
            (None, Some(quota_id)) => {
                if write.metric_type != MetricType::Quota {
                    return Err(StoreError::rejected("quota logs must use metric_type \"quota\""));
                }
                if !data.quotas.iter().any(|quota| quota.id == quota_id) {
                    return Err(StoreError::rejected(format!("unknown quota {quota_id}")));
                }
            }
            _ => {
                return Err(StoreError::rejected(
                    "log must reference exactly one of ritual_id or quota_id",
                ));
            }
        }
        if !write.value.is_finite() {
            return Err(StoreError::rejected("value must be a finite number"));
        }
        self.normalizer
            .canonicalize(write.timestamp.as_str())
            .map_err(|err| StoreError::rejected(err.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl LogStore for LocalStore {
    async fn list_rituals(&self) -> Result<Vec<Ritual>, StoreError> {
        Ok(self.rituals().await)
    }

    async fn list_logs(&self) -> Result<Vec<LogEntry>, StoreError> {
        Ok(self.logs().await)
    }

    async fn create_log(&self, write: LogWrite) -> Result<LogEntry, StoreError> {
        let entry = self
            .mutate(|data| {
                self.validate_write(data, &write)?;
                let entry = write.into_entry(data.allocate_id());
                data.logs.push(entry.clone());
                Ok(entry)
            })
            .await?;
        debug!(log_id = entry.id, "created log");
        Ok(entry)
    }

    async fn update_log(&self, id: LogId, write: LogWrite) -> Result<LogEntry, StoreError> {
        let entry = self
            .mutate(|data| {
                self.validate_write(data, &write)?;
                let slot = data
                    .logs
                    .iter_mut()
                    .find(|log| log.id == id)
                    .ok_or(StoreError::NotFound { kind: "log", id })?;
                *slot = write.into_entry(id);
                Ok(slot.clone())
            })
            .await?;
        debug!(log_id = id, "updated log");
        Ok(entry)
    }

    async fn delete_log(&self, id: LogId) -> Result<(), StoreError> {
        self.mutate(|data| {
            let before = data.logs.len();
            data.logs.retain(|log| log.id != id);
            if data.logs.len() == before {
                return Err(StoreError::NotFound { kind: "log", id });
            }
            Ok(())
        })
        .await?;
        debug!(log_id = id, "deleted log");
        Ok(())
    }
}

/// Positions past `i32::MAX` all sort last.
fn sort_position(index: usize) -> i32 {
    i32::try_from(index).unwrap_or(i32::MAX)
}

fn validate_name(name: &str) -> Result<(), StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::rejected("name must not be empty"));
    }
    Ok(())
}

fn validate_ritual(input: &RitualInput) -> Result<(), StoreError> {
    validate_name(&input.name)?;
    if !input.target_value.is_finite() || input.target_value < 0.0 {
        return Err(StoreError::rejected("target_value must be a non-negative number"));
    }
    Ok(())
}
