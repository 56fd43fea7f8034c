//! Turns an edited [`WeekGrid`] into store writes.
//!
//! Planning is pure and walks the grid ritual-major, day-minor. Applying runs
//! the planned writes as a queue with one call in flight; the first failure
//! stops the pass and nothing already written is undone.

use crate::cell::{CellValue, parse_cell};
use crate::dates::CanonicalDay;
use crate::grid::WeekGrid;
use crate::models::{BULK_ENTRY_TAG, LogId, LogWrite, RitualId};
use crate::store::{LogStore, StoreError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Debug, Clone, PartialEq)]
pub enum LogOperation {
    Create {
        ritual_id: RitualId,
        day: CanonicalDay,
        write: LogWrite,
    },
    Update {
        id: LogId,
        ritual_id: RitualId,
        day: CanonicalDay,
        write: LogWrite,
    },
    Delete {
        id: LogId,
        ritual_id: RitualId,
        day: CanonicalDay,
    },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReconcilePlan {
    pub operations: Vec<LogOperation>,
    /// Cells that parsed but need no write: negatives, and zeros with nothing to delete.
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReconcileSummary {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub skipped: usize,
}

impl ReconcileSummary {
    pub fn applied(&self) -> usize {
        self.created + self.updated + self.deleted
    }
}

#[derive(Debug, Error)]
#[error("reconciliation stopped after {applied} write(s)")]
pub struct ReconcileError {
    pub applied: usize,
    #[source]
    pub source: StoreError,
}

pub fn plan(grid: &WeekGrid) -> ReconcilePlan {
    let mut plan = ReconcilePlan::default();

    for (ritual_id, day, cell) in grid.cells() {
        let bound = cell.bound_log_id;
        match (parse_cell(&cell.display_value), bound) {
            (CellValue::Unset | CellValue::Invalid, _) => {}
            (CellValue::Negative(_), _) | (CellValue::Zero, None) => plan.skipped += 1,
            (CellValue::Zero, Some(id)) => {
                plan.operations.push(LogOperation::Delete { id, ritual_id, day });
            }
            (CellValue::Positive(value), Some(id)) => plan.operations.push(LogOperation::Update {
                id,
                ritual_id,
                day,
                write: bulk_write(ritual_id, value, day),
            }),
            (CellValue::Positive(value), None) => plan.operations.push(LogOperation::Create {
                ritual_id,
                day,
                write: bulk_write(ritual_id, value, day),
            }),
        }
    }

    plan
}

pub async fn apply(store: &dyn LogStore, plan: ReconcilePlan) -> Result<ReconcileSummary, ReconcileError> {
    let mut summary = ReconcileSummary {
        skipped: plan.skipped,
        ..ReconcileSummary::default()
    };

    for operation in plan.operations {
        let result = match operation {
            LogOperation::Create { ritual_id, day, write } => {
                debug!(ritual_id, day = %day, "creating log");
                store.create_log(write).await.map(|_| summary.created += 1)
            }
            LogOperation::Update {
                id,
                ritual_id,
                day,
                write,
            } => {
                debug!(log_id = id, ritual_id, day = %day, "updating log");
                store.update_log(id, write).await.map(|_| summary.updated += 1)
            }
            LogOperation::Delete { id, ritual_id, day } => {
                debug!(log_id = id, ritual_id, day = %day, "deleting log");
                store.delete_log(id).await.map(|_| summary.deleted += 1)
            }
        };

        if let Err(source) = result {
            let applied = summary.applied();
            error!(applied, "week save aborted: {source}");
            return Err(ReconcileError { applied, source });
        }
    }

    info!(
        created = summary.created,
        updated = summary.updated,
        deleted = summary.deleted,
        skipped = summary.skipped,
        "week saved"
    );
    Ok(summary)
}

pub async fn reconcile(store: &dyn LogStore, grid: &WeekGrid) -> Result<ReconcileSummary, ReconcileError> {
    apply(store, plan(grid)).await
}

fn bulk_write(ritual_id: RitualId, value: f64, day: CanonicalDay) -> LogWrite {
    LogWrite::ritual(ritual_id, value, day, Some(BULK_ENTRY_TAG.to_string()))
}
