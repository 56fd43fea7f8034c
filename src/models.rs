use crate::dates::CanonicalDay;
use crate::grid::WeekGrid;
use crate::reconcile::ReconcileSummary;
use serde::{Deserialize, Serialize};

pub type RitualId = i64;
pub type QuotaId = i64;
pub type LogId = i64;

/// Tag stamped on every entry written from the weekly grid.
pub const BULK_ENTRY_TAG: &str = "Bulk Entry";
pub const QUICK_TOGGLE_TAG: &str = "Quick Toggle";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    #[default]
    Ritual,
    Quota,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Weekly,
    Annual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ritual {
    pub id: RitualId,
    pub name: String,
    pub target_value: f64,
    pub unit: String,
    #[serde(default)]
    pub period: Period,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub default_tag: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RitualInput {
    pub name: String,
    pub target_value: f64,
    pub unit: String,
    #[serde(default)]
    pub period: Period,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub default_tag: Option<String>,
}

impl RitualInput {
    pub fn into_ritual(self, id: RitualId) -> Ritual {
        Ritual {
            id,
            name: self.name,
            target_value: self.target_value,
            unit: self.unit,
            period: self.period,
            sort_order: self.sort_order,
            icon: self.icon,
            default_tag: self.default_tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quota {
    pub id: QuotaId,
    pub name: String,
    pub unit: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuotaInput {
    pub name: String,
    pub unit: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

impl QuotaInput {
    pub fn into_quota(self, id: QuotaId) -> Quota {
        Quota {
            id,
            name: self.name,
            unit: self.unit,
            category: self.category,
            icon: self.icon,
            label: self.label,
            sort_order: self.sort_order,
        }
    }
}

/// A persisted log entry. The timestamp is kept as the store sent it and
/// only interpreted through the day normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: LogId,
    #[serde(default)]
    pub ritual_id: Option<RitualId>,
    #[serde(default)]
    pub quota_id: Option<QuotaId>,
    pub timestamp: String,
    pub value: f64,
    #[serde(default)]
    pub tag: Option<String>,
    pub metric_type: MetricType,
}

/// Body of a create or full-overwrite update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogWrite {
    #[serde(default)]
    pub ritual_id: Option<RitualId>,
    #[serde(default)]
    pub quota_id: Option<QuotaId>,
    pub timestamp: String,
    pub value: f64,
    #[serde(default)]
    pub tag: Option<String>,
    pub metric_type: MetricType,
}

impl LogWrite {
    pub fn ritual(ritual_id: RitualId, value: f64, day: CanonicalDay, tag: Option<String>) -> Self {
        Self {
            ritual_id: Some(ritual_id),
            quota_id: None,
            timestamp: day.to_storage_timestamp(),
            value,
            tag,
            metric_type: MetricType::Ritual,
        }
    }

    pub fn quota(quota_id: QuotaId, value: f64, day: CanonicalDay, tag: Option<String>) -> Self {
        Self {
            ritual_id: None,
            quota_id: Some(quota_id),
            timestamp: day.to_storage_timestamp(),
            value,
            tag,
            metric_type: MetricType::Quota,
        }
    }

    pub fn into_entry(self, id: LogId) -> LogEntry {
        LogEntry {
            id,
            ritual_id: self.ritual_id,
            quota_id: self.quota_id,
            timestamp: self.timestamp,
            value: self.value,
            tag: self.tag,
            metric_type: self.metric_type,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LedgerData {
    #[serde(default)]
    pub rituals: Vec<Ritual>,
    #[serde(default)]
    pub quotas: Vec<Quota>,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
    #[serde(default)]
    pub next_id: i64,
}

impl LedgerData {
    pub fn allocate_id(&mut self) -> i64 {
        self.next_id = self.next_id.saturating_add(1);
        self.next_id
    }
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub ids: Vec<i64>,
}

/// Single-entry logging against either a ritual or a quota.
#[derive(Debug, Deserialize)]
pub struct EntryRequest {
    #[serde(default)]
    pub ritual_id: Option<RitualId>,
    #[serde(default)]
    pub quota_id: Option<QuotaId>,
    pub value: f64,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayColumn {
    pub date: CanonicalDay,
    pub header: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekView {
    pub week_start: CanonicalDay,
    pub week_end: CanonicalDay,
    pub week_label: String,
    /// `None` at the edges of the supported calendar.
    pub previous_week: Option<CanonicalDay>,
    pub next_week: Option<CanonicalDay>,
    pub days: Vec<DayColumn>,
    pub rituals: Vec<Ritual>,
    pub grid: WeekGrid,
    pub orphaned_log_ids: Vec<LogId>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SaveRequest {
    pub grid: WeekGrid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveResponse {
    pub summary: ReconcileSummary,
    pub week: WeekView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Deleted {
    pub ok: bool,
}
