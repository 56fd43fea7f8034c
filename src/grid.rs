//! Editable weekly grid: one cell per ritual and day.

use crate::cell::{format_amount, parse_cell};
use crate::dates::{CanonicalDay, DayNormalizer};
use crate::models::{LogEntry, LogId, Ritual, RitualId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub const DAYS_PER_WEEK: i64 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Cell {
    /// Raw user input, validated only when reconciled.
    pub display_value: String,
    /// Entry this cell writes through to, if one was loaded.
    #[serde(default)]
    pub bound_log_id: Option<LogId>,
}

impl Cell {
    pub fn bound(display_value: impl Into<String>, log_id: LogId) -> Self {
        Self {
            display_value: display_value.into(),
            bound_log_id: Some(log_id),
        }
    }

    pub fn unbound(display_value: impl Into<String>) -> Self {
        Self {
            display_value: display_value.into(),
            bound_log_id: None,
        }
    }
}

/// Ritual-major, day-minor. `BTreeMap` keeps iteration deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct WeekGrid {
    rows: BTreeMap<RitualId, BTreeMap<CanonicalDay, Cell>>,
    #[serde(skip)]
    orphaned: Vec<LogId>,
}

impl WeekGrid {
    pub fn ensure_ritual(&mut self, ritual_id: RitualId) {
        self.rows.entry(ritual_id).or_default();
    }

    pub fn ritual_ids(&self) -> impl Iterator<Item = RitualId> + '_ {
        self.rows.keys().copied()
    }

    pub fn row(&self, ritual_id: RitualId) -> Option<&BTreeMap<CanonicalDay, Cell>> {
        self.rows.get(&ritual_id)
    }

    pub fn cell(&self, ritual_id: RitualId, day: CanonicalDay) -> Option<&Cell> {
        self.rows.get(&ritual_id).and_then(|row| row.get(&day))
    }

    /// Replaces the displayed value, keeping whatever entry the cell is bound to.
    pub fn set_cell(&mut self, ritual_id: RitualId, day: CanonicalDay, raw: impl Into<String>) {
        let cell = self.rows.entry(ritual_id).or_default().entry(day).or_default();
        cell.display_value = raw.into();
    }

    pub fn insert_cell(&mut self, ritual_id: RitualId, day: CanonicalDay, cell: Cell) {
        self.rows.entry(ritual_id).or_default().insert(day, cell);
    }

    pub fn cells(&self) -> impl Iterator<Item = (RitualId, CanonicalDay, &Cell)> + '_ {
        self.rows
            .iter()
            .flat_map(|(ritual_id, row)| row.iter().map(move |(day, cell)| (*ritual_id, *day, cell)))
    }

    /// Sum of the valid amounts shown in one ritual's row.
    pub fn total(&self, ritual_id: RitualId) -> f64 {
        self.rows
            .get(&ritual_id)
            .map(|row| {
                row.values()
                    .filter_map(|cell| parse_cell(&cell.display_value).amount())
                    .sum()
            })
            .unwrap_or(0.0)
    }

    /// Same-day duplicates that were folded into another entry's cell and are
    /// no longer addressable from this grid.
    pub fn orphaned_log_ids(&self) -> &[LogId] {
        &self.orphaned
    }
}

/// Builds the grid for the week starting on Monday `week_start`.
pub fn build_week(
    normalizer: &DayNormalizer,
    rituals: &[Ritual],
    logs: &[LogEntry],
    week_start: CanonicalDay,
) -> WeekGrid {
    let mut grid = WeekGrid::default();
    let mut sums: BTreeMap<(RitualId, CanonicalDay), f64> = BTreeMap::new();
    for ritual in rituals {
        grid.ensure_ritual(ritual.id);
    }

    for entry in logs {
        let Some(ritual_id) = entry.ritual_id else {
            continue;
        };
        let day = match normalizer.canonicalize(entry.timestamp.as_str()) {
            Ok(day) => day,
            Err(err) => {
                warn!(log_id = entry.id, "skipping log with unreadable timestamp: {err}");
                continue;
            }
        };
        if day.week_start() != week_start {
            continue;
        }

        let row = grid.rows.entry(ritual_id).or_default();
        let sum = sums.entry((ritual_id, day)).or_insert(0.0);
        *sum += entry.value;
        match row.get_mut(&day) {
            None => {
                row.insert(day, Cell::bound(format_amount(*sum), entry.id));
            }
            Some(cell) => {
                cell.display_value = format_amount(*sum);
                warn!(
                    ritual_id,
                    day = %day,
                    kept = ?cell.bound_log_id,
                    orphaned = entry.id,
                    "merged same-day duplicate log into one cell"
                );
                grid.orphaned.push(entry.id);
            }
        }
    }

    debug!(week_start = %week_start, rituals = grid.rows.len(), "built week grid");
    grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MetricType;

    fn monday() -> CanonicalDay {
        CanonicalDay::from_ymd(2024, 3, 4).unwrap()
    }

    fn ritual(id: RitualId) -> Ritual {
        Ritual {
            id,
            name: format!("ritual {id}"),
            target_value: 10.0,
            unit: "minutes".into(),
            period: Default::default(),
            sort_order: 0,
            icon: None,
            default_tag: None,
        }
    }

    fn log(id: LogId, ritual_id: Option<RitualId>, timestamp: &str, value: f64) -> LogEntry {
        LogEntry {
            id,
            ritual_id,
            quota_id: if ritual_id.is_none() { Some(1) } else { None },
            timestamp: timestamp.into(),
            value,
            tag: None,
            metric_type: if ritual_id.is_none() {
                MetricType::Quota
            } else {
                MetricType::Ritual
            },
        }
    }

    #[test]
    fn every_ritual_gets_a_row() {
        let grid = build_week(&DayNormalizer::default(), &[ritual(1), ritual(2)], &[], monday());
        assert_eq!(grid.ritual_ids().collect::<Vec<_>>(), vec![1, 2]);
        assert!(grid.row(1).unwrap().is_empty());
    }

    #[test]
    fn logs_are_bucketed_by_day_inside_the_window() {
        let logs = vec![
            log(10, Some(1), "2024-03-04T12:00:00", 5.0),
            log(11, Some(1), "2024-03-10T12:00:00", 2.5),
            log(12, Some(1), "2024-03-03T12:00:00", 9.0),
            log(13, Some(1), "2024-03-11T12:00:00", 9.0),
            log(14, None, "2024-03-05T12:00:00", 1.0),
        ];
        let grid = build_week(&DayNormalizer::default(), &[ritual(1)], &logs, monday());

        assert_eq!(grid.cell(1, monday()), Some(&Cell::bound("5", 10)));
        assert_eq!(grid.cell(1, monday().add_days(6).unwrap()), Some(&Cell::bound("2.5", 11)));
        assert_eq!(grid.row(1).unwrap().len(), 2);
        assert_eq!(grid.total(1), 7.5);
    }

    #[test]
    fn same_day_duplicates_are_summed_and_keep_the_first_id() {
        let logs = vec![
            log(20, Some(1), "2024-03-05T12:00:00", 3.0),
            log(21, Some(1), "2024-03-05T08:00:00", 4.0),
        ];
        let grid = build_week(&DayNormalizer::default(), &[ritual(1)], &logs, monday());

        assert_eq!(grid.cell(1, monday().add_days(1).unwrap()), Some(&Cell::bound("7", 20)));
        assert_eq!(grid.orphaned_log_ids(), &[21]);
    }

    #[test]
    fn merged_sums_keep_negative_amounts() {
        let logs = vec![
            log(22, Some(1), "2024-03-05T12:00:00", -3.0),
            log(23, Some(1), "2024-03-05T12:00:00", 4.0),
            log(24, Some(1), "2024-03-05T12:00:00", 0.5),
        ];
        let grid = build_week(&DayNormalizer::default(), &[ritual(1)], &logs, monday());

        assert_eq!(grid.cell(1, monday().add_days(1).unwrap()), Some(&Cell::bound("1.5", 22)));
        assert_eq!(grid.orphaned_log_ids(), &[23, 24]);
    }

    #[test]
    fn utc_timestamps_are_bucketed_in_the_reference_timezone() {
        // Sunday 13:30Z is Monday morning in Melbourne.
        let logs = vec![log(30, Some(1), "2024-03-03T13:30:00Z", 1.0)];
        let grid = build_week(&DayNormalizer::default(), &[ritual(1)], &logs, monday());
        assert_eq!(grid.cell(1, monday()), Some(&Cell::bound("1", 30)));
    }

    #[test]
    fn unreadable_timestamps_are_skipped() {
        let logs = vec![log(40, Some(1), "last tuesday", 1.0)];
        let grid = build_week(&DayNormalizer::default(), &[ritual(1)], &logs, monday());
        assert!(grid.row(1).unwrap().is_empty());
    }

    #[test]
    fn logs_for_unknown_rituals_still_get_a_row() {
        let logs = vec![log(50, Some(9), "2024-03-06T12:00:00", 2.0)];
        let grid = build_week(&DayNormalizer::default(), &[ritual(1)], &logs, monday());
        assert_eq!(grid.cell(9, monday().add_days(2).unwrap()), Some(&Cell::bound("2", 50)));
    }

    #[test]
    fn set_cell_keeps_the_binding() {
        let mut grid = WeekGrid::default();
        grid.insert_cell(1, monday(), Cell::bound("10", 42));
        grid.set_cell(1, monday(), "0");
        grid.set_cell(1, monday().add_days(1).unwrap(), "4");

        assert_eq!(grid.cell(1, monday()), Some(&Cell::bound("0", 42)));
        assert_eq!(grid.cell(1, monday().add_days(1).unwrap()), Some(&Cell::unbound("4")));
    }

    #[test]
    fn grid_serializes_as_nested_maps() {
        let mut grid = WeekGrid::default();
        grid.insert_cell(1, monday(), Cell::bound("10", 42));
        let json = serde_json::to_value(&grid).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "1": { "2024-03-04": { "display_value": "10", "bound_log_id": 42 } } })
        );
        let back: WeekGrid = serde_json::from_value(json).unwrap();
        assert_eq!(back, grid);
    }
}
