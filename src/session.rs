//! Owner of one week's editable grid between loads and saves.

use crate::dates::{CanonicalDay, DateError, DayNormalizer};
use crate::grid::{WeekGrid, build_week};
use crate::models::{DayColumn, Ritual, RitualId, WeekView};
use crate::navigation::WeekCursor;
use crate::reconcile::{ReconcileError, ReconcileSummary, reconcile};
use crate::store::{LogStore, StoreError};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Date(#[from] DateError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct WeekSession {
    normalizer: DayNormalizer,
    cursor: WeekCursor,
    rituals: Vec<Ritual>,
    grid: WeekGrid,
}

impl WeekSession {
    /// Loads the week containing `day`.
    pub async fn open(
        store: &dyn LogStore,
        normalizer: DayNormalizer,
        day: CanonicalDay,
    ) -> Result<Self, SessionError> {
        let mut session = Self {
            normalizer,
            cursor: WeekCursor::containing(day)?,
            rituals: Vec::new(),
            grid: WeekGrid::default(),
        };
        session.reload(store).await?;
        Ok(session)
    }

    pub async fn reload(&mut self, store: &dyn LogStore) -> Result<(), StoreError> {
        let rituals = store.list_rituals().await?;
        let logs = store.list_logs().await?;
        self.grid = build_week(&self.normalizer, &rituals, &logs, self.cursor.start());
        self.rituals = rituals;
        Ok(())
    }

    pub fn week_start(&self) -> CanonicalDay {
        self.cursor.start()
    }

    pub fn rituals(&self) -> &[Ritual] {
        &self.rituals
    }

    pub fn grid(&self) -> &WeekGrid {
        &self.grid
    }

    pub fn set_cell(&mut self, ritual_id: RitualId, day: CanonicalDay, raw: impl Into<String>) {
        self.grid.set_cell(ritual_id, day, raw);
    }

    /// Replaces the whole grid with an edited copy, e.g. one posted by a client.
    pub fn replace_grid(&mut self, grid: WeekGrid) {
        self.grid = grid;
    }

    pub async fn next_week(&mut self, store: &dyn LogStore) -> Result<(), SessionError> {
        self.cursor.advance()?;
        Ok(self.reload(store).await?)
    }

    pub async fn previous_week(&mut self, store: &dyn LogStore) -> Result<(), SessionError> {
        self.cursor.retreat()?;
        Ok(self.reload(store).await?)
    }

    /// Reconciles the current grid and reloads it, whether or not the pass
    /// finished, so the grid reflects what the store actually holds.
    pub async fn save(&mut self, store: &dyn LogStore) -> Result<ReconcileSummary, ReconcileError> {
        let outcome = reconcile(store, &self.grid).await;
        let reloaded = self.reload(store).await;

        match (outcome, reloaded) {
            (Err(err), reloaded) => {
                if let Err(reload_err) = reloaded {
                    warn!("reload after failed save also failed: {reload_err}");
                }
                Err(err)
            }
            (Ok(summary), Ok(())) => Ok(summary),
            (Ok(summary), Err(source)) => Err(ReconcileError {
                applied: summary.applied(),
                source,
            }),
        }
    }

    pub fn view(&self) -> WeekView {
        let start = self.cursor.start();
        WeekView {
            week_start: start,
            week_end: self.cursor.end(),
            week_label: start.week_label(),
            previous_week: self.cursor.peek_previous(),
            next_week: self.cursor.peek_next(),
            days: self
                .cursor
                .days()
                .into_iter()
                .map(|date| DayColumn {
                    date,
                    header: date.day_header(),
                })
                .collect(),
            rituals: self.rituals.clone(),
            grid: self.grid.clone(),
            orphaned_log_ids: self.grid.orphaned_log_ids().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Cell;
    use crate::models::{BULK_ENTRY_TAG, LogWrite};
    use crate::testing::{Call, RecordingStore};

    fn day(d: u32) -> CanonicalDay {
        CanonicalDay::from_ymd(2024, 3, d).unwrap()
    }

    #[tokio::test]
    async fn edit_save_and_reload() {
        let store = RecordingStore::with_rituals(&[1]).await;
        let mut session = WeekSession::open(&store, DayNormalizer::default(), day(6))
            .await
            .unwrap();
        assert_eq!(session.week_start(), day(4));

        session.set_cell(1, day(4), "5");
        let summary = session.save(&store).await.unwrap();
        assert_eq!(summary.created, 1);

        let cell = session.grid().cell(1, day(4)).unwrap();
        assert_eq!(cell.display_value, "5");
        assert!(cell.bound_log_id.is_some());

        // Saving again without edits rewrites the same value in place.
        let summary = session.save(&store).await.unwrap();
        assert_eq!((summary.created, summary.updated), (0, 1));
        assert_eq!(store.inner().list_logs().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn navigation_reloads_the_new_week() {
        let store = RecordingStore::with_rituals(&[1]).await;
        store
            .seed(LogWrite::ritual(1, 2.0, day(12), Some(BULK_ENTRY_TAG.into())))
            .await;
        let mut session = WeekSession::open(&store, DayNormalizer::default(), day(4))
            .await
            .unwrap();
        assert!(session.grid().row(1).unwrap().is_empty());

        session.next_week(&store).await.unwrap();
        assert_eq!(session.week_start(), day(11));
        assert_eq!(session.grid().cell(1, day(12)).unwrap().display_value, "2");

        session.previous_week(&store).await.unwrap();
        assert_eq!(session.week_start(), day(4));
        assert!(store.calls().await.is_empty());
    }

    #[tokio::test]
    async fn failed_save_still_reloads() {
        let store = RecordingStore::with_rituals(&[1]).await;
        store.fail_on_call(2).await;
        let mut session = WeekSession::open(&store, DayNormalizer::default(), day(4))
            .await
            .unwrap();
        session.set_cell(1, day(4), "1");
        session.set_cell(1, day(5), "1");

        let err = session.save(&store).await.unwrap_err();
        assert_eq!(err.applied, 1);
        assert_eq!(store.calls().await.len(), 2);
        assert!(matches!(store.calls().await[0], Call::Create(_)));

        assert!(session.grid().cell(1, day(4)).unwrap().bound_log_id.is_some());
        assert!(session.grid().cell(1, day(5)).is_none());
    }

    #[tokio::test]
    async fn view_lists_the_week() {
        let store = RecordingStore::with_rituals(&[1]).await;
        let mut session = WeekSession::open(&store, DayNormalizer::default(), day(4))
            .await
            .unwrap();
        session.replace_grid({
            let mut grid = WeekGrid::default();
            grid.insert_cell(1, day(4), Cell::unbound("3"));
            grid
        });

        let view = session.view();
        assert_eq!(view.week_label, "2024-W10");
        assert_eq!(view.week_end, day(10));
        assert_eq!(view.previous_week.unwrap().day_key(), "2024-02-26");
        assert_eq!(view.next_week, Some(day(11)));
        assert_eq!(view.days.len(), 7);
        assert_eq!(view.days[0].header, "Mon 4");
        assert_eq!(view.rituals.len(), 1);
        assert_eq!(view.grid.total(1), 3.0);
    }

    #[tokio::test]
    async fn the_last_representable_week_has_no_next() {
        let store = RecordingStore::with_rituals(&[1]).await;
        let last = CanonicalDay::from_ymd(9999, 12, 31).unwrap();
        let result = WeekSession::open(&store, DayNormalizer::default(), last).await;
        assert!(matches!(result, Err(SessionError::Date(DateError::OutOfRange(_)))));

        let mut session = WeekSession::open(
            &store,
            DayNormalizer::default(),
            CanonicalDay::from_ymd(9999, 12, 22).unwrap(),
        )
        .await
        .unwrap();
        assert_eq!(session.view().next_week, None);
        assert!(session.next_week(&store).await.is_err());
        assert_eq!(session.week_start().day_key(), "9999-12-20");
    }
}
