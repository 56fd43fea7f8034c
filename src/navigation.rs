use crate::dates::{CanonicalDay, DateError};
use crate::grid::DAYS_PER_WEEK;

pub fn next(week_start: CanonicalDay) -> Result<CanonicalDay, DateError> {
    week_start.add_days(DAYS_PER_WEEK)
}

pub fn previous(week_start: CanonicalDay) -> Result<CanonicalDay, DateError> {
    week_start.add_days(-DAYS_PER_WEEK)
}

/// The active week, always held as its Monday. Every day through `end` is a
/// valid [`CanonicalDay`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekCursor {
    start: CanonicalDay,
    end: CanonicalDay,
}

impl WeekCursor {
    /// Snaps any day to the week containing it.
    pub fn containing(day: CanonicalDay) -> Result<Self, DateError> {
        let start = day.week_start();
        let end = start.add_days(DAYS_PER_WEEK - 1)?;
        Ok(Self { start, end })
    }

    pub fn start(&self) -> CanonicalDay {
        self.start
    }

    pub fn end(&self) -> CanonicalDay {
        self.end
    }

    pub fn days(&self) -> Vec<CanonicalDay> {
        (0..DAYS_PER_WEEK)
            .filter_map(|offset| self.start.add_days(offset).ok())
            .collect()
    }

    /// Start of the following week, if that whole week is representable.
    pub fn peek_next(&self) -> Option<CanonicalDay> {
        Self::containing(next(self.start).ok()?).ok().map(|cursor| cursor.start)
    }

    pub fn peek_previous(&self) -> Option<CanonicalDay> {
        previous(self.start).ok()
    }

    /// Moves forward a week; the cursor is unchanged on error.
    pub fn advance(&mut self) -> Result<(), DateError> {
        *self = Self::containing(next(self.start)?)?;
        Ok(())
    }

    pub fn retreat(&mut self) -> Result<(), DateError> {
        *self = Self::containing(previous(self.start)?)?;
        Ok(())
    }
}
