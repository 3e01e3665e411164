use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::JournalError;

/// Longest `<n>d` range accepted from text, about a century.
pub const MAX_WINDOW_DAYS: u32 = 36_500;

/// Date range a caller selects before aggregation runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DateWindow {
    #[default]
    All,
    Today,
    /// The last `days` calendar days up to and including today.
    LastDays { days: u32 },
    /// Inclusive on both ends.
    Between { start: NaiveDate, end: NaiveDate },
}

impl DateWindow {
    /// Inclusive (start, end) bounds; `None` means unbounded on that side.
    pub fn bounds(&self, today: NaiveDate) -> (Option<NaiveDate>, Option<NaiveDate>) {
        match *self {
            DateWindow::All => (None, None),
            DateWindow::Today => (Some(today), Some(today)),
            DateWindow::LastDays { days } => {
                // Ranges reaching past the calendar start clamp to its first day.
                let start = today
                    .checked_sub_days(Days::new(days.saturating_sub(1) as u64))
                    .unwrap_or(NaiveDate::MIN);
                (Some(start), Some(today))
            }
            DateWindow::Between { start, end } => (Some(start), Some(end)),
        }
    }

    pub fn contains(&self, date: NaiveDate, today: NaiveDate) -> bool {
        let (start, end) = self.bounds(today);
        start.is_none_or(|s| date >= s) && end.is_none_or(|e| date <= e)
    }
}

impl FromStr for DateWindow {
    type Err = JournalError;

    /// Accepts the dashboard presets (`today`, `week`, `month`, `3months`,
    /// `6months`, `year`, `all`) or `<n>d` for an arbitrary day count.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let preset = s.trim().to_lowercase();
        let window = match preset.as_str() {
            "" | "all" => DateWindow::All,
            "today" => DateWindow::Today,
            "week" => DateWindow::LastDays { days: 7 },
            "month" => DateWindow::LastDays { days: 30 },
            "3months" => DateWindow::LastDays { days: 90 },
            "6months" => DateWindow::LastDays { days: 180 },
            "year" => DateWindow::LastDays { days: 365 },
            other => {
                let days = other
                    .strip_suffix('d')
                    .and_then(|n| n.parse::<u32>().ok())
                    .filter(|n| (1..=MAX_WINDOW_DAYS).contains(n))
                    .ok_or_else(|| {
                        JournalError::validation("window", format!("unknown date range '{}'", s))
                    })?;
                DateWindow::LastDays { days }
            }
        };
        Ok(window)
    }
}
