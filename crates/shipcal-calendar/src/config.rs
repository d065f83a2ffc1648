//! Calendar configuration.

use serde::{Deserialize, Serialize};

/// The two period kinds a calendar view can span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodKind {
    Week,
    Month,
}

impl PeriodKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PeriodKind::Week => "week",
            PeriodKind::Month => "month",
        }
    }
}

impl std::str::FromStr for PeriodKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "week" => Ok(PeriodKind::Week),
            "month" => Ok(PeriodKind::Month),
            other => Err(format!("unknown period kind: {other}")),
        }
    }
}

/// Immutable calendar parameters, passed into `compute_window`.
///
/// Windows are fixed-length: a month view is always `month_days` days
/// regardless of calendar month boundaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Days in a week window.
    pub week_days: u32,
    /// Days in a month window.
    pub month_days: u32,
    /// Minimum `max_per_day` reported for month windows, so the rendered
    /// grid never collapses below this many rows.
    pub month_day_floor: usize,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            week_days: 7,
            month_days: 28,
            month_day_floor: 7,
        }
    }
}

impl CalendarConfig {
    /// Window length in days for the given period kind.
    pub fn window_days(&self, kind: PeriodKind) -> u32 {
        match kind {
            PeriodKind::Week => self.week_days,
            PeriodKind::Month => self.month_days,
        }
    }
}
