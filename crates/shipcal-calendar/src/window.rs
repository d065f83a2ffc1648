//! Release window computation.
//!
//! `compute_window` fetches the releases of one status class around an
//! anchor date and groups them into one bucket per calendar day. Pure read
//! plus compute; nothing is written.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use shipcal_state::{Release, StateResult, StateStore, StatusClass};

use crate::config::{CalendarConfig, PeriodKind};

/// One computed calendar window: day buckets plus navigation anchors.
///
/// The input parameters (`class`, `kind`, `anchor`) are carried in the
/// result so callers can round-trip them into links and follow-up queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseWindow {
    pub class: StatusClass,
    pub kind: PeriodKind,
    pub anchor: NaiveDate,
    /// Day keys in ascending order; always exactly `window_days` entries.
    pub days: Vec<NaiveDate>,
    /// Releases per day. Every day in `days` is present, empty or not.
    pub releases: BTreeMap<NaiveDate, Vec<Release>>,
    /// Largest bucket size. Month windows are floored at
    /// `CalendarConfig::month_day_floor` so the grid keeps a minimum height.
    pub max_per_day: usize,
    /// Anchor of the previous window.
    pub prev_anchor: NaiveDate,
    /// Anchor of the next window.
    pub next_anchor: NaiveDate,
}

/// Compute the calendar window for `class`/`kind` anchored at `anchor`.
///
/// Releases are fetched over the *inclusive* date range
/// `[anchor, anchor + window_days]` — one day past the last bucket. A
/// release starting on that final day has no bucket and is dropped from
/// the window; the bucket set is always exactly `window_days` days.
pub fn compute_window(
    store: &StateStore,
    class: StatusClass,
    kind: PeriodKind,
    anchor: NaiveDate,
    cfg: &CalendarConfig,
) -> StateResult<ReleaseWindow> {
    let window_days = cfg.window_days(kind);
    let fetch_end = anchor + Days::new(window_days as u64);

    let fetched = store.list_releases_between(anchor, fetch_end, &class.statuses())?;

    let mut releases: BTreeMap<NaiveDate, Vec<Release>> = BTreeMap::new();
    for offset in 0..window_days {
        releases.insert(anchor + Days::new(offset as u64), Vec::new());
    }

    for release in fetched {
        let day = release.start_time.date_naive();
        match releases.get_mut(&day) {
            Some(bucket) => bucket.push(release),
            // The inclusive fetch range reaches one day past the bucketed
            // window; releases landing there are dropped.
            None => debug!(id = %release.id, %day, "release outside bucketed window, dropped"),
        }
    }

    let mut max_per_day = releases.values().map(Vec::len).max().unwrap_or(0);
    if kind == PeriodKind::Month && max_per_day < cfg.month_day_floor {
        max_per_day = cfg.month_day_floor;
    }

    let days: Vec<NaiveDate> = releases.keys().copied().collect();
    let prev_anchor = anchor - Days::new(window_days as u64);
    let next_anchor = anchor + Days::new(window_days as u64);

    Ok(ReleaseWindow {
        class,
        kind,
        anchor,
        days,
        releases,
        max_per_day,
        prev_anchor,
        next_anchor,
    })
}
