//! shipcal calendar views — fixed-length release windows.
//!
//! A calendar view shows the releases of one status class (plan or history)
//! over a fixed-length window of days anchored at a chosen date: 7 days for
//! a week view, 28 days for a month view. Windows are fixed-length by
//! design — a "month" is four weeks, not a calendar month, so every month
//! view has the same grid shape.
//!
//! # Components
//!
//! - **`config`** — `CalendarConfig` (window lengths, month floor) and `PeriodKind`
//! - **`window`** — `compute_window` and the `ReleaseWindow` result

pub mod config;
pub mod window;

pub use config::{CalendarConfig, PeriodKind};
pub use window::{ReleaseWindow, compute_window};
