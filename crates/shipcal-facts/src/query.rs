//! Fact query composition.
//!
//! Four optional criteria, sixteen presence combinations, one rule: every
//! present criterion is ANDed in, and results come back newest-first. The
//! combination table from the original fact browser collapses into a
//! builder with conditional predicates.

use chrono::{Days, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use shipcal_state::{DeploymentFact, StateResult, StateStore};

/// Errors raised while building a query from caller input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    /// The date string did not parse as `YYYY-MM-DD`. There is no fallback
    /// date; the query is rejected outright.
    #[error("invalid date: {0}")]
    InvalidDate(String),
}

/// Parse a `YYYY-MM-DD` day for use as a query criterion.
pub fn parse_day(s: &str) -> Result<NaiveDate, QueryError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| QueryError::InvalidDate(s.to_string()))
}

/// A composed fact query. Each criterion is optional; present criteria are
/// applied conjunctively.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FactQuery {
    pub host: Option<String>,
    pub artifact_type: Option<String>,
    pub version: Option<String>,
    /// Matches facts recorded anywhere on this calendar day, i.e.
    /// `[day 00:00, day+1 00:00)`.
    pub day: Option<NaiveDate>,
}

impl FactQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn artifact_type(mut self, type_name: impl Into<String>) -> Self {
        self.artifact_type = Some(type_name.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn day(mut self, day: NaiveDate) -> Self {
        self.day = Some(day);
        self
    }

    /// Whether a fact satisfies every present criterion.
    pub fn matches(&self, fact: &DeploymentFact) -> bool {
        if let Some(host) = &self.host {
            if &fact.host != host {
                return false;
            }
        }
        if let Some(type_name) = &self.artifact_type {
            if &fact.artifact_type != type_name {
                return false;
            }
        }
        if let Some(version) = &self.version {
            if &fact.artifact_version != version {
                return false;
            }
        }
        if let Some(day) = self.day {
            let start = day.and_time(NaiveTime::MIN).and_utc();
            let end = (day + Days::new(1)).and_time(NaiveTime::MIN).and_utc();
            if fact.datetime < start || fact.datetime >= end {
                return false;
            }
        }
        true
    }
}

/// Execute a fact query: scan, filter, sort descending by datetime.
///
/// Returns the full ordered result set; pagination is the caller's concern.
/// An empty result is not an error.
pub fn query_facts(store: &StateStore, query: &FactQuery) -> StateResult<Vec<DeploymentFact>> {
    let mut facts = store.list_facts()?;
    facts.retain(|f| query.matches(f));
    facts.sort_by(|a, b| b.datetime.cmp(&a.datetime));
    debug!(hits = facts.len(), ?query, "fact query executed");
    Ok(facts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use shipcal_state::FactStatus;

    fn fact(
        id: &str,
        host: &str,
        artifact_type: &str,
        version: &str,
        datetime: chrono::DateTime<Utc>,
    ) -> DeploymentFact {
        DeploymentFact {
            id: id.to_string(),
            host: host.to_string(),
            artifact_id: format!("a-{artifact_type}-{version}"),
            artifact_type: artifact_type.to_string(),
            artifact_version: version.to_string(),
            environment: "prod".to_string(),
            status: FactStatus::Success,
            datetime,
        }
    }

    fn seeded_store() -> StateStore {
        let store = StateStore::open_in_memory().unwrap();
        let at = |d: u32, h: u32| Utc.with_ymd_and_hms(2024, 3, d, h, 0, 0).unwrap();

        store.insert_fact(&fact("f-1", "h1", "billing", "1.0.0", at(10, 9))).unwrap();
        store.insert_fact(&fact("f-2", "h1", "billing", "2.0.0", at(10, 15))).unwrap();
        store.insert_fact(&fact("f-3", "h2", "billing", "1.0.0", at(11, 8))).unwrap();
        store.insert_fact(&fact("f-4", "h2", "web", "1.0.0", at(12, 8))).unwrap();
        store.insert_fact(&fact("f-5", "h1", "web", "3.1.0", at(9, 23))).unwrap();
        store
    }

    #[test]
    fn parse_day_accepts_iso_dates() {
        assert_eq!(
            parse_day("2024-03-10").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
        );
    }

    #[test]
    fn parse_day_rejects_garbage() {
        assert_eq!(
            parse_day("10/03/2024"),
            Err(QueryError::InvalidDate("10/03/2024".to_string()))
        );
        assert!(parse_day("2024-13-01").is_err());
        assert!(parse_day("").is_err());
    }

    #[test]
    fn no_filters_returns_everything_descending() {
        let store = seeded_store();
        let facts = query_facts(&store, &FactQuery::new()).unwrap();

        assert_eq!(facts.len(), 5);
        let ids: Vec<&str> = facts.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["f-4", "f-3", "f-2", "f-1", "f-5"]);
    }

    #[test]
    fn host_only_filter() {
        let store = seeded_store();
        let facts = query_facts(&store, &FactQuery::new().host("h1")).unwrap();

        let ids: Vec<&str> = facts.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["f-2", "f-1", "f-5"]);
    }

    #[test]
    fn day_filter_covers_exactly_one_calendar_day() {
        let store = StateStore::open_in_memory().unwrap();
        let at = |d: u32, h: u32, min: u32, s: u32| {
            Utc.with_ymd_and_hms(2024, 3, d, h, min, s).unwrap()
        };
        store.insert_fact(&fact("f-before", "h1", "web", "1", at(9, 23, 59, 59))).unwrap();
        store.insert_fact(&fact("f-start", "h1", "web", "1", at(10, 0, 0, 0))).unwrap();
        store.insert_fact(&fact("f-end", "h1", "web", "1", at(10, 23, 59, 59))).unwrap();
        store.insert_fact(&fact("f-after", "h1", "web", "1", at(11, 0, 0, 0))).unwrap();

        let day = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let facts = query_facts(&store, &FactQuery::new().day(day)).unwrap();

        let ids: Vec<&str> = facts.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["f-end", "f-start"]);
    }

    #[test]
    fn all_four_filters_compose() {
        let store = seeded_store();
        let query = FactQuery::new()
            .host("h1")
            .artifact_type("billing")
            .version("1.0.0")
            .day(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());

        let facts = query_facts(&store, &query).unwrap();
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].id, "f-1");
    }

    #[test]
    fn empty_result_is_ok_not_error() {
        let store = seeded_store();
        let facts = query_facts(&store, &FactQuery::new().host("no-such-host")).unwrap();
        assert!(facts.is_empty());
    }

    /// Drive all sixteen presence combinations against a reference filter.
    /// Proves the builder is a total function over the combination space.
    #[test]
    fn sixteen_combination_matrix() {
        let store = seeded_store();
        let all = store.list_facts().unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();

        for mask in 0u32..16 {
            let with_host = mask & 0b1000 != 0;
            let with_type = mask & 0b0100 != 0;
            let with_version = mask & 0b0010 != 0;
            let with_day = mask & 0b0001 != 0;

            let mut query = FactQuery::new();
            if with_host {
                query = query.host("h1");
            }
            if with_type {
                query = query.artifact_type("billing");
            }
            if with_version {
                query = query.version("1.0.0");
            }
            if with_day {
                query = query.day(day);
            }

            let got = query_facts(&store, &query).unwrap();

            // Reference semantics: independent conjunctive checks.
            let mut expected: Vec<DeploymentFact> = all
                .iter()
                .filter(|f| !with_host || f.host == "h1")
                .filter(|f| !with_type || f.artifact_type == "billing")
                .filter(|f| !with_version || f.artifact_version == "1.0.0")
                .filter(|f| !with_day || f.datetime.date_naive() == day)
                .cloned()
                .collect();
            expected.sort_by(|a, b| b.datetime.cmp(&a.datetime));

            assert_eq!(got, expected, "combination mask {mask:04b}");
        }
    }

    #[test]
    fn descending_order_holds_under_every_filter() {
        let store = seeded_store();
        for query in [
            FactQuery::new(),
            FactQuery::new().host("h1"),
            FactQuery::new().artifact_type("billing"),
            FactQuery::new().host("h2").artifact_type("web"),
        ] {
            let facts = query_facts(&store, &query).unwrap();
            assert!(
                facts.windows(2).all(|w| w[0].datetime >= w[1].datetime),
                "not descending for {query:?}"
            );
        }
    }
}
