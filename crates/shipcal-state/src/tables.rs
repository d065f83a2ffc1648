//! redb table definitions for the shipcal state store.
//!
//! Each table uses `&str` keys and `&[u8]` values (JSON-serialized domain
//! types). Keys are the record's natural identity, so plain iteration yields
//! a stable lexicographic order.

use redb::TableDefinition;

/// Releases keyed by `{release_id}`.
pub const RELEASES: TableDefinition<&str, &[u8]> = TableDefinition::new("releases");

/// Artifacts keyed by `{artifact_id}`.
pub const ARTIFACTS: TableDefinition<&str, &[u8]> = TableDefinition::new("artifacts");

/// Environments keyed by `{name}`.
pub const ENVIRONMENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("environments");

/// Deployment facts keyed by `{fact_id}`.
pub const FACTS: TableDefinition<&str, &[u8]> = TableDefinition::new("facts");
