//! shipcal deployment facts — query composition and validated ingestion.
//!
//! A deployment fact records one deployment attempt's outcome. This crate
//! owns the two operations over facts:
//!
//! - **`query`** — `FactQuery`, a builder of optional filter criteria
//!   (host, artifact type, version, day) applied conjunctively with a
//!   descending datetime sort.
//! - **`create`** — `create_fact`, which validates host/artifact/environment/
//!   status against the store, accumulating all problems before refusing,
//!   and inserts exactly one fact on success.

pub mod create;
pub mod query;

pub use create::{CreateError, CreateFactRequest, ValidationError, create_fact};
pub use query::{FactQuery, QueryError, parse_day, query_facts};
