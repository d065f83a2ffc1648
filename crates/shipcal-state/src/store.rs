//! StateStore — redb-backed persistence for shipcal.
//!
//! Provides typed operations over releases, artifacts, environments, and
//! deployment facts. All values are JSON-serialized into redb's `&[u8]`
//! value columns. The store supports both on-disk and in-memory backends
//! (the latter for testing).

use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(RELEASES).map_err(map_err!(Table))?;
        txn.open_table(ARTIFACTS).map_err(map_err!(Table))?;
        txn.open_table(ENVIRONMENTS).map_err(map_err!(Table))?;
        txn.open_table(FACTS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Releases ───────────────────────────────────────────────────

    /// Insert or update a release.
    pub fn put_release(&self, release: &Release) -> StateResult<()> {
        let value = serde_json::to_vec(release).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(RELEASES).map_err(map_err!(Table))?;
            table
                .insert(release.id.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(id = %release.id, "release stored");
        Ok(())
    }

    /// Get a release by id.
    pub fn get_release(&self, id: &str) -> StateResult<Option<Release>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(RELEASES).map_err(map_err!(Table))?;
        match table.get(id).map_err(map_err!(Read))? {
            Some(guard) => {
                let release: Release =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(release))
            }
            None => Ok(None),
        }
    }

    /// List all releases.
    pub fn list_releases(&self) -> StateResult<Vec<Release>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(RELEASES).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let release: Release =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(release);
        }
        Ok(results)
    }

    /// List releases whose start *date* falls in the inclusive range
    /// `[from, to]` and whose status is in `statuses`, ordered ascending by
    /// start time. Both bounds are calendar days; a release anywhere on the
    /// `to` day is included.
    pub fn list_releases_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        statuses: &[ReleaseStatus],
    ) -> StateResult<Vec<Release>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(RELEASES).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let release: Release =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            let day = release.start_time.date_naive();
            if day >= from && day <= to && statuses.contains(&release.status) {
                results.push(release);
            }
        }
        results.sort_by_key(|r| r.start_time);
        Ok(results)
    }

    // ── Artifacts ──────────────────────────────────────────────────

    /// Insert an artifact. Artifacts are immutable; re-inserting the same id
    /// overwrites, which callers are expected not to do.
    pub fn put_artifact(&self, artifact: &Artifact) -> StateResult<()> {
        let value = serde_json::to_vec(artifact).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(ARTIFACTS).map_err(map_err!(Table))?;
            table
                .insert(artifact.id.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(id = %artifact.id, "artifact stored");
        Ok(())
    }

    /// List all artifacts in id order.
    pub fn list_artifacts(&self) -> StateResult<Vec<Artifact>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(ARTIFACTS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let artifact: Artifact =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(artifact);
        }
        Ok(results)
    }

    /// Find the first artifact matching (type_name, version).
    ///
    /// Duplicate pairs are allowed in the table; iteration is in key
    /// (id) order, so "first" is deterministic across runs.
    pub fn find_artifact(&self, type_name: &str, version: &str) -> StateResult<Option<Artifact>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(ARTIFACTS).map_err(map_err!(Table))?;
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let artifact: Artifact =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            if artifact.type_name == type_name && artifact.version == version {
                return Ok(Some(artifact));
            }
        }
        Ok(None)
    }

    // ── Environments ───────────────────────────────────────────────

    /// Insert or update an environment.
    pub fn put_environment(&self, env: &Environment) -> StateResult<()> {
        let value = serde_json::to_vec(env).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(ENVIRONMENTS).map_err(map_err!(Table))?;
            table
                .insert(env.name.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Get an environment by name.
    pub fn get_environment(&self, name: &str) -> StateResult<Option<Environment>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(ENVIRONMENTS).map_err(map_err!(Table))?;
        match table.get(name).map_err(map_err!(Read))? {
            Some(guard) => {
                let env: Environment =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(env))
            }
            None => Ok(None),
        }
    }

    /// List all environments.
    pub fn list_environments(&self) -> StateResult<Vec<Environment>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(ENVIRONMENTS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let env: Environment =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(env);
        }
        Ok(results)
    }

    // ── Deployment facts ───────────────────────────────────────────

    /// Insert a deployment fact. Facts are insert-only; a single insert per
    /// creation, so concurrent writers need no coordination beyond redb's
    /// own transaction guarantees.
    pub fn insert_fact(&self, fact: &DeploymentFact) -> StateResult<()> {
        let value = serde_json::to_vec(fact).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(FACTS).map_err(map_err!(Table))?;
            table
                .insert(fact.id.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(id = %fact.id, host = %fact.host, "fact stored");
        Ok(())
    }

    /// Get a fact by id.
    pub fn get_fact(&self, id: &str) -> StateResult<Option<DeploymentFact>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(FACTS).map_err(map_err!(Table))?;
        match table.get(id).map_err(map_err!(Read))? {
            Some(guard) => {
                let fact: DeploymentFact =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(fact))
            }
            None => Ok(None),
        }
    }

    /// List all deployment facts (unordered; callers sort).
    pub fn list_facts(&self) -> StateResult<Vec<DeploymentFact>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(FACTS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let fact: DeploymentFact =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(fact);
        }
        Ok(results)
    }

    /// Count all deployment facts.
    pub fn count_facts(&self) -> StateResult<u64> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(FACTS).map_err(map_err!(Table))?;
        let mut count = 0u64;
        for entry in table.iter().map_err(map_err!(Read))? {
            entry.map_err(map_err!(Read))?;
            count += 1;
        }
        Ok(count)
    }
}
