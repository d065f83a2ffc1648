//! Domain types for the shipcal state store.
//!
//! These types represent the persisted state of releases, artifacts,
//! environments, and deployment facts. All types are serializable to/from
//! JSON for storage in redb tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a release.
pub type ReleaseId = String;

/// Unique identifier for an artifact.
pub type ArtifactId = String;

/// Unique identifier for a deployment fact.
pub type FactId = String;

// ── Release ───────────────────────────────────────────────────────

/// A planned or completed software release.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Release {
    pub id: ReleaseId,
    pub name: String,
    /// When the release starts (or started).
    pub start_time: DateTime<Utc>,
    pub status: ReleaseStatus,
}

/// Lifecycle status of a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseStatus {
    New,
    InProgress,
    Ready,
    Canceled,
    Failed,
    Successful,
}

impl ReleaseStatus {
    /// The class this status belongs to. Every status is in exactly one.
    pub fn class(self) -> StatusClass {
        match self {
            ReleaseStatus::New | ReleaseStatus::InProgress | ReleaseStatus::Ready => {
                StatusClass::Plan
            }
            ReleaseStatus::Canceled | ReleaseStatus::Failed | ReleaseStatus::Successful => {
                StatusClass::History
            }
        }
    }
}

/// The two disjoint classes a release status falls into: not-yet-concluded
/// (plan) or concluded (history).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    Plan,
    History,
}

impl StatusClass {
    /// The statuses belonging to this class.
    pub fn statuses(self) -> [ReleaseStatus; 3] {
        match self {
            StatusClass::Plan => [
                ReleaseStatus::New,
                ReleaseStatus::InProgress,
                ReleaseStatus::Ready,
            ],
            StatusClass::History => [
                ReleaseStatus::Canceled,
                ReleaseStatus::Failed,
                ReleaseStatus::Successful,
            ],
        }
    }

    pub fn contains(self, status: ReleaseStatus) -> bool {
        status.class() == self
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatusClass::Plan => "plan",
            StatusClass::History => "history",
        }
    }
}

impl std::str::FromStr for StatusClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plan" => Ok(StatusClass::Plan),
            "history" => Ok(StatusClass::History),
            other => Err(format!("unknown status class: {other}")),
        }
    }
}

// ── Artifact ──────────────────────────────────────────────────────

/// A versioned build product. Immutable once created; duplicate
/// (type_name, version) pairs are allowed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Artifact {
    pub id: ArtifactId,
    /// Artifact type name, e.g. "billing-service".
    pub type_name: String,
    pub version: String,
}

// ── Environment ───────────────────────────────────────────────────

/// A named deployment target. The name is the identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Environment {
    pub name: String,
}

// ── Deployment fact ───────────────────────────────────────────────

/// A record of one deployment attempt's outcome. Insert-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeploymentFact {
    pub id: FactId,
    /// Host the artifact was deployed to.
    pub host: String,
    pub artifact_id: ArtifactId,
    /// Denormalized from the referenced artifact at insert time, so fact
    /// queries don't need a join.
    pub artifact_type: String,
    pub artifact_version: String,
    pub environment: String,
    pub status: FactStatus,
    /// When the deployment happened. Defaults to creation time.
    pub datetime: DateTime<Utc>,
}

/// Outcome of a deployment attempt. Wire codes are the two-letter strings
/// the original ingestion contract uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FactStatus {
    #[serde(rename = "FL")]
    Failed,
    #[serde(rename = "SC")]
    Success,
}

impl FactStatus {
    /// Parse a wire code. Anything other than "FL"/"SC" is rejected.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "FL" => Some(FactStatus::Failed),
            "SC" => Some(FactStatus::Success),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            FactStatus::Failed => "FL",
            FactStatus::Success => "SC",
        }
    }
}
