//! Validated fact creation.
//!
//! Every incoming fact must name an existing artifact (by type + version),
//! an existing environment, and a known status code. Validation accumulates
//! all failures before refusing, so a caller with three bad fields hears
//! about all three at once. Nothing is written unless everything passes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use shipcal_state::{DeploymentFact, FactStatus, StateError, StateStore};

/// Incoming fact-creation payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFactRequest {
    pub host: String,
    /// Artifact type name.
    pub artifact: String,
    pub version: String,
    pub environment: String,
    /// Wire status code, "FL" or "SC".
    pub status: String,
    /// When the deployment happened. Absent means "now".
    #[serde(default)]
    pub datetime: Option<DateTime<Utc>>,
}

/// One validation failure. `code` is the stable wire identifier; `Display`
/// is the human text, derived from the code at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("artifact not found")]
    ArtifactNotFound,

    #[error("environment not found")]
    EnvironmentNotFound,

    #[error("status incorrect")]
    StatusIncorrect,
}

impl ValidationError {
    pub fn code(self) -> &'static str {
        match self {
            ValidationError::ArtifactNotFound => "artifact_not_found",
            ValidationError::EnvironmentNotFound => "environment_not_found",
            ValidationError::StatusIncorrect => "status_incorrect",
        }
    }
}

/// Why a fact was not created.
#[derive(Debug, Error)]
pub enum CreateError {
    /// One or more fields failed validation; nothing was written.
    #[error("validation failed: {}", format_errors(.0))]
    Invalid(Vec<ValidationError>),

    /// The store itself failed.
    #[error(transparent)]
    Store(#[from] StateError),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Validate and persist one deployment fact.
///
/// Resolution and parse failures never panic; they accumulate into
/// `CreateError::Invalid`. On success exactly one fact is inserted and
/// returned.
pub fn create_fact(
    store: &StateStore,
    req: &CreateFactRequest,
) -> Result<DeploymentFact, CreateError> {
    let mut errors = Vec::new();

    // Ambiguous (type, version) pairs resolve to the first artifact in
    // stable id order.
    let artifact = store.find_artifact(&req.artifact, &req.version)?;
    if artifact.is_none() {
        errors.push(ValidationError::ArtifactNotFound);
    }

    let environment = store.get_environment(&req.environment)?;
    if environment.is_none() {
        errors.push(ValidationError::EnvironmentNotFound);
    }

    let status = FactStatus::from_code(&req.status);
    if status.is_none() {
        errors.push(ValidationError::StatusIncorrect);
    }

    let (Some(artifact), Some(environment), Some(status)) = (artifact, environment, status) else {
        warn!(host = %req.host, ?errors, "fact rejected");
        return Err(CreateError::Invalid(errors));
    };

    let fact = DeploymentFact {
        id: Uuid::new_v4().to_string(),
        host: req.host.clone(),
        artifact_id: artifact.id.clone(),
        artifact_type: artifact.type_name.clone(),
        artifact_version: artifact.version.clone(),
        environment: environment.name.clone(),
        status,
        datetime: req.datetime.unwrap_or_else(Utc::now),
    };

    store.insert_fact(&fact)?;
    info!(id = %fact.id, host = %fact.host, status = fact.status.code(), "fact created");
    Ok(fact)
}
