//! REST API handlers.
//!
//! Each handler reads/writes via `StateStore` and returns JSON responses.
//! Validation failures come back as structured `{code, message}` lists;
//! the human text lives only at this boundary.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect};
use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use shipcal_calendar::{PeriodKind, compute_window};
use shipcal_facts::{CreateError, CreateFactRequest, FactQuery, parse_day, query_facts};
use shipcal_state::{Artifact, Environment, Release, StatusClass};

use crate::ApiState;

/// Fixed page size for fact listings.
const FACT_PAGE_SIZE: usize = 100;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

/// One entry in a structured validation failure response.
#[derive(Serialize)]
struct ErrorEntry {
    code: &'static str,
    message: String,
}

#[derive(Serialize)]
struct ValidationFailure {
    success: bool,
    errors: Vec<ErrorEntry>,
}

// ── Index ──────────────────────────────────────────────────────

/// GET / — jump to today's plan week.
pub async fn index() -> Redirect {
    let today = Utc::now().date_naive();
    Redirect::to(&format!(
        "/api/v1/calendar/plan/week/{}/{}/{}",
        today.year(),
        today.month(),
        today.day()
    ))
}

// ── Calendar ───────────────────────────────────────────────────

/// GET /api/v1/calendar/:status/:period/:year/:month/:day
pub async fn calendar_window(
    State(state): State<ApiState>,
    Path((status, period, year, month, day)): Path<(String, String, i32, u32, u32)>,
) -> impl IntoResponse {
    let Ok(class) = status.parse::<StatusClass>() else {
        return error_response(
            &format!("unknown status class: {status}"),
            StatusCode::BAD_REQUEST,
        )
        .into_response();
    };
    let Ok(kind) = period.parse::<PeriodKind>() else {
        return error_response(
            &format!("unknown period kind: {period}"),
            StatusCode::BAD_REQUEST,
        )
        .into_response();
    };
    let Some(anchor) = NaiveDate::from_ymd_opt(year, month, day) else {
        return error_response(
            &format!("invalid date: {year}-{month}-{day}"),
            StatusCode::BAD_REQUEST,
        )
        .into_response();
    };

    match compute_window(&state.store, class, kind, anchor, &state.calendar) {
        Ok(window) => ApiResponse::ok(window).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

// ── Facts ──────────────────────────────────────────────────────

/// Query parameters for GET /api/v1/facts. HTML forms submit empty strings
/// for untouched fields, so empty values count as absent.
#[derive(Debug, Default, Deserialize)]
pub struct FactListParams {
    pub host: Option<String>,
    pub artifact: Option<String>,
    pub version: Option<String>,
    pub date: Option<String>,
    pub page: Option<String>,
}

/// JSON body for POST /api/v1/facts/search — same filters, always page 1.
#[derive(Debug, Default, Deserialize)]
pub struct FactSearchBody {
    pub host: Option<String>,
    pub artifact: Option<String>,
    pub version: Option<String>,
    pub date: Option<String>,
}

/// One page of fact query results.
#[derive(Serialize)]
pub struct FactPage {
    pub items: Vec<shipcal_state::DeploymentFact>,
    pub page: usize,
    pub pages: usize,
    pub total: usize,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Build a `FactQuery` from optional string filters. A present-but-bad date
/// aborts with `invalid_date`; there is no fallback.
fn build_query(
    host: Option<String>,
    artifact: Option<String>,
    version: Option<String>,
    date: Option<String>,
) -> Result<FactQuery, String> {
    let mut query = FactQuery::new();
    if let Some(host) = non_empty(host) {
        query = query.host(host);
    }
    if let Some(artifact) = non_empty(artifact) {
        query = query.artifact_type(artifact);
    }
    if let Some(version) = non_empty(version) {
        query = query.version(version);
    }
    if let Some(date) = non_empty(date) {
        let day = parse_day(&date).map_err(|e| e.to_string())?;
        query = query.day(day);
    }
    Ok(query)
}

/// Slice one page out of the full result set.
///
/// Page selection keeps the original browser's forgiving behavior: a
/// non-numeric page falls back to 1, an out-of-range page lands on the
/// last page. An empty result set is page 1 of 1 with total 0.
fn paginate(facts: Vec<shipcal_state::DeploymentFact>, page: Option<String>) -> FactPage {
    let total = facts.len();
    let pages = total.div_ceil(FACT_PAGE_SIZE).max(1);

    let requested = page.and_then(|p| p.parse::<usize>().ok());
    let page = match requested {
        None => 1,
        Some(p) if p < 1 || p > pages => pages,
        Some(p) => p,
    };

    let items = facts
        .into_iter()
        .skip((page - 1) * FACT_PAGE_SIZE)
        .take(FACT_PAGE_SIZE)
        .collect();

    FactPage {
        items,
        page,
        pages,
        total,
    }
}

/// GET /api/v1/facts
pub async fn list_facts(
    State(state): State<ApiState>,
    Query(params): Query<FactListParams>,
) -> impl IntoResponse {
    let query = match build_query(params.host, params.artifact, params.version, params.date) {
        Ok(query) => query,
        Err(msg) => return error_response(&msg, StatusCode::BAD_REQUEST).into_response(),
    };

    match query_facts(&state.store, &query) {
        Ok(facts) => ApiResponse::ok(paginate(facts, params.page)).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

/// POST /api/v1/facts/search — body-driven query, always the first page.
pub async fn search_facts(
    State(state): State<ApiState>,
    Json(body): Json<FactSearchBody>,
) -> impl IntoResponse {
    let query = match build_query(body.host, body.artifact, body.version, body.date) {
        Ok(query) => query,
        Err(msg) => return error_response(&msg, StatusCode::BAD_REQUEST).into_response(),
    };

    match query_facts(&state.store, &query) {
        Ok(facts) => ApiResponse::ok(paginate(facts, Some("1".to_string()))).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

/// POST /api/v1/facts
pub async fn create_fact(
    State(state): State<ApiState>,
    Json(req): Json<CreateFactRequest>,
) -> impl IntoResponse {
    match shipcal_facts::create_fact(&state.store, &req) {
        Ok(fact) => (StatusCode::CREATED, ApiResponse::ok(fact)).into_response(),
        Err(CreateError::Invalid(errors)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ValidationFailure {
                success: false,
                errors: errors
                    .iter()
                    .map(|e| ErrorEntry {
                        code: e.code(),
                        message: e.to_string(),
                    })
                    .collect(),
            }),
        )
            .into_response(),
        Err(CreateError::Store(e)) => {
            error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response()
        }
    }
}

// ── Releases ───────────────────────────────────────────────────

/// GET /api/v1/releases
pub async fn list_releases(State(state): State<ApiState>) -> impl IntoResponse {
    match state.store.list_releases() {
        Ok(releases) => ApiResponse::ok(releases).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

/// POST /api/v1/releases
pub async fn create_release(
    State(state): State<ApiState>,
    Json(release): Json<Release>,
) -> impl IntoResponse {
    match state.store.put_release(&release) {
        Ok(()) => (StatusCode::CREATED, ApiResponse::ok(release)).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

// ── Artifacts ──────────────────────────────────────────────────

/// GET /api/v1/artifacts
pub async fn list_artifacts(State(state): State<ApiState>) -> impl IntoResponse {
    match state.store.list_artifacts() {
        Ok(artifacts) => ApiResponse::ok(artifacts).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

/// POST /api/v1/artifacts
pub async fn create_artifact(
    State(state): State<ApiState>,
    Json(artifact): Json<Artifact>,
) -> impl IntoResponse {
    match state.store.put_artifact(&artifact) {
        Ok(()) => (StatusCode::CREATED, ApiResponse::ok(artifact)).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

// ── Environments ───────────────────────────────────────────────

/// GET /api/v1/environments
pub async fn list_environments(State(state): State<ApiState>) -> impl IntoResponse {
    match state.store.list_environments() {
        Ok(environments) => ApiResponse::ok(environments).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

/// POST /api/v1/environments
pub async fn create_environment(
    State(state): State<ApiState>,
    Json(env): Json<Environment>,
) -> impl IntoResponse {
    match state.store.put_environment(&env) {
        Ok(()) => (StatusCode::CREATED, ApiResponse::ok(env)).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use shipcal_calendar::CalendarConfig;
    use shipcal_state::{DeploymentFact, FactStatus, ReleaseStatus, StateStore};

    fn test_state() -> ApiState {
        ApiState {
            store: StateStore::open_in_memory().unwrap(),
            calendar: CalendarConfig::default(),
        }
    }

    fn seed_fact(state: &ApiState, id: &str, host: &str, day: u32) {
        state
            .store
            .insert_fact(&DeploymentFact {
                id: id.to_string(),
                host: host.to_string(),
                artifact_id: "a-1".to_string(),
                artifact_type: "billing".to_string(),
                artifact_version: "1.0.0".to_string(),
                environment: "prod".to_string(),
                status: FactStatus::Success,
                datetime: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
            })
            .unwrap();
    }

    #[tokio::test]
    async fn calendar_window_ok() {
        let state = test_state();
        let path = Path((
            "plan".to_string(),
            "month".to_string(),
            2024,
            3,
            1,
        ));
        let resp = calendar_window(State(state), path).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn calendar_window_rejects_unknown_class() {
        let state = test_state();
        let path = Path((
            "future".to_string(),
            "month".to_string(),
            2024,
            3,
            1,
        ));
        let resp = calendar_window(State(state), path).await.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn calendar_window_rejects_impossible_date() {
        let state = test_state();
        let path = Path((
            "plan".to_string(),
            "week".to_string(),
            2024,
            2,
            30,
        ));
        let resp = calendar_window(State(state), path).await.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn list_facts_empty_store() {
        let state = test_state();
        let resp = list_facts(State(state), Query(FactListParams::default()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn list_facts_rejects_bad_date() {
        let state = test_state();
        let params = FactListParams {
            date: Some("not-a-date".to_string()),
            ..Default::default()
        };
        let resp = list_facts(State(state), Query(params)).await.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn list_facts_treats_empty_strings_as_absent() {
        let state = test_state();
        seed_fact(&state, "f-1", "h1", 10);

        let params = FactListParams {
            host: Some(String::new()),
            artifact: Some(String::new()),
            version: Some(String::new()),
            date: Some(String::new()),
            page: None,
        };
        let resp = list_facts(State(state), Query(params)).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn create_fact_missing_artifact_is_unprocessable() {
        let state = test_state();
        let req = CreateFactRequest {
            host: "web01".to_string(),
            artifact: "ghost".to_string(),
            version: "1.0.0".to_string(),
            environment: "prod".to_string(),
            status: "SC".to_string(),
            datetime: None,
        };
        let resp = create_fact(State(state), Json(req)).await.into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn create_fact_happy_path() {
        let state = test_state();
        state
            .store
            .put_artifact(&Artifact {
                id: "a-1".to_string(),
                type_name: "billing".to_string(),
                version: "1.0.0".to_string(),
            })
            .unwrap();
        state
            .store
            .put_environment(&Environment { name: "prod".to_string() })
            .unwrap();

        let req = CreateFactRequest {
            host: "web01".to_string(),
            artifact: "billing".to_string(),
            version: "1.0.0".to_string(),
            environment: "prod".to_string(),
            status: "FL".to_string(),
            datetime: None,
        };
        let resp = create_fact(State(state.clone()), Json(req)).await.into_response();
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(state.store.count_facts().unwrap(), 1);
    }

    #[tokio::test]
    async fn create_and_list_release() {
        let state = test_state();
        let release = Release {
            id: "r-1".to_string(),
            name: "spring drop".to_string(),
            start_time: Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap(),
            status: ReleaseStatus::New,
        };

        let resp = create_release(State(state.clone()), Json(release)).await.into_response();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = list_releases(State(state)).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    // ── Pagination ─────────────────────────────────────────────

    fn dummy_facts(n: usize) -> Vec<DeploymentFact> {
        (0..n)
            .map(|i| DeploymentFact {
                id: format!("f-{i}"),
                host: "h".to_string(),
                artifact_id: "a".to_string(),
                artifact_type: "t".to_string(),
                artifact_version: "1".to_string(),
                environment: "prod".to_string(),
                status: FactStatus::Success,
                datetime: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            })
            .collect()
    }

    #[test]
    fn paginate_splits_into_pages_of_100() {
        let page = paginate(dummy_facts(250), Some("2".to_string()));
        assert_eq!(page.total, 250);
        assert_eq!(page.pages, 3);
        assert_eq!(page.page, 2);
        assert_eq!(page.items.len(), 100);
        assert_eq!(page.items[0].id, "f-100");
    }

    #[test]
    fn paginate_non_integer_page_falls_back_to_first() {
        let page = paginate(dummy_facts(250), Some("abc".to_string()));
        assert_eq!(page.page, 1);
        assert_eq!(page.items[0].id, "f-0");
    }

    #[test]
    fn paginate_out_of_range_lands_on_last_page() {
        let page = paginate(dummy_facts(250), Some("99".to_string()));
        assert_eq!(page.page, 3);
        assert_eq!(page.items.len(), 50);

        let page = paginate(dummy_facts(250), Some("0".to_string()));
        assert_eq!(page.page, 3);
    }

    #[test]
    fn paginate_empty_result_is_one_empty_page() {
        let page = paginate(Vec::new(), None);
        assert_eq!(page.total, 0);
        assert_eq!(page.pages, 1);
        assert_eq!(page.page, 1);
        assert!(page.items.is_empty());
    }
}
