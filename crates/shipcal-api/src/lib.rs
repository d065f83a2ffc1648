//! shipcal-api — REST API for shipcal.
//!
//! Provides axum route handlers for calendar windows, deployment-fact
//! queries and ingestion, and the record-population surfaces (releases,
//! artifacts, environments) that an external release-management process
//! would normally drive.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/` | Redirect to today's plan/week calendar |
//! | GET | `/api/v1/calendar/{status}/{period}/{year}/{month}/{day}` | Calendar window |
//! | GET | `/api/v1/facts` | Query facts (query params, paginated) |
//! | POST | `/api/v1/facts/search` | Query facts (JSON body, first page) |
//! | POST | `/api/v1/facts` | Create a deployment fact |
//! | GET/POST | `/api/v1/releases` | List / create releases |
//! | GET/POST | `/api/v1/artifacts` | List / create artifacts |
//! | GET/POST | `/api/v1/environments` | List / create environments |

pub mod handlers;

use axum::Router;
use axum::routing::{get, post};
use shipcal_calendar::CalendarConfig;
use shipcal_state::StateStore;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: StateStore,
    pub calendar: CalendarConfig,
}

/// Build the complete API router.
pub fn build_router(store: StateStore) -> Router {
    let state = ApiState {
        store,
        calendar: CalendarConfig::default(),
    };

    let api_routes = Router::new()
        .route(
            "/calendar/{status}/{period}/{year}/{month}/{day}",
            get(handlers::calendar_window),
        )
        .route("/facts", get(handlers::list_facts).post(handlers::create_fact))
        .route("/facts/search", post(handlers::search_facts))
        .route("/releases", get(handlers::list_releases).post(handlers::create_release))
        .route("/artifacts", get(handlers::list_artifacts).post(handlers::create_artifact))
        .route(
            "/environments",
            get(handlers::list_environments).post(handlers::create_environment),
        )
        .with_state(state);

    Router::new()
        .route("/", get(handlers::index))
        .nest("/api/v1", api_routes)
}
