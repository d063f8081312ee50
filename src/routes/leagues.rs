use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::leagues;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/:id/standings", get(leagues::get_standings))
        .route("/:id/fixtures/:gw", get(leagues::get_fixtures))
        .route("/:id/fixtures/regenerate", post(leagues::regenerate))
        .route("/:id/start", post(leagues::start))
}
