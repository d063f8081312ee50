use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers::gameweeks;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/current", get(gameweeks::current_gameweek))
        .route("/:gw/scores", get(gameweeks::get_scores))
        .route("/:gw/finalization", get(gameweeks::finalization_status))
        .route("/:gw/finalize", post(gameweeks::finalize))
        .route("/:gw/matches", put(gameweeks::put_matches))
        .route("/:gw/predictions", put(gameweeks::put_prediction))
}
