use axum::{routing::post, Router};

use crate::handlers::admin;
use crate::state::AppState;

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/gameweeks/:gw/unfinalize", post(admin::unfinalize))
        .route("/recompute-totals", post(admin::recompute_totals))
}
