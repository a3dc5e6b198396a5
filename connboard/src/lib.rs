//! connboard library - HTTP host surface for the Connections leaderboard
//!
//! A chat adapter forwards messages and operator commands here; the
//! leaderboard logic itself lives in `connboard-common`.

use std::sync::Arc;

use axum::Router;
use connboard_common::{CommunityRegistry, LeaderboardService};
use tower_http::trace::TraceLayer;

pub mod api;
pub mod notifier;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub service: LeaderboardService,
    pub registry: Arc<dyn CommunityRegistry>,
    /// Bearer token for operator routes; `None` disables the check
    pub operator_token: Option<String>,
}

impl AppState {
    pub fn new(
        service: LeaderboardService,
        registry: Arc<dyn CommunityRegistry>,
        operator_token: Option<String>,
    ) -> Self {
        Self {
            service,
            registry,
            operator_token,
        }
    }
}

/// Build application router
///
/// Operator routes sit behind [`api::auth_middleware`]; everything else,
/// including `/health`, is open.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post, put};

    let operator = Router::new()
        .route(
            "/api/communities/:community/announcement",
            put(api::set_announcement_destination),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    let public = Router::new()
        .route("/api/communities/:community", post(api::register_community))
        .route(
            "/api/communities/:community/submissions",
            post(api::submit),
        )
        .route(
            "/api/communities/:community/leaderboard",
            get(api::current_leaderboard),
        )
        .route(
            "/api/communities/:community/leaderboard/:year/:month",
            get(api::period_leaderboard),
        )
        .route(
            "/api/communities/:community/winner/:year/:month",
            get(api::period_winner),
        )
        .merge(api::health_routes());

    Router::new()
        .merge(operator)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
