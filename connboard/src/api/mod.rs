//! HTTP API handlers for connboard

pub mod auth;
pub mod communities;
pub mod error;
pub mod health;
pub mod leaderboard;
pub mod submissions;

pub use auth::auth_middleware;
pub use communities::{register_community, set_announcement_destination};
pub use error::ApiError;
pub use health::health_routes;
pub use leaderboard::{current_leaderboard, period_leaderboard, period_winner};
pub use submissions::submit;
