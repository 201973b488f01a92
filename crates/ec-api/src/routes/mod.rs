//! Route modules.

pub mod ability;
pub mod bank;
pub mod forecast;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// All routes merged into one router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(ability::routes())
        .merge(forecast::routes())
        .merge(bank::routes())
}
