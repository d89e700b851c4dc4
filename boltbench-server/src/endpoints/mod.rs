//! Contains all HTTP endpoint handlers.
//!
//! Use [`routes`] to create a router with all endpoints.

use axum::Router;

use crate::state::ServiceState;

mod autoheal;
pub mod health;
mod ops;
mod perf;
mod validate;

/// Creates a router with all endpoints.
pub fn routes() -> Router<ServiceState> {
    let routes_v1 = Router::new()
        .merge(perf::router())
        .merge(validate::router())
        .merge(autoheal::router())
        .merge(ops::router());

    Router::new().merge(health::router()).nest("/v1", routes_v1)
}
