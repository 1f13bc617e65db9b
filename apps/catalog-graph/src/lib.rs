//! HTTP read-through view over the catalog table: `GET /graph` returns row
//! counts per seller and per category.

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod state;

pub use config::Config;
pub use db::CatalogDb;
pub use error::GraphError;
pub use state::AppState;

/// The API router. Cross-origin requests are accepted from any origin.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/graph", get(api::graph))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
