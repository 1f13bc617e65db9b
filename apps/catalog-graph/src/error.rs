use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("database connection failed: {0}")]
    Connection(#[source] sqlx::Error),
    #[error("aggregation query failed: {0}")]
    Query(#[source] sqlx::Error),
}

// Failures surface as a bare 500; the cause only goes to the log.
impl IntoResponse for GraphError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "graph request failed");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}
