use axum::{extract::State, Json};
use serde::Serialize;
use tracing::info;

use crate::db::GroupCount;
use crate::error::GraphError;
use crate::state::AppState;

/// Body of `GET /graph`.
///
/// The key names are part of the published contract and do not describe
/// their contents: `order_status` holds the per-seller row counts and
/// `refund_status` the per-category row counts.
#[derive(Debug, Serialize)]
pub struct GraphResponse {
    pub order_status: Vec<GroupCount>,
    pub refund_status: Vec<GroupCount>,
}

pub async fn graph(State(state): State<AppState>) -> Result<Json<GraphResponse>, GraphError> {
    metrics::counter!("graph_requests_total").increment(1);
    let order_status = state.db.seller_counts().await?;
    let refund_status = state.db.category_counts().await?;
    info!(
        sellers = order_status.len(),
        categories = refund_status.len(),
        "graph served"
    );
    Ok(Json(GraphResponse { order_status, refund_status }))
}
