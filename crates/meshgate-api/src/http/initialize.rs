//! `POST /initialize`.

use std::sync::Arc;

use axum::{Json, extract::State};
use tracing::info;

use crate::http::errors::ApiError;
use crate::models::InitializeResponse;
use crate::state::ApiState;

pub(crate) async fn initialize(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<InitializeResponse>, ApiError> {
    let request_id = state.workflow.initialize().await?;
    info!(request_id = %request_id, "processor initialised");
    Ok(Json(InitializeResponse::new(request_id)))
}
