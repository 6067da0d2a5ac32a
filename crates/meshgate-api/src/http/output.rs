//! `GET /output/{request_id}/{filename}`: serve one artifact from a workspace.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use meshgate_fsops::archive::is_plain_file_name;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use uuid::Uuid;

use crate::http::errors::ApiError;
use crate::state::ApiState;

const NOT_FOUND: &str = "File not found";

pub(crate) async fn serve_output(
    State(state): State<Arc<ApiState>>,
    Path((request_id, filename)): Path<(String, String)>,
    request: Request,
) -> Response {
    // Only a UUID directory and a single path component can ever resolve.
    let Ok(request_id) = Uuid::parse_str(&request_id) else {
        return ApiError::not_found(NOT_FOUND).into_response();
    };
    if !is_plain_file_name(&filename) {
        return ApiError::not_found(NOT_FOUND).into_response();
    }

    let path = state
        .output_root
        .join(request_id.to_string())
        .join(&filename);
    let Ok(response) = ServeFile::new(path).oneshot(request).await;
    if response.status() == StatusCode::NOT_FOUND {
        return ApiError::not_found(NOT_FOUND).into_response();
    }
    response.map(Body::new)
}
