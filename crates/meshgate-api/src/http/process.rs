//! `POST /process`: extract the image source and hand it to the workflow.
//!
//! The image arrives either as a multipart `image` field (a file part is an
//! upload, a text part is a server-side path) or as an urlencoded `image`
//! path. When both an upload and a path are present the upload wins.

use std::sync::Arc;

use axum::{
    Form, Json,
    extract::{FromRequest, Multipart, Request, State, multipart::MultipartError},
    http::{StatusCode, header::CONTENT_TYPE},
};
use meshgate_core::ImageSource;
use serde::Deserialize;
use tracing::warn;

use crate::http::constants::FIELD_IMAGE;
use crate::http::errors::ApiError;
use crate::models::ProcessResponse;
use crate::state::ApiState;

const MULTIPART: &str = "multipart/form-data";
const URLENCODED: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Deserialize)]
struct ImageForm {
    image: Option<String>,
}

pub(crate) async fn process(
    State(state): State<Arc<ApiState>>,
    request: Request,
) -> Result<Json<ProcessResponse>, ApiError> {
    let source = extract_source(request).await?;
    let processed = state.workflow.process(source).await?;
    Ok(Json(ProcessResponse::from(processed)))
}

async fn extract_source(request: Request) -> Result<Option<ImageSource>, ApiError> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with(MULTIPART) {
        let multipart = Multipart::from_request(request, &()).await.map_err(|rejection| {
            warn!(error = %rejection, "rejected multipart request");
            ApiError::bad_request(rejection.body_text())
        })?;
        return read_multipart(multipart).await;
    }
    if content_type.starts_with(URLENCODED) {
        let Form(form) = Form::<ImageForm>::from_request(request, &())
            .await
            .map_err(|rejection| {
                warn!(error = %rejection, "rejected form request");
                ApiError::bad_request(rejection.body_text())
            })?;
        return Ok(form.image.map(ImageSource::reference));
    }
    Ok(None)
}

async fn read_multipart(mut multipart: Multipart) -> Result<Option<ImageSource>, ApiError> {
    let mut upload = None;
    let mut reference = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FIELD_IMAGE) {
            continue;
        }
        if let Some(filename) = field.file_name().map(str::to_string) {
            let payload = field.bytes().await.map_err(multipart_error)?;
            upload.get_or_insert_with(|| ImageSource::upload(filename, payload));
        } else {
            let path = field.text().await.map_err(multipart_error)?;
            reference.get_or_insert_with(|| ImageSource::reference(path));
        }
    }
    Ok(upload.or(reference))
}

fn multipart_error(err: MultipartError) -> ApiError {
    warn!(error = %err, "malformed multipart body");
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large(err.body_text())
    } else {
        ApiError::bad_request(err.body_text())
    }
}
