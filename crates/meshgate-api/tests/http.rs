use std::fs;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header::CONTENT_TYPE},
    response::Response,
};
use meshgate_api::{ApiServer, ApiSettings};
use meshgate_core::{
    ImageSource, ImageWorkflow, InputError, ProcessedRequest, WorkflowError, WorkflowResult,
};
use meshgate_telemetry::Metrics;
use meshgate_test_support::fixtures::TempStorage;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

const BOUNDARY: &str = "meshgate-boundary";
const REQUEST_ID: Uuid = Uuid::from_u128(0x5f2b_9a4c_1d3e_4f60_8a7b_6c5d_4e3f_2a1b);

#[derive(Default)]
struct StubWorkflow {
    seen: Mutex<Vec<Option<ImageSource>>>,
    failure: Option<fn() -> WorkflowError>,
}

impl StubWorkflow {
    fn failing(failure: fn() -> WorkflowError) -> Self {
        Self {
            seen: Mutex::default(),
            failure: Some(failure),
        }
    }

    fn seen(&self) -> Vec<Option<ImageSource>> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ImageWorkflow for StubWorkflow {
    async fn initialize(&self) -> WorkflowResult<Uuid> {
        match self.failure {
            Some(failure) => Err(failure()),
            None => Ok(REQUEST_ID),
        }
    }

    async fn process(&self, source: Option<ImageSource>) -> WorkflowResult<ProcessedRequest> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(source.clone());
        if let Some(failure) = self.failure {
            return Err(failure());
        }
        if source.is_none() {
            return Err(InputError::NoImageProvided.into());
        }
        Ok(ProcessedRequest {
            request_id: REQUEST_ID,
            output_files: [("mesh", "cat_mesh.glb"), ("video", "cat.mp4")]
                .into_iter()
                .collect(),
            archive_reference: format!("{REQUEST_ID}/outputs.zip"),
            base_location: format!("http://localhost:5000/output/{REQUEST_ID}"),
        })
    }
}

fn router(storage: &TempStorage, workflow: Arc<StubWorkflow>, metrics: &Metrics) -> Router {
    ApiServer::new(
        workflow,
        metrics.clone(),
        ApiSettings {
            output_root: storage.output_root().to_path_buf(),
            max_upload_bytes: 1024 * 1024,
        },
    )
    .into_router()
}

enum Part<'a> {
    File {
        name: &'a str,
        filename: &'a str,
        data: &'a [u8],
    },
    Text {
        name: &'a str,
        value: &'a str,
    },
}

fn multipart(parts: &[Part<'_>]) -> Result<Request<Body>> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::File {
                name,
                filename,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}")
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Ok(Request::builder()
        .method(Method::POST)
        .uri("/process")
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))?)
}

async fn json_body(response: Response) -> Result<Value> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn get(uri: &str) -> Result<Request<Body>> {
    Ok(Request::builder().uri(uri).body(Body::empty())?)
}

#[tokio::test]
async fn uploaded_image_is_processed() -> Result<()> {
    let storage = TempStorage::new()?;
    let workflow = Arc::new(StubWorkflow::default());
    let app = router(&storage, Arc::clone(&workflow), &Metrics::new()?);

    let response = app
        .oneshot(multipart(&[Part::File {
            name: "image",
            filename: "cat.webp",
            data: b"RIFF-webp",
        }])?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await?;
    assert_eq!(body["status"], "success");
    assert_eq!(body["request_id"], REQUEST_ID.to_string());
    assert_eq!(body["output_files"]["mesh"], "cat_mesh.glb");
    assert_eq!(body["zip_file"], format!("{REQUEST_ID}/outputs.zip"));
    assert_eq!(
        body["base_url"],
        format!("http://localhost:5000/output/{REQUEST_ID}")
    );
    assert_eq!(
        workflow.seen(),
        vec![Some(ImageSource::upload("cat.webp", &b"RIFF-webp"[..]))]
    );
    Ok(())
}

#[tokio::test]
async fn upload_wins_over_path_in_the_same_request() -> Result<()> {
    let storage = TempStorage::new()?;
    let workflow = Arc::new(StubWorkflow::default());
    let app = router(&storage, Arc::clone(&workflow), &Metrics::new()?);

    let response = app
        .oneshot(multipart(&[
            Part::Text {
                name: "image",
                value: "/srv/library/dog.png",
            },
            Part::Text {
                name: "caption",
                value: "ignored",
            },
            Part::File {
                name: "image",
                filename: "cat.png",
                data: b"png",
            },
        ])?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        workflow.seen(),
        vec![Some(ImageSource::upload("cat.png", &b"png"[..]))]
    );
    Ok(())
}

#[tokio::test]
async fn file_part_without_a_filename_reaches_the_workflow_as_empty_upload() -> Result<()> {
    let storage = TempStorage::new()?;
    let workflow = Arc::new(StubWorkflow::failing(|| {
        WorkflowError::from(InputError::EmptyFilename)
    }));
    let app = router(&storage, Arc::clone(&workflow), &Metrics::new()?);

    let response = app
        .oneshot(multipart(&[Part::File {
            name: "image",
            filename: "",
            data: b"",
        }])?)
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await?["error"], "No selected file");
    assert_eq!(workflow.seen(), vec![Some(ImageSource::upload("", &b""[..]))]);
    Ok(())
}

#[tokio::test]
async fn text_part_and_urlencoded_form_are_path_references() -> Result<()> {
    let storage = TempStorage::new()?;
    let workflow = Arc::new(StubWorkflow::default());
    let metrics = Metrics::new()?;

    let response = router(&storage, Arc::clone(&workflow), &metrics)
        .oneshot(multipart(&[Part::Text {
            name: "image",
            value: "/srv/library/dog.png",
        }])?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let form = Request::builder()
        .method(Method::POST)
        .uri("/process")
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("image=%2Fsrv%2Flibrary%2Fbird.jpg"))?;
    let response = router(&storage, Arc::clone(&workflow), &metrics)
        .oneshot(form)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(
        workflow.seen(),
        vec![
            Some(ImageSource::reference("/srv/library/dog.png")),
            Some(ImageSource::reference("/srv/library/bird.jpg")),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn missing_image_is_a_bad_request() -> Result<()> {
    let storage = TempStorage::new()?;
    let workflow = Arc::new(StubWorkflow::default());
    let app = router(&storage, Arc::clone(&workflow), &Metrics::new()?);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/process")
        .body(Body::empty())?;
    let response = app.oneshot(request).await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await?["error"], "No image provided");
    assert_eq!(workflow.seen(), vec![None]);
    Ok(())
}

#[tokio::test]
async fn malformed_multipart_is_rejected_before_the_workflow() -> Result<()> {
    let storage = TempStorage::new()?;
    let workflow = Arc::new(StubWorkflow::default());
    let app = router(&storage, Arc::clone(&workflow), &Metrics::new()?);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/process")
        .header(CONTENT_TYPE, "multipart/form-data")
        .body(Body::from("not multipart"))?;
    let response = app.oneshot(request).await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await?["error"].is_string());
    assert!(workflow.seen().is_empty());
    Ok(())
}

#[tokio::test]
async fn server_failures_surface_as_internal_errors() -> Result<()> {
    let storage = TempStorage::new()?;
    let workflow = Arc::new(StubWorkflow::failing(|| WorkflowError::Processing {
        message: "CUDA out of memory".to_string(),
    }));
    let app = router(&storage, workflow, &Metrics::new()?);

    let response = app
        .oneshot(multipart(&[Part::File {
            name: "image",
            filename: "cat.png",
            data: b"png",
        }])?)
        .await?;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await?["error"], "CUDA out of memory");
    Ok(())
}

#[tokio::test]
async fn initialize_reports_a_request_id() -> Result<()> {
    let storage = TempStorage::new()?;
    let request = || {
        Request::builder()
            .method(Method::POST)
            .uri("/initialize")
            .body(Body::empty())
    };

    let ok = router(&storage, Arc::new(StubWorkflow::default()), &Metrics::new()?)
        .oneshot(request()?)
        .await?;
    assert_eq!(ok.status(), StatusCode::OK);
    let body = json_body(ok).await?;
    assert_eq!(body["status"], "success");
    assert_eq!(body["request_id"], REQUEST_ID.to_string());

    let failing = Arc::new(StubWorkflow::failing(|| WorkflowError::Initialization {
        message: "weights missing".to_string(),
    }));
    let err = router(&storage, failing, &Metrics::new()?)
        .oneshot(request()?)
        .await?;
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(err).await?["error"], "weights missing");
    Ok(())
}

#[tokio::test]
async fn output_files_are_served_from_the_workspace() -> Result<()> {
    let storage = TempStorage::new()?;
    let workspace = storage.output_root().join(REQUEST_ID.to_string());
    fs::create_dir_all(&workspace)?;
    fs::write(workspace.join("cat_mesh.glb"), b"glTF")?;
    let app = router(&storage, Arc::new(StubWorkflow::default()), &Metrics::new()?);

    let response = app
        .clone()
        .oneshot(get(&format!("/output/{REQUEST_ID}/cat_mesh.glb"))?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    assert_eq!(&bytes[..], b"glTF");

    let missing = app
        .oneshot(get(&format!("/output/{REQUEST_ID}/absent.glb"))?)
        .await?;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(missing).await?["error"], "File not found");
    Ok(())
}

#[tokio::test]
async fn output_paths_outside_a_workspace_are_not_found() -> Result<()> {
    let storage = TempStorage::new()?;
    fs::write(storage.output_root().join("secret.txt"), b"hidden")?;
    let app = router(&storage, Arc::new(StubWorkflow::default()), &Metrics::new()?);

    for uri in [
        "/output/not-a-uuid/secret.txt".to_string(),
        format!("/output/{REQUEST_ID}/..%2Fsecret.txt"),
        format!("/output/{REQUEST_ID}/.."),
    ] {
        let response = app.clone().oneshot(get(&uri)?).await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }
    Ok(())
}

#[tokio::test]
async fn health_and_metrics_reflect_traffic() -> Result<()> {
    let storage = TempStorage::new()?;
    let metrics = Metrics::new()?;
    let app = router(&storage, Arc::new(StubWorkflow::default()), &metrics);

    let health = app.clone().oneshot(get("/health")?).await?;
    assert_eq!(health.status(), StatusCode::OK);
    assert!(health.headers().contains_key("x-request-id"));
    let body = json_body(health).await?;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["in_flight"], 0);

    let rendered = app.oneshot(get("/metrics")?).await?;
    assert_eq!(rendered.status(), StatusCode::OK);
    let text = String::from_utf8(to_bytes(rendered.into_body(), usize::MAX).await?.to_vec())?;
    assert!(text.lines().any(|line| {
        line.starts_with("http_requests_total{")
            && line.contains(r#"route="/health""#)
            && line.contains(r#"code="200""#)
            && line.ends_with(" 1")
    }));
    Ok(())
}

#[tokio::test]
async fn request_counts_use_the_route_template() -> Result<()> {
    let storage = TempStorage::new()?;
    let metrics = Metrics::new()?;
    let app = router(&storage, Arc::new(StubWorkflow::default()), &metrics);

    for name in ["a.glb", "b.glb"] {
        let response = app
            .clone()
            .oneshot(get(&format!("/output/{REQUEST_ID}/{name}"))?)
            .await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    let text = metrics.render()?;
    assert!(text.lines().any(|line| {
        line.starts_with("http_requests_total{")
            && line.contains(r#"route="/output/{request_id}/{filename}""#)
            && line.contains(r#"code="404""#)
            && line.ends_with(" 2")
    }));
    assert!(!text.contains(&REQUEST_ID.to_string()));
    Ok(())
}
