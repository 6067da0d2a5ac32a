//! Request lifecycle controller.
//!
//! # Design
//! - Each request runs in its own task so a dropped connection cannot cancel it half-way.
//! - Stages run strictly in order; the first failure ends the request.
//! - Blocking work (filesystem and processor) runs on the blocking pool.
//! - Finalization always runs once the input is resolved and never changes the result.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use meshgate_core::{
    FailureClass, ImageProcessor, ImageRequest, ImageSource, ImageWorkflow, LifecycleStage,
    OutputFileSet, ProcessedRequest, RequestStatus, WorkflowError, WorkflowResult,
};
use meshgate_fsops::{FsOpsError, FsOpsService, ResolvedInput, Workspace, accept_source};
use meshgate_telemetry::{LifecycleOutcome, Metrics};
use tokio::task::JoinError;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

/// Drives requests from input resolution through packaging.
#[derive(Clone)]
pub struct RequestOrchestrator {
    processor: Arc<dyn ImageProcessor>,
    fsops: FsOpsService,
    metrics: Metrics,
    public_base_url: String,
}

impl RequestOrchestrator {
    /// Construct an orchestrator around a processor and storage facade.
    #[must_use]
    pub fn new(
        processor: Arc<dyn ImageProcessor>,
        fsops: FsOpsService,
        metrics: Metrics,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            processor,
            fsops,
            metrics,
            public_base_url: public_base_url.into(),
        }
    }

    async fn run(
        self,
        request_id: Uuid,
        source: Option<ImageSource>,
    ) -> WorkflowResult<ProcessedRequest> {
        let _in_flight = self.metrics.track_in_flight();
        info!(stage = LifecycleStage::Received.as_str(), "request received");

        let (workspace, mut request) = match self.resolve(request_id, source).await {
            Ok(resolved) => resolved,
            Err(err) => return Err(self.fail(LifecycleStage::Resolving, err)),
        };

        let result = self.execute(&workspace, &request).await;
        request.status = if result.is_ok() {
            RequestStatus::Success
        } else {
            RequestStatus::Failed
        };
        self.finalize(&request).await;

        match result {
            Ok(outputs) => {
                self.metrics.inc_lifecycle_request(LifecycleOutcome::Success);
                let processed = ProcessedRequest {
                    request_id,
                    output_files: outputs,
                    archive_reference: self.fsops.archive_reference(request_id),
                    base_location: format!("{}/output/{request_id}", self.public_base_url),
                };
                info!(
                    stage = LifecycleStage::Succeeded.as_str(),
                    outputs = processed.output_files.len(),
                    archive = %processed.archive_reference,
                    "request completed"
                );
                Ok(processed)
            }
            Err((stage, err)) => Err(self.fail(stage, err)),
        }
    }

    async fn resolve(
        &self,
        request_id: Uuid,
        source: Option<ImageSource>,
    ) -> WorkflowResult<(Workspace, ImageRequest)> {
        info!(stage = LifecycleStage::Resolving.as_str(), "resolving input");
        let fsops = self.fsops.clone();
        let resolved = blocking(move || -> WorkflowResult<(Workspace, ResolvedInput)> {
            let source = accept_source(source)?;
            // Stage before allocating so a staging failure leaves no workspace.
            let input = fsops.materialize(request_id, source).map_err(workspace_error)?;
            match fsops.allocate_for(request_id) {
                Ok(workspace) => Ok((workspace, input)),
                Err(err) => {
                    fsops.discard_transient(&input);
                    Err(workspace_error(err))
                }
            }
        })
        .await
        .map_err(|message| WorkflowError::Processing { message })??;

        let (workspace, input) = resolved;
        self.metrics
            .inc_lifecycle_stage(LifecycleStage::Resolving.as_str(), "completed");
        let request = ImageRequest::new(
            request_id,
            input.path,
            workspace.output_dir.clone(),
            input.origin,
        );
        Ok((workspace, request))
    }

    async fn execute(
        &self,
        workspace: &Workspace,
        request: &ImageRequest,
    ) -> Result<OutputFileSet, (LifecycleStage, WorkflowError)> {
        let outputs = self
            .invoke(request)
            .await
            .map_err(|err| (LifecycleStage::Processing, err))?;
        self.package(workspace, &outputs)
            .await
            .map_err(|err| (LifecycleStage::Packaging, err))?;
        Ok(outputs)
    }

    async fn invoke(&self, request: &ImageRequest) -> WorkflowResult<OutputFileSet> {
        info!(
            stage = LifecycleStage::Processing.as_str(),
            input = %request.input_path.display(),
            "invoking processor"
        );
        let processor = Arc::clone(&self.processor);
        let input_path = request.input_path.clone();
        let output_dir = request.output_dir.clone();
        let started = Instant::now();
        let result = blocking(move || processor.process(&input_path, &output_dir)).await;
        self.metrics.observe_processing_latency(started.elapsed());

        let outputs = result
            .map_err(|message| WorkflowError::Processing { message })?
            .map_err(|err| WorkflowError::Processing {
                message: err.message().to_string(),
            })?;
        self.metrics
            .inc_lifecycle_stage(LifecycleStage::Processing.as_str(), "completed");
        Ok(outputs)
    }

    async fn package(&self, workspace: &Workspace, outputs: &OutputFileSet) -> WorkflowResult<()> {
        info!(stage = LifecycleStage::Packaging.as_str(), "packaging artifacts");
        let fsops = self.fsops.clone();
        let workspace = workspace.clone();
        let outputs = outputs.clone();
        blocking(move || fsops.package(&workspace, &outputs))
            .await
            .map_err(|message| WorkflowError::Processing { message })?
            .map_err(packaging_error)?;
        self.metrics
            .inc_lifecycle_stage(LifecycleStage::Packaging.as_str(), "completed");
        Ok(())
    }

    async fn finalize(&self, request: &ImageRequest) {
        info!(status = request.status.as_str(), "finalizing request");
        if !request.origin.is_transient() {
            return;
        }
        let fsops = self.fsops.clone();
        let input = ResolvedInput {
            path: request.input_path.clone(),
            origin: request.origin,
        };
        if let Err(message) = blocking(move || fsops.discard_transient(&input)).await {
            warn!(error = %message, "transient cleanup task failed");
            self.metrics.inc_transient_cleanup_failure();
        }
    }

    fn fail(&self, stage: LifecycleStage, err: WorkflowError) -> WorkflowError {
        self.metrics.inc_lifecycle_stage(stage.as_str(), "failed");
        match err.class() {
            FailureClass::Input => {
                self.metrics.inc_lifecycle_request(LifecycleOutcome::Rejected);
                warn!(
                    stage = stage.as_str(),
                    error = %err.caller_message(),
                    "request rejected"
                );
            }
            FailureClass::Server => {
                self.metrics.inc_lifecycle_request(LifecycleOutcome::Failed);
                error!(
                    stage = stage.as_str(),
                    error = %err.caller_message(),
                    "request failed"
                );
            }
        }
        info!(stage = LifecycleStage::Failed.as_str(), "request finished");
        err
    }
}

#[async_trait]
impl ImageWorkflow for RequestOrchestrator {
    async fn initialize(&self) -> WorkflowResult<Uuid> {
        let request_id = Uuid::new_v4();
        info!(request_id = %request_id, "processor initialization starting");
        let processor = Arc::clone(&self.processor);
        let outcome = blocking(move || processor.initialize())
            .await
            .and_then(|result| result.map_err(|err| err.message().to_string()));
        match outcome {
            Ok(()) => {
                info!(request_id = %request_id, "processor initialization complete");
                Ok(request_id)
            }
            Err(message) => {
                error!(
                    request_id = %request_id,
                    error = %message,
                    "processor initialization failed"
                );
                Err(WorkflowError::Initialization { message })
            }
        }
    }

    async fn process(&self, source: Option<ImageSource>) -> WorkflowResult<ProcessedRequest> {
        let request_id = Uuid::new_v4();
        // Opened under the caller's span, so HTTP route and request id carry over.
        let span = info_span!("lifecycle", request_id = %request_id);

        let task = tokio::spawn(self.clone().run(request_id, source).instrument(span));
        task.await.map_err(|err| WorkflowError::Processing {
            message: join_message(err),
        })?
    }
}

async fn blocking<T, F>(task: F) -> Result<T, String>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(task).await.map_err(join_message)
}

fn join_message(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "processor panicked".to_string())
}

fn workspace_error(err: FsOpsError) -> WorkflowError {
    WorkflowError::Workspace {
        detail: err.detail(),
        source: Box::new(err),
    }
}

fn packaging_error(err: FsOpsError) -> WorkflowError {
    WorkflowError::Packaging {
        detail: err.detail(),
        source: Box::new(err),
    }
}
