use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{multipart, Client};
use shared::{
    domain::CvFile,
    protocol::{list_items, AnalyzeCvResponse, ErrorBody},
};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

/// Default origin of the analysis service.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

/// Fallback message when the service rejects an upload without a usable
/// `error` field in the response body.
pub const SERVICE_ERROR_FALLBACK: &str = "Failed to analyze CV";

/// Fallback message for transport-level failures that carry no message of
/// their own, and for success responses whose body cannot be decoded.
pub const TRANSPORT_ERROR_FALLBACK: &str = "Something went wrong";

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Terminal failure of one analysis attempt. Both variants carry the
/// human-readable message the workflow surfaces to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalyzeError {
    /// The service answered with a non-success status.
    #[error("{0}")]
    Service(String),
    /// The request never completed, or the success body was undecodable.
    #[error("{0}")]
    Transport(String),
}

impl AnalyzeError {
    pub fn message(&self) -> &str {
        match self {
            Self::Service(message) | Self::Transport(message) => message,
        }
    }

    fn from_transport(err: reqwest::Error) -> Self {
        let message = err.to_string();
        if message.is_empty() {
            Self::Transport(TRANSPORT_ERROR_FALLBACK.to_string())
        } else {
            Self::Transport(message)
        }
    }
}

/// Seam between the workflow controller and the analysis service, so the
/// controller's transition logic stays testable without a network.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn analyze(&self, file: &CvFile) -> Result<AnalyzeCvResponse, AnalyzeError>;
}

/// Real backend: one `POST {server_url}/analyze-cv` multipart request per
/// invocation, no retries. A timeout is only enforced when configured.
pub struct HttpAnalysisBackend {
    http: Client,
    server_url: String,
    timeout: Option<Duration>,
}

impl HttpAnalysisBackend {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            server_url: server_url.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl AnalysisBackend for HttpAnalysisBackend {
    async fn analyze(&self, file: &CvFile) -> Result<AnalyzeCvResponse, AnalyzeError> {
        let part = multipart::Part::bytes(file.bytes.clone()).file_name(file.name.clone());
        let form = multipart::Form::new().part("file", part);

        let mut request = self
            .http
            .post(format!("{}/analyze-cv", self.server_url))
            .multipart(form);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(AnalyzeError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body: ErrorBody = response.json().await.unwrap_or_default();
            let message = body
                .error
                .unwrap_or_else(|| SERVICE_ERROR_FALLBACK.to_string());
            warn!(status = %status, error = %message, "analysis service rejected cv");
            return Err(AnalyzeError::Service(message));
        }

        response.json::<AnalyzeCvResponse>().await.map_err(|err| {
            warn!(error = %err, "analysis service returned an undecodable success body");
            AnalyzeError::Transport(TRANSPORT_ERROR_FALLBACK.to_string())
        })
    }
}

/// Exclusive workflow state. `Analyzing` doubles as the in-flight guard:
/// while it holds, no second request can start and no mutation is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    Ready,
    Analyzing,
    Succeeded,
    Failed,
}

/// Result of one completed analysis, owned by the controller until reset.
/// `skills_text`/`feedback_text` keep the service's newline-delimited blobs
/// verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub file_name: String,
    pub candidate_name: Option<String>,
    pub summary: String,
    pub skills_text: String,
    pub feedback_text: String,
}

impl AnalysisReport {
    pub fn skill_items(&self) -> Vec<String> {
        list_items(&self.skills_text)
    }

    pub fn feedback_items(&self) -> Vec<String> {
        list_items(&self.feedback_text)
    }

    /// Candidate name, or the placeholder the dashboard shows when the
    /// service could not extract one.
    pub fn candidate_display(&self) -> &str {
        self.candidate_name.as_deref().unwrap_or("Extracted")
    }
}

impl From<AnalyzeCvResponse> for AnalysisReport {
    fn from(response: AnalyzeCvResponse) -> Self {
        Self {
            file_name: response.filename,
            candidate_name: response.candidate_name,
            summary: response.analysis.summary,
            skills_text: response.analysis.skills,
            feedback_text: response.analysis.feedback,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub name: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReviewEvent {
    FileSelected(FileSummary),
    FileRemoved,
    AnalysisStarted { file_name: String },
    AnalysisSucceeded(AnalysisReport),
    AnalysisFailed { message: String },
    WorkflowReset,
}

/// Point-in-time copy of the controller state for polling observers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewSnapshot {
    pub workflow: WorkflowState,
    pub file: Option<FileSummary>,
    pub report: Option<AnalysisReport>,
    pub error: Option<String>,
}

#[derive(Default)]
struct ReviewState {
    workflow: WorkflowState,
    file: Option<CvFile>,
    report: Option<AnalysisReport>,
    error: Option<String>,
}

/// Single source of truth for the upload-and-analysis workflow: holds the
/// selected file, drives `Idle → Ready → Analyzing → Succeeded/Failed`, and
/// never lets two requests overlap on one controller instance.
pub struct ReviewController {
    backend: Arc<dyn AnalysisBackend>,
    inner: Mutex<ReviewState>,
    events: broadcast::Sender<ReviewEvent>,
}

impl ReviewController {
    pub fn new(backend: Arc<dyn AnalysisBackend>) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            backend,
            inner: Mutex::new(ReviewState::default()),
            events,
        })
    }

    pub fn with_http_backend(server_url: impl Into<String>) -> Arc<Self> {
        Self::new(Arc::new(HttpAnalysisBackend::new(server_url)))
    }

    /// Accepts a `.pdf`/`.docx` file (case-insensitive) and moves to `Ready`.
    /// Unsupported names are dropped without touching state, matching the
    /// upload surface this replaces. Selecting after a result starts a fresh
    /// cycle; selections while a request is in flight are ignored. Returns
    /// whether the file was taken.
    pub async fn select_file(&self, file: CvFile) -> bool {
        if !file.has_supported_extension() {
            info!(file = %file.name, "ignoring file with unsupported extension");
            return false;
        }

        let summary = {
            let mut inner = self.inner.lock().await;
            if inner.workflow == WorkflowState::Analyzing {
                return false;
            }
            let summary = FileSummary {
                name: file.name.clone(),
                size_bytes: file.size_bytes(),
            };
            inner.file = Some(file);
            inner.report = None;
            inner.error = None;
            inner.workflow = WorkflowState::Ready;
            summary
        };

        let _ = self.events.send(ReviewEvent::FileSelected(summary));
        true
    }

    /// Clears the selected file. Only meaningful from `Ready`.
    pub async fn remove_file(&self) -> bool {
        {
            let mut inner = self.inner.lock().await;
            if inner.workflow != WorkflowState::Ready {
                return false;
            }
            inner.file = None;
            inner.workflow = WorkflowState::Idle;
        }

        let _ = self.events.send(ReviewEvent::FileRemoved);
        true
    }

    /// Dispatches the selected file to the analysis backend. Accepted from
    /// `Ready`, and from `Failed` since the file survives a failed attempt.
    /// A no-op while a request is already outstanding, so redundant calls
    /// during the in-flight window cost nothing and send nothing. Returns
    /// whether a request was dispatched.
    pub async fn submit(&self) -> bool {
        let file = {
            let mut inner = self.inner.lock().await;
            match inner.workflow {
                WorkflowState::Ready | WorkflowState::Failed => {}
                _ => return false,
            }
            let Some(file) = inner.file.clone() else {
                return false;
            };
            inner.workflow = WorkflowState::Analyzing;
            inner.error = None;
            file
        };

        let _ = self.events.send(ReviewEvent::AnalysisStarted {
            file_name: file.name.clone(),
        });
        info!(file = %file.name, size_bytes = file.size_bytes(), "submitting cv for analysis");

        // The lock is not held across this await; `Analyzing` alone keeps
        // other operations out until the request resolves.
        let outcome = self.backend.analyze(&file).await;

        let mut inner = self.inner.lock().await;
        match outcome {
            Ok(response) => {
                let report = AnalysisReport::from(response);
                inner.workflow = WorkflowState::Succeeded;
                inner.report = Some(report.clone());
                drop(inner);
                info!(file = %report.file_name, "cv analysis succeeded");
                let _ = self.events.send(ReviewEvent::AnalysisSucceeded(report));
            }
            Err(err) => {
                let message = err.message().to_string();
                inner.workflow = WorkflowState::Failed;
                inner.error = Some(message.clone());
                drop(inner);
                warn!(error = %message, "cv analysis failed");
                let _ = self.events.send(ReviewEvent::AnalysisFailed { message });
            }
        }
        true
    }

    /// Discards the report or error along with the selected file, returning
    /// to `Idle`. Only valid once a terminal state has been reached.
    pub async fn reset(&self) -> bool {
        {
            let mut inner = self.inner.lock().await;
            match inner.workflow {
                WorkflowState::Succeeded | WorkflowState::Failed => {}
                _ => return false,
            }
            *inner = ReviewState::default();
        }

        let _ = self.events.send(ReviewEvent::WorkflowReset);
        true
    }

    pub async fn snapshot(&self) -> ReviewSnapshot {
        let inner = self.inner.lock().await;
        ReviewSnapshot {
            workflow: inner.workflow,
            file: inner.file.as_ref().map(|file| FileSummary {
                name: file.name.clone(),
                size_bytes: file.size_bytes(),
            }),
            report: inner.report.clone(),
            error: inner.error.clone(),
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ReviewEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
