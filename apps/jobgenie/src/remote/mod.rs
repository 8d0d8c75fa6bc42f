//! Remote service client: the single point of entry for every call to the
//! resume analysis and generation service.
//!
//! The controller only sees the `ResumeService` trait; `HttpResumeService`
//! is the production implementation over `reqwest`. Timeouts and
//! cancellation are applied by the caller through `budget::within_budget`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client, Response};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::models::ResumeFile;

pub mod budget;

pub use budget::within_budget;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Longest slice of a failing response body kept in an error.
const BODY_PREVIEW_CHARS: usize = 500;

/// Which remote call failed. Doubles as the tag for operation-specific
/// errors (upload, analysis, question generation, resume generation).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Upload,
    Analyze,
    GenerateQuestions,
    GenerateResume,
    FetchResume,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Operation::Upload => "upload",
            Operation::Analyze => "analysis",
            Operation::GenerateQuestions => "question generation",
            Operation::GenerateResume => "resume generation",
            Operation::FetchResume => "resume fetch",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Connectivity failure or a body that could not be read.
    #[error("{operation} transport error: {source}")]
    Transport {
        operation: Operation,
        #[source]
        source: reqwest::Error,
    },

    #[error("{operation} failed with status {status}: {body}")]
    Status {
        operation: Operation,
        status: u16,
        body: String,
    },

    /// 2xx response whose JSON body carries an `error` field.
    #[error("{operation} rejected by server: {message}")]
    ServerReported { operation: Operation, message: String },

    #[error("{operation} returned a malformed response: {reason}")]
    Malformed { operation: Operation, reason: String },

    #[error("{operation} timed out after {}s", .budget.as_secs())]
    Timeout {
        operation: Operation,
        budget: Duration,
    },

    #[error("{operation} was cancelled")]
    Cancelled { operation: Operation },
}

impl ServiceError {
    pub fn operation(&self) -> Operation {
        match self {
            ServiceError::Transport { operation, .. }
            | ServiceError::Status { operation, .. }
            | ServiceError::ServerReported { operation, .. }
            | ServiceError::Malformed { operation, .. }
            | ServiceError::Timeout { operation, .. }
            | ServiceError::Cancelled { operation } => *operation,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Short description for the notice banner.
    pub fn user_detail(&self) -> String {
        match self {
            ServiceError::Transport { .. } => "Network error - please check your connection".to_string(),
            ServiceError::Status { status, .. } => match status {
                401 => "Unauthorized - check your API keys".to_string(),
                403 => "Forbidden - insufficient permissions".to_string(),
                404 => "Resource not found".to_string(),
                500..=599 => "Server error - please try again later".to_string(),
                other => format!("Request failed with status {other}"),
            },
            ServiceError::ServerReported { message, .. } => message.clone(),
            ServiceError::Malformed { reason, .. } => format!("Invalid response ({reason})"),
            ServiceError::Timeout { budget, .. } => {
                format!("No response within {}s", budget.as_secs())
            }
            ServiceError::Cancelled { .. } => "Request was cancelled".to_string(),
        }
    }
}

/// Body of the analysis call.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeRequest {
    pub resume_base64: String,
    pub s3_bucket: String,
    pub s3_key: String,
    pub num_jobs: u32,
    pub query: String,
}

#[derive(Debug, Serialize)]
struct QuestionsRequest<'a> {
    action: &'a str,
    missing_skills: &'a [String],
    job_title: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerateResumeRequest<'a> {
    action: &'a str,
    resume_key: &'a str,
    job_title: &'a str,
    additional_skills: &'a str,
}

/// The remote collaborator as seen by the controller.
#[async_trait]
pub trait ResumeService: Send + Sync {
    /// Stores the resume under `key` in `bucket`. Returns the service's ack as-is.
    async fn upload(&self, file: &ResumeFile, bucket: &str, key: &str)
        -> Result<Value, ServiceError>;

    /// Returns raw job objects; normalization is the caller's concern.
    async fn analyze_resume(&self, request: &AnalyzeRequest) -> Result<Vec<Value>, ServiceError>;

    async fn generate_questions(
        &self,
        missing_skills: &[String],
        job_title: &str,
    ) -> Result<Vec<String>, ServiceError>;

    /// Returns the URL of the generated resume.
    async fn generate_resume(
        &self,
        storage_key: &str,
        job_title: &str,
        answers_text: &str,
    ) -> Result<String, ServiceError>;

    async fn fetch_resume_text(&self, url: &str) -> Result<String, ServiceError>;
}

/// `ResumeService` over HTTP.
#[derive(Clone)]
pub struct HttpResumeService {
    client: Client,
    api_endpoint: String,
    upload_endpoint: String,
}

impl HttpResumeService {
    pub fn new(api_endpoint: String, upload_endpoint: String) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("jobgenie/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            api_endpoint: api_endpoint.trim_end_matches('/').to_string(),
            upload_endpoint,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_endpoint, path)
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        operation: Operation,
        path: &str,
        body: &B,
    ) -> Result<Value, ServiceError> {
        let response = self
            .client
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await
            .map_err(|source| ServiceError::Transport { operation, source })?;

        read_json(operation, response).await
    }
}

#[async_trait]
impl ResumeService for HttpResumeService {
    async fn upload(
        &self,
        file: &ResumeFile,
        bucket: &str,
        key: &str,
    ) -> Result<Value, ServiceError> {
        let operation = Operation::Upload;
        let part = multipart::Part::bytes(file.bytes.to_vec())
            .file_name(file.name.clone())
            .mime_str("application/pdf")
            .map_err(|source| ServiceError::Transport { operation, source })?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("bucket", bucket.to_string())
            .text("key", key.to_string());

        let response = self
            .client
            .post(&self.upload_endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|source| ServiceError::Transport { operation, source })?;

        let status = response.status();
        let body = read_body(operation, response).await?;
        if !status.is_success() {
            return Err(ServiceError::Status {
                operation,
                status: status.as_u16(),
                body: preview(&body),
            });
        }

        debug!(key, bytes = file.size(), "resume uploaded");
        // The ack format is up to the storage service; keep non-JSON bodies as text.
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }

    async fn analyze_resume(&self, request: &AnalyzeRequest) -> Result<Vec<Value>, ServiceError> {
        let operation = Operation::Analyze;
        let value = self.post_json(operation, "process_resume", request).await?;

        let jobs = match value {
            Value::Array(jobs) => jobs,
            Value::Object(mut body) => match body.remove("jobs") {
                Some(Value::Array(jobs)) => jobs,
                _ => {
                    return Err(ServiceError::Malformed {
                        operation,
                        reason: "expected a `jobs` array".to_string(),
                    })
                }
            },
            other => {
                return Err(ServiceError::Malformed {
                    operation,
                    reason: format!("expected an array or object, got {}", json_kind(&other)),
                })
            }
        };

        debug!(count = jobs.len(), query = %request.query, "analysis returned jobs");
        Ok(jobs)
    }

    async fn generate_questions(
        &self,
        missing_skills: &[String],
        job_title: &str,
    ) -> Result<Vec<String>, ServiceError> {
        let operation = Operation::GenerateQuestions;
        let body = QuestionsRequest {
            action: "generate_questions",
            missing_skills,
            job_title,
        };
        let mut value = self.post_json(operation, "generate_resume", &body).await?;

        let questions = value
            .get_mut("questions")
            .map(Value::take)
            .ok_or_else(|| ServiceError::Malformed {
                operation,
                reason: "missing `questions`".to_string(),
            })?;

        serde_json::from_value::<Vec<String>>(questions).map_err(|e| ServiceError::Malformed {
            operation,
            reason: format!("`questions` is not a list of strings: {e}"),
        })
    }

    async fn generate_resume(
        &self,
        storage_key: &str,
        job_title: &str,
        answers_text: &str,
    ) -> Result<String, ServiceError> {
        let operation = Operation::GenerateResume;
        let body = GenerateResumeRequest {
            action: "generate_resume",
            resume_key: storage_key,
            job_title,
            additional_skills: answers_text,
        };
        let value = self.post_json(operation, "generate_resume", &body).await?;

        value
            .get("generated_resume_url")
            .and_then(Value::as_str)
            .filter(|url| !url.trim().is_empty())
            .map(str::to_string)
            .ok_or_else(|| ServiceError::Malformed {
                operation,
                reason: "no resume URL returned".to_string(),
            })
    }

    async fn fetch_resume_text(&self, url: &str) -> Result<String, ServiceError> {
        let operation = Operation::FetchResume;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| ServiceError::Transport { operation, source })?;

        let status = response.status();
        let body = read_body(operation, response).await?;
        if !status.is_success() {
            return Err(ServiceError::Status {
                operation,
                status: status.as_u16(),
                body: preview(&body),
            });
        }
        Ok(body)
    }
}

async fn read_body(operation: Operation, response: Response) -> Result<String, ServiceError> {
    response
        .text()
        .await
        .map_err(|source| ServiceError::Transport { operation, source })
}

/// Reads a JSON response, mapping non-2xx statuses, unparsable bodies and
/// `{ "error": ... }` payloads to their typed errors.
async fn read_json(operation: Operation, response: Response) -> Result<Value, ServiceError> {
    let status = response.status();
    let body = read_body(operation, response).await?;

    if !status.is_success() {
        return Err(ServiceError::Status {
            operation,
            status: status.as_u16(),
            body: preview(&body),
        });
    }

    let value: Value = serde_json::from_str(&body).map_err(|e| ServiceError::Malformed {
        operation,
        reason: format!("invalid JSON ({e}): {}", preview(&body)),
    })?;

    if let Some(error) = value.get("error").filter(|e| !e.is_null()) {
        let message = error
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(ServiceError::ServerReported { operation, message });
    }

    Ok(value)
}

fn preview(body: &str) -> String {
    if body.chars().count() <= BODY_PREVIEW_CHARS {
        return body.to_string();
    }
    let mut cut: String = body.chars().take(BODY_PREVIEW_CHARS).collect();
    cut.push('…');
    cut
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
