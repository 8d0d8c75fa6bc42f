//! A scripted `ResumeService` for driving the controller without a network.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{json, Value};

use crate::config::Timeouts;
use crate::controller::{Controller, ControllerSettings};
use crate::models::ResumeFile;
use crate::remote::{AnalyzeRequest, Operation, ResumeService, ServiceError};

pub const MIB: usize = 1024 * 1024;

/// How a fake call responds.
#[derive(Debug, Clone)]
pub enum Reply<T> {
    Ok(T),
    Fail,
    /// Never completes.
    Hang,
}

#[derive(Debug, Clone)]
pub struct FakeService {
    pub upload: Reply<()>,
    pub jobs: Reply<Vec<Value>>,
    pub questions: Reply<Vec<String>>,
    pub resume_url: Reply<String>,
    pub resume_text: String,
    pub(crate) calls: Arc<Mutex<Vec<String>>>,
}

impl Default for FakeService {
    fn default() -> Self {
        Self {
            upload: Reply::Ok(()),
            jobs: Reply::Ok(vec![backend_engineer_job()]),
            questions: Reply::Fail,
            resume_url: Reply::Ok("https://files.example/tailored.txt".to_string()),
            resume_text: "JANE DOE\nBackend Engineer".to_string(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl FakeService {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }

    async fn reply<T: Clone>(reply: &Reply<T>, operation: Operation) -> Result<T, ServiceError> {
        match reply {
            Reply::Ok(value) => Ok(value.clone()),
            Reply::Fail => Err(ServiceError::Status {
                operation,
                status: 500,
                body: "boom".to_string(),
            }),
            Reply::Hang => std::future::pending().await,
        }
    }
}

#[async_trait]
impl ResumeService for FakeService {
    async fn upload(
        &self,
        file: &ResumeFile,
        bucket: &str,
        key: &str,
    ) -> Result<Value, ServiceError> {
        self.record(format!("upload:{bucket}:{key}:{}", file.name));
        Self::reply(&self.upload, Operation::Upload).await?;
        Ok(json!({"ok": true}))
    }

    async fn analyze_resume(&self, request: &AnalyzeRequest) -> Result<Vec<Value>, ServiceError> {
        self.record(format!("analyze:{}:{}", request.s3_key, request.query));
        Self::reply(&self.jobs, Operation::Analyze).await
    }

    async fn generate_questions(
        &self,
        missing_skills: &[String],
        job_title: &str,
    ) -> Result<Vec<String>, ServiceError> {
        self.record(format!("questions:{job_title}:{}", missing_skills.join(",")));
        Self::reply(&self.questions, Operation::GenerateQuestions).await
    }

    async fn generate_resume(
        &self,
        storage_key: &str,
        job_title: &str,
        answers_text: &str,
    ) -> Result<String, ServiceError> {
        self.record(format!("generate:{storage_key}:{job_title}:{answers_text}"));
        Self::reply(&self.resume_url, Operation::GenerateResume).await
    }

    async fn fetch_resume_text(&self, url: &str) -> Result<String, ServiceError> {
        self.record(format!("fetch:{url}"));
        Ok(self.resume_text.clone())
    }
}

pub fn backend_engineer_job() -> Value {
    json!({
        "job_title": "Backend Engineer",
        "company": "Acme",
        "compatibility_score": 82,
        "common_skills": ["Go"],
        "missing_skills": ["Kubernetes"],
        "summary": "Good fit"
    })
}

pub fn pdf(name: &str, size: usize) -> ResumeFile {
    ResumeFile::new(name, Bytes::from(vec![b'%'; size]))
}

pub fn settings() -> ControllerSettings {
    ControllerSettings {
        bucket: "jobgenie-test".to_string(),
        num_jobs: 5,
        timeouts: Timeouts {
            analyze: Duration::from_secs(30),
            questions: Duration::from_secs(15),
            generate: Duration::from_secs(25),
        },
    }
}

pub fn controller(fake: &FakeService) -> Controller {
    Controller::new(Arc::new(fake.clone()), settings())
}
