//! Screen controller: the state machine over the five screens.
//!
//! Every user action enters through `Controller::dispatch` as a `Command`
//! tagged with the screen it was posted from. The controller owns the
//! session; handlers never touch it directly. The session lock is never
//! held across a network call: state is read, released, and re-taken to
//! apply the result.

use std::collections::HashMap;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{Config, Timeouts};
use crate::errors::AppError;
use crate::models::{GeneratedResume, JobMatch, ResumeFile};
use crate::remote::{within_budget, AnalyzeRequest, Operation, ResumeService, ServiceError};
use crate::sanitize::{normalize_job_match, validate_resume_file};
use crate::session::{QaPanel, Screen, Session};

pub mod commands;
pub mod questions;

pub use commands::{ActionKind, Command, InFlight, SearchForm};

/// Values the controller needs from configuration.
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub bucket: String,
    pub num_jobs: u32,
    pub timeouts: Timeouts,
}

impl ControllerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            bucket: config.s3_bucket.clone(),
            num_jobs: config.num_jobs,
            timeouts: config.timeouts,
        }
    }
}

/// Result of a dispatched command.
#[derive(Debug)]
pub enum Outcome {
    /// Not valid for the posted or active screen; nothing changed.
    Ignored,
    /// Handled without leaving the current screen.
    Stayed,
    Switched(Screen),
    /// Switched to `qa`; questions must now be populated with `populate_questions`.
    QuestionsPending(QuestionJob),
}

/// A pending question-generation run for one Q&A cycle.
#[derive(Debug, Clone)]
pub struct QuestionJob {
    pub cycle: u64,
    pub job_title: String,
    pub missing_skills: Vec<String>,
    pub cancel: CancellationToken,
}

/// The generated resume packaged as a download.
#[derive(Debug, Clone, PartialEq)]
pub struct ResumeDownload {
    pub filename: String,
    pub content: String,
}

#[derive(Clone)]
pub struct Controller {
    session: Arc<Mutex<Session>>,
    service: Arc<dyn ResumeService>,
    settings: ControllerSettings,
    in_flight: Arc<InFlight>,
}

impl Controller {
    pub fn new(service: Arc<dyn ResumeService>, settings: ControllerSettings) -> Self {
        Self {
            session: Arc::new(Mutex::new(Session::default())),
            service,
            settings,
            in_flight: Arc::new(InFlight::default()),
        }
    }

    /// Clone of the session for rendering. Consumes the pending notice.
    pub async fn take_view(&self) -> Session {
        let mut session = self.session.lock().await;
        let notice = session.take_notice();
        Session {
            notice,
            ..session.clone()
        }
    }

    pub async fn notify(&self, message: impl Into<String>) {
        self.session.lock().await.notice = Some(message.into());
    }

    /// Switches by screen name. Unknown names are ignored.
    pub async fn switch_screen_named(&self, name: &str) -> bool {
        self.session.lock().await.switch_screen_named(name)
    }

    /// Routes a command through the (screen, action) table.
    pub async fn dispatch(&self, screen: Screen, command: Command) -> Result<Outcome, AppError> {
        let kind = command.kind();
        if !kind.allowed_on(screen) {
            warn!(screen = %screen, action = %kind, "action not available on screen");
            return Ok(Outcome::Ignored);
        }

        let active = self.session.lock().await.screen;
        if active != screen {
            warn!(posted = %screen, active = %active, action = %kind, "ignoring action for inactive screen");
            return Ok(Outcome::Ignored);
        }

        match command {
            Command::SelectFile(file) => self.select_file(file).await,
            Command::Analyze(search) => self.analyze(search).await,
            Command::SelectJob(index) => self.select_job(index).await,
            Command::Enhance => self.begin_qa().await,
            Command::SubmitAnswers(answers) => self.submit_answers(answers).await,
            Command::SubmitApplication => self.submit_application().await,
            Command::Back => self.back(screen).await,
        }
    }

    async fn select_file(&self, file: ResumeFile) -> Result<Outcome, AppError> {
        validate_resume_file(&file.name, file.size())?;
        info!(file = %file.name, bytes = file.size(), "resume selected");
        self.session.lock().await.resume_file = Some(file);
        Ok(Outcome::Stayed)
    }

    /// Upload → store key → analyze → normalize → jobs screen.
    async fn analyze(&self, search: SearchForm) -> Result<Outcome, AppError> {
        let file = self
            .session
            .lock()
            .await
            .resume_file
            .clone()
            .ok_or_else(|| AppError::Validation("Please upload your resume first!".to_string()))?;

        if search.job_title.trim().is_empty() {
            return Err(AppError::Validation(
                "Please enter a job title to search for".to_string(),
            ));
        }

        let guard = self.in_flight.acquire(ActionKind::Analyze)?;
        let query = search.query();
        let key = storage_key(&file.name, Utc::now());
        info!(%query, %key, "analyzing resume");

        within_budget(
            Operation::Upload,
            None,
            guard.token(),
            self.service.upload(&file, &self.settings.bucket, &key),
        )
        .await?;
        self.session.lock().await.storage_key = Some(key.clone());

        let request = AnalyzeRequest {
            resume_base64: BASE64.encode(&file.bytes),
            s3_bucket: self.settings.bucket.clone(),
            s3_key: key,
            num_jobs: self.settings.num_jobs,
            query: query.clone(),
        };
        let raw_jobs = within_budget(
            Operation::Analyze,
            Some(self.settings.timeouts.analyze),
            guard.token(),
            self.service.analyze_resume(&request),
        )
        .await?;

        let jobs: Vec<JobMatch> = raw_jobs.iter().map(normalize_job_match).collect();
        let mut session = self.session.lock().await;

        if jobs.is_empty() {
            info!(%query, "analysis returned no jobs");
            session.notice = Some(format!("No {query} jobs found. Try different search terms."));
            return Ok(Outcome::Stayed);
        }

        info!(count = jobs.len(), "jobs matched");
        session.jobs = jobs;
        session.selected_job = None;
        session.switch_screen(Screen::Jobs);
        Ok(Outcome::Switched(Screen::Jobs))
    }

    async fn select_job(&self, index: usize) -> Result<Outcome, AppError> {
        let mut session = self.session.lock().await;
        let Some(job) = session.jobs.get(index).cloned() else {
            warn!(index, count = session.jobs.len(), "job index out of range");
            return Ok(Outcome::Ignored);
        };
        debug!(index, title = %job.title, "job selected");
        session.selected_job = Some(job);
        session.switch_screen(Screen::Details);
        Ok(Outcome::Switched(Screen::Details))
    }

    /// Starts a Q&A cycle: locks the selected job in and shows the qa screen.
    async fn begin_qa(&self) -> Result<Outcome, AppError> {
        let mut session = self.session.lock().await;

        let job = match (&session.selected_job, &session.storage_key) {
            (Some(job), Some(_)) => job.clone(),
            _ => {
                return Err(AppError::MissingContext(
                    "Job or resume information missing".to_string(),
                ))
            }
        };

        if let Some(previous) = session.question_cancel.take() {
            previous.cancel();
        }
        session.qa_cycle += 1;
        session.job_for_resume = Some(job.clone());
        session.switch_screen(Screen::Qa);
        info!(cycle = session.qa_cycle, title = %job.title, "skill Q&A started");

        if job.missing_skills.is_empty() {
            session.qa = QaPanel::NoSkillsNeeded;
            return Ok(Outcome::Switched(Screen::Qa));
        }

        let cancel = CancellationToken::new();
        session.qa = QaPanel::Generating;
        session.question_cancel = Some(cancel.clone());

        Ok(Outcome::QuestionsPending(QuestionJob {
            cycle: session.qa_cycle,
            job_title: job.title,
            missing_skills: job.missing_skills,
            cancel,
        }))
    }

    /// Generates questions for a Q&A cycle, falling back to templated ones on
    /// any failure. Results for a superseded cycle are dropped.
    pub async fn populate_questions(&self, job: QuestionJob) {
        let result = within_budget(
            Operation::GenerateQuestions,
            Some(self.settings.timeouts.questions),
            &job.cancel,
            self.service
                .generate_questions(&job.missing_skills, &job.job_title),
        )
        .await;

        let prompts = match result {
            Ok(generated) => questions::pair_prompts(&job.missing_skills, generated),
            Err(ServiceError::Cancelled { .. }) => {
                debug!(cycle = job.cycle, "question generation superseded");
                return;
            }
            Err(e) => {
                warn!(error = %e, "question generation failed; using templated questions");
                questions::fallback_prompts(&job.missing_skills)
            }
        };

        let mut session = self.session.lock().await;
        if session.qa_cycle != job.cycle {
            debug!(cycle = job.cycle, current = session.qa_cycle, "discarding stale questions");
            return;
        }
        session.qa = QaPanel::Questions(prompts);
        session.question_cancel = None;
    }

    /// Collects answers, generates the tailored resume and fetches its text.
    async fn submit_answers(&self, answers: HashMap<String, String>) -> Result<Outcome, AppError> {
        let (job, key, prompts) = {
            let session = self.session.lock().await;
            let (Some(job), Some(key)) = (&session.job_for_resume, &session.storage_key) else {
                return Err(AppError::MissingContext("Job information missing".to_string()));
            };
            if session.qa == QaPanel::Generating {
                return Err(AppError::Validation(
                    "Questions are still being generated. Please wait a moment.".to_string(),
                ));
            }
            (job.clone(), key.clone(), session.qa.skill_answers().to_vec())
        };

        let answers_text = questions::combine_answers(&prompts, &answers);
        let guard = self.in_flight.acquire(ActionKind::SubmitAnswers)?;
        info!(title = %job.title, answered = answers_text.lines().filter(|l| !l.is_empty()).count(), "generating tailored resume");

        let result = within_budget(
            Operation::GenerateResume,
            Some(self.settings.timeouts.generate),
            guard.token(),
            async {
                let url = self
                    .service
                    .generate_resume(&key, &job.title, &answers_text)
                    .await?;
                let text = self.service.fetch_resume_text(&url).await?;
                Ok::<_, ServiceError>(GeneratedResume { url, text })
            },
        )
        .await;

        let generated = match result {
            Ok(generated) => generated,
            Err(ServiceError::Cancelled { .. }) => {
                info!(title = %job.title, "resume generation abandoned");
                return Ok(Outcome::Ignored);
            }
            Err(e) => return Err(e.into()),
        };

        let mut session = self.session.lock().await;
        session.generated = Some(generated);
        session.switch_screen(Screen::Generated);
        Ok(Outcome::Switched(Screen::Generated))
    }

    async fn submit_application(&self) -> Result<Outcome, AppError> {
        let mut session = self.session.lock().await;
        let title = session
            .job_for_resume
            .as_ref()
            .map(|job| job.title.clone())
            .ok_or_else(|| AppError::MissingContext("Job information missing".to_string()))?;

        info!(%title, "application submitted");
        session.notice = Some(format!(
            "Resume submitted for: {title}\n\nIn a real app, this would send your application to the employer."
        ));
        session.switch_screen(Screen::Jobs);
        Ok(Outcome::Switched(Screen::Jobs))
    }

    async fn back(&self, from: Screen) -> Result<Outcome, AppError> {
        let Some(target) = from.back_target() else {
            return Ok(Outcome::Ignored);
        };
        if from == Screen::Qa {
            self.in_flight.cancel(ActionKind::SubmitAnswers);
        }
        self.session.lock().await.switch_screen(target);
        Ok(Outcome::Switched(target))
    }

    /// The currently displayed resume as a text download.
    pub async fn download(&self) -> Result<ResumeDownload, AppError> {
        let session = self.session.lock().await;
        let content = session
            .generated
            .as_ref()
            .map(|g| g.text.clone())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| AppError::Validation("No resume content to download".to_string()))?;

        Ok(ResumeDownload {
            filename: format!("tailored_resume_{}.txt", Utc::now().timestamp_millis()),
            content,
        })
    }
}

/// `resumes/<unix-millis>_<filename>`.
pub fn storage_key(file_name: &str, now: DateTime<Utc>) -> String {
    format!("resumes/{}_{}", now.timestamp_millis(), file_name)
}

#[cfg(test)]
pub(crate) mod testing;

#[cfg(test)]
mod tests;
