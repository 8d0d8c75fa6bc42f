//! The (screen, action) command table and the in-flight registry that keeps
//! a second click from starting a duplicate network call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::errors::AppError;
use crate::models::ResumeFile;
use crate::session::Screen;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    SelectFile,
    Analyze,
    SelectJob,
    Enhance,
    SubmitAnswers,
    SubmitApplication,
    Back,
}

/// Every (screen, action) pair the controller accepts. Anything else is ignored.
pub const ACTION_TABLE: &[(Screen, ActionKind)] = &[
    (Screen::Upload, ActionKind::SelectFile),
    (Screen::Upload, ActionKind::Analyze),
    (Screen::Jobs, ActionKind::SelectJob),
    (Screen::Jobs, ActionKind::Back),
    (Screen::Details, ActionKind::Enhance),
    (Screen::Details, ActionKind::Back),
    (Screen::Qa, ActionKind::SubmitAnswers),
    (Screen::Qa, ActionKind::Back),
    (Screen::Generated, ActionKind::SubmitApplication),
    (Screen::Generated, ActionKind::Back),
];

impl ActionKind {
    pub const ALL: [ActionKind; 7] = [
        ActionKind::SelectFile,
        ActionKind::Analyze,
        ActionKind::SelectJob,
        ActionKind::Enhance,
        ActionKind::SubmitAnswers,
        ActionKind::SubmitApplication,
        ActionKind::Back,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ActionKind::SelectFile => "select-file",
            ActionKind::Analyze => "analyze",
            ActionKind::SelectJob => "select-job",
            ActionKind::Enhance => "enhance",
            ActionKind::SubmitAnswers => "submit-answers",
            ActionKind::SubmitApplication => "submit-application",
            ActionKind::Back => "back",
        }
    }

    pub fn from_name(name: &str) -> Option<ActionKind> {
        ActionKind::ALL.into_iter().find(|a| a.name() == name)
    }

    pub fn allowed_on(self, screen: Screen) -> bool {
        ACTION_TABLE.contains(&(screen, self))
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The search inputs on the upload screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchForm {
    pub job_title: String,
    pub job_type: String,
    pub region: String,
}

impl SearchForm {
    /// Title, then an optional job-type label, then the region.
    pub fn query(&self) -> String {
        let mut query = self.job_title.trim().to_string();

        let job_type = match self.job_type.trim() {
            "intern" => Some("Intern"),
            "fulltime" => Some("Full Time"),
            "parttime" => Some("Part Time"),
            "contract" => Some("Contract"),
            "remote" => Some("Remote"),
            _ => None,
        };
        if let Some(label) = job_type {
            query.push(' ');
            query.push_str(label);
        }

        match self.region.trim() {
            "" => {}
            "remote" => query.push_str(" Remote"),
            region => {
                query.push_str(" in ");
                query.push_str(region);
            }
        }

        query
    }
}

/// A user action with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SelectFile(ResumeFile),
    Analyze(SearchForm),
    SelectJob(usize),
    Enhance,
    /// Answer text keyed by answer-field id.
    SubmitAnswers(HashMap<String, String>),
    SubmitApplication,
    Back,
}

impl Command {
    pub fn kind(&self) -> ActionKind {
        match self {
            Command::SelectFile(_) => ActionKind::SelectFile,
            Command::Analyze(_) => ActionKind::Analyze,
            Command::SelectJob(_) => ActionKind::SelectJob,
            Command::Enhance => ActionKind::Enhance,
            Command::SubmitAnswers(_) => ActionKind::SubmitAnswers,
            Command::SubmitApplication => ActionKind::SubmitApplication,
            Command::Back => ActionKind::Back,
        }
    }

    /// Builds a command from url-encoded form fields. File selection arrives
    /// as multipart and is built by its own handler.
    pub fn from_form(kind: ActionKind, mut fields: HashMap<String, String>) -> Result<Self, AppError> {
        match kind {
            ActionKind::SelectFile => Err(AppError::BadRequest(
                "select-file expects a multipart upload".to_string(),
            )),
            ActionKind::Analyze => Ok(Command::Analyze(SearchForm {
                job_title: take_field(&mut fields, "job_title"),
                job_type: take_field(&mut fields, "job_type"),
                region: take_field(&mut fields, "region"),
            })),
            ActionKind::SelectJob => take_field(&mut fields, "index")
                .trim()
                .parse::<usize>()
                .map(Command::SelectJob)
                .map_err(|_| AppError::BadRequest("select-job needs a numeric index".to_string())),
            ActionKind::Enhance => Ok(Command::Enhance),
            ActionKind::SubmitAnswers => Ok(Command::SubmitAnswers(fields)),
            ActionKind::SubmitApplication => Ok(Command::SubmitApplication),
            ActionKind::Back => Ok(Command::Back),
        }
    }
}

fn take_field(fields: &mut HashMap<String, String>, name: &str) -> String {
    fields.remove(name).unwrap_or_default()
}

/// Tracks which network-bound actions are running.
#[derive(Debug, Default)]
pub struct InFlight {
    running: Mutex<HashMap<ActionKind, CancellationToken>>,
}

impl InFlight {
    /// Claims the slot for `kind`, failing with `Busy` if it is taken.
    pub fn acquire(self: &Arc<Self>, kind: ActionKind) -> Result<ActionGuard, AppError> {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if running.contains_key(&kind) {
            return Err(AppError::Busy(kind));
        }
        let token = CancellationToken::new();
        running.insert(kind, token.clone());
        debug!(action = %kind, "action started");

        Ok(ActionGuard {
            kind,
            token,
            registry: Arc::clone(self),
        })
    }

    /// Cancels the running action of this kind, if any. Its guard still
    /// frees the slot when the action unwinds.
    pub fn cancel(&self, kind: ActionKind) -> bool {
        let running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        match running.get(&kind) {
            Some(token) => {
                token.cancel();
                debug!(action = %kind, "action cancelled");
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub fn is_running(&self, kind: ActionKind) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&kind)
    }
}

/// Holds an in-flight slot. Dropping it cancels the token and frees the slot.
/// `InFlight::cancel` fires the same token while the action is still running.
#[derive(Debug)]
pub struct ActionGuard {
    kind: ActionKind,
    token: CancellationToken,
    registry: Arc<InFlight>,
}

impl ActionGuard {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for ActionGuard {
    fn drop(&mut self) {
        self.token.cancel();
        self.registry
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.kind);
        debug!(action = %self.kind, "action finished");
    }
}
