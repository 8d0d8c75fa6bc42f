//! Per-page session state: the single mutable record the controller owns.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::models::{GeneratedResume, JobMatch, ResumeFile};

/// The five screens of the flow. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Screen {
    #[default]
    Upload,
    Jobs,
    Details,
    Qa,
    Generated,
}

impl Screen {
    pub const ALL: [Screen; 5] = [
        Screen::Upload,
        Screen::Jobs,
        Screen::Details,
        Screen::Qa,
        Screen::Generated,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Screen::Upload => "upload",
            Screen::Jobs => "jobs",
            Screen::Details => "details",
            Screen::Qa => "qa",
            Screen::Generated => "generated",
        }
    }

    pub fn from_name(name: &str) -> Option<Screen> {
        Screen::ALL.into_iter().find(|s| s.name() == name)
    }

    /// Fixed back-edge per screen. Not a history stack: `generated` goes
    /// straight back to `jobs`.
    pub fn back_target(self) -> Option<Screen> {
        match self {
            Screen::Upload => None,
            Screen::Jobs => Some(Screen::Upload),
            Screen::Details => Some(Screen::Jobs),
            Screen::Qa => Some(Screen::Details),
            Screen::Generated => Some(Screen::Jobs),
        }
    }
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One displayed question and the skill its answer field maps back to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillPrompt {
    pub field_id: String,
    pub skill: String,
    pub question: String,
}

/// Contents of the Q&A screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum QaPanel {
    #[default]
    Empty,
    /// Questions are being generated in the background.
    Generating,
    /// The locked job has no missing skills.
    NoSkillsNeeded,
    Questions(Vec<SkillPrompt>),
}

impl QaPanel {
    /// The answer-field → skill mapping for the current panel, in display order.
    pub fn skill_answers(&self) -> &[SkillPrompt] {
        match self {
            QaPanel::Questions(prompts) => prompts,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub screen: Screen,
    pub resume_file: Option<ResumeFile>,
    /// Set only after a successful upload.
    pub storage_key: Option<String>,
    pub jobs: Vec<JobMatch>,
    pub selected_job: Option<JobMatch>,
    /// Copied from `selected_job` when a Q&A cycle starts.
    pub job_for_resume: Option<JobMatch>,
    pub qa: QaPanel,
    /// Incremented at the start of every Q&A cycle.
    pub qa_cycle: u64,
    pub question_cancel: Option<CancellationToken>,
    pub generated: Option<GeneratedResume>,
    /// One-shot message shown on the next render.
    pub notice: Option<String>,
}

impl Session {
    pub fn switch_screen(&mut self, to: Screen) {
        if self.screen != to {
            debug!(from = %self.screen, to = %to, "switching screen");
        }
        self.screen = to;
    }

    /// Switches by name; unknown names leave the session untouched.
    pub fn switch_screen_named(&mut self, name: &str) -> bool {
        match Screen::from_name(name) {
            Some(screen) => {
                self.switch_screen(screen);
                true
            }
            None => {
                debug!(name, "ignoring switch to unknown screen");
                false
            }
        }
    }

    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }
}
