//! Renderers: pure projections from session data to markup fragments.
//!
//! Templates live under `templates/` and are compiled with askama. They are
//! declared with `escape = "none"` and every service- or user-supplied string
//! goes through the `esc` filter, which is `escape_for_display`. Renderers
//! never mutate the session.

use askama::Template;

use crate::models::JobMatch;
use crate::session::{QaPanel, SkillPrompt};

pub mod page;

pub use page::render_page;

mod filters {
    /// `{{ value|esc }}`
    pub fn esc<T: std::fmt::Display>(value: T) -> askama::Result<String> {
        Ok(crate::sanitize::escape_for_display(&value.to_string()))
    }
}

#[derive(Template)]
#[template(path = "jobs.html", escape = "none")]
struct JobsTemplate<'a> {
    jobs: &'a [JobMatch],
}

#[derive(Template)]
#[template(path = "job_details.html", escape = "none")]
struct JobDetailsTemplate<'a> {
    job: &'a JobMatch,
}

#[derive(Template)]
#[template(path = "questions.html", escape = "none")]
struct QuestionsTemplate<'a> {
    generating: bool,
    no_skills_needed: bool,
    prompts: &'a [SkillPrompt],
}

#[derive(Template)]
#[template(path = "generated.html", escape = "none")]
struct GeneratedTemplate<'a> {
    text: &'a str,
}

/// One clickable card per job: title, company, summary and score.
pub fn render_jobs(jobs: &[JobMatch]) -> askama::Result<String> {
    JobsTemplate { jobs }.render()
}

/// Full detail for one job plus the enhance affordance.
pub fn render_job_details(job: &JobMatch) -> askama::Result<String> {
    JobDetailsTemplate { job }.render()
}

/// The Q&A panel: placeholder, static message, or one block per question
/// inside the submit form.
pub fn render_questions(panel: &QaPanel) -> askama::Result<String> {
    QuestionsTemplate {
        generating: *panel == QaPanel::Generating,
        no_skills_needed: *panel == QaPanel::NoSkillsNeeded,
        prompts: panel.skill_answers(),
    }
    .render()
}

/// The generated resume, displayed verbatim.
///
/// The text is escaped so it shows exactly as fetched rather than being
/// interpreted as markup.
pub fn render_generated(text: &str) -> askama::Result<String> {
    GeneratedTemplate { text }.render()
}
