use askama::Template;

use crate::session::{QaPanel, Screen, Session};

use super::{filters, render_generated, render_job_details, render_jobs, render_questions};

struct JobTypeOption {
    value: &'static str,
    label: &'static str,
}

const JOB_TYPES: &[JobTypeOption] = &[
    JobTypeOption { value: "", label: "Any type" },
    JobTypeOption { value: "intern", label: "Intern" },
    JobTypeOption { value: "fulltime", label: "Full Time" },
    JobTypeOption { value: "parttime", label: "Part Time" },
    JobTypeOption { value: "contract", label: "Contract" },
    JobTypeOption { value: "remote", label: "Remote" },
];

#[derive(Template)]
#[template(path = "upload.html", escape = "none")]
struct UploadTemplate<'a> {
    file_name: Option<&'a str>,
    job_types: &'static [JobTypeOption],
}

/// One `section.screen` of the page with its already rendered body.
struct ScreenSection {
    name: &'static str,
    active: bool,
    has_back: bool,
    /// Id of the wrapping div; empty for none.
    container: &'static str,
    body: String,
}

#[derive(Template)]
#[template(path = "page.html", escape = "none")]
struct PageTemplate<'a> {
    refresh: bool,
    notice: Option<&'a str>,
    sections: Vec<ScreenSection>,
}

fn screen_body(screen: Screen, session: &Session) -> askama::Result<String> {
    match screen {
        Screen::Upload => UploadTemplate {
            file_name: session.resume_file.as_ref().map(|file| file.name.as_str()),
            job_types: JOB_TYPES,
        }
        .render(),
        Screen::Jobs => render_jobs(&session.jobs),
        Screen::Details => match &session.selected_job {
            Some(job) => render_job_details(job),
            None => Ok(String::new()),
        },
        Screen::Qa => render_questions(&session.qa),
        Screen::Generated => match &session.generated {
            Some(generated) => render_generated(&generated.text),
            None => Ok(String::new()),
        },
    }
}

fn container_id(screen: Screen) -> &'static str {
    match screen {
        Screen::Jobs => "jobsContainer",
        Screen::Details => "jobDetails",
        Screen::Qa => "qaContainer",
        Screen::Upload | Screen::Generated => "",
    }
}

/// The whole page: every screen is present, only the active one is shown.
pub fn render_page(session: &Session) -> askama::Result<String> {
    let sections = Screen::ALL
        .into_iter()
        .map(|screen| {
            Ok(ScreenSection {
                name: screen.name(),
                active: screen == session.screen,
                has_back: screen.back_target().is_some(),
                container: container_id(screen),
                body: screen_body(screen, session)?,
            })
        })
        .collect::<askama::Result<Vec<_>>>()?;

    PageTemplate {
        // Keep polling while questions are generated in the background.
        refresh: session.screen == Screen::Qa && session.qa == QaPanel::Generating,
        notice: session.notice.as_deref(),
        sections,
    }
    .render()
}
