//! Browser-facing handlers. Every POST answers with a 303 back to `/`, so a
//! reload never resubmits; failures surface as the notice on the next render.

use std::collections::HashMap;

use axum::{
    extract::{multipart::MultipartRejection, rejection::FormRejection, Multipart, Path, State},
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use tracing::{debug, warn};

use crate::controller::{ActionKind, Command, Controller, Outcome};
use crate::errors::AppError;
use crate::models::ResumeFile;
use crate::render::render_page;
use crate::session::Screen;
use crate::state::AppState;

/// GET /
pub async fn handle_page(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    Ok(Html(render_page(&state.controller.take_view().await)?))
}

/// POST /resume-file
/// Multipart with the PDF in the `resume` field. A malformed body is a
/// request error; a rejected file becomes the notice.
pub async fn handle_resume_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Redirect, AppError> {
    let multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let Some(file) = read_resume_field(multipart).await? else {
        debug!("upload form submitted without a file");
        return Ok(Redirect::to("/"));
    };
    if let Err(e) = state
        .controller
        .dispatch(Screen::Upload, Command::SelectFile(file))
        .await
    {
        report(&state.controller, e).await;
    }
    Ok(Redirect::to("/"))
}

async fn read_resume_field(mut multipart: Multipart) -> Result<Option<ResumeFile>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid upload: {e}")))?
    {
        if field.name() != Some("resume") {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid upload: {e}")))?;
        if name.is_empty() && bytes.is_empty() {
            return Ok(None);
        }
        return Ok(Some(ResumeFile::new(name, bytes)));
    }
    Ok(None)
}

/// POST /screens/:screen
/// Shows a screen by name. Unknown names leave the page as it was.
pub async fn handle_switch_screen(
    State(state): State<AppState>,
    Path(screen): Path<String>,
) -> Redirect {
    if !state.controller.switch_screen_named(&screen).await {
        warn!(%screen, "unknown screen requested");
    }
    Redirect::to("/")
}

/// POST /screens/:screen/:action
pub async fn handle_action(
    State(state): State<AppState>,
    Path((screen, action)): Path<(String, String)>,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> Result<Redirect, AppError> {
    let controller = &state.controller;
    let Form(fields) = form.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let (Some(screen), Some(kind)) = (Screen::from_name(&screen), ActionKind::from_name(&action))
    else {
        warn!(%screen, %action, "unknown screen or action");
        return Ok(Redirect::to("/"));
    };

    let command = Command::from_form(kind, fields)?;
    match controller.dispatch(screen, command).await {
        Ok(Outcome::QuestionsPending(job)) => {
            let controller = controller.clone();
            tokio::spawn(async move { controller.populate_questions(job).await });
        }
        Ok(Outcome::Switched(to)) => debug!(from = %screen, %to, "screen changed"),
        Ok(Outcome::Stayed | Outcome::Ignored) => {}
        Err(e) => report(controller, e).await,
    }
    Ok(Redirect::to("/"))
}

/// GET /download
pub async fn handle_download(State(state): State<AppState>) -> Response {
    match state.controller.download().await {
        Ok(download) => (
            [
                (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", download.filename),
                ),
            ],
            download.content,
        )
            .into_response(),
        Err(e) => {
            report(&state.controller, e).await;
            Redirect::to("/").into_response()
        }
    }
}

async fn report(controller: &Controller, e: AppError) {
    e.log();
    controller.notify(e.user_message()).await;
}
