use std::collections::HashMap;

use chrono::TimeZone;

use super::testing::{backend_engineer_job, controller, pdf, FakeService, Reply, MIB};
use super::*;
use crate::render;

fn search(title: &str) -> Command {
    Command::Analyze(SearchForm {
        job_title: title.to_string(),
        ..Default::default()
    })
}

fn answers(pairs: &[(&str, &str)]) -> Command {
    Command::SubmitAnswers(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>(),
    )
}

/// Drives a controller to the details screen for the Acme job.
async fn at_details(fake: &FakeService) -> Controller {
    let c = controller(fake);
    c.dispatch(Screen::Upload, Command::SelectFile(pdf("cv.pdf", MIB)))
        .await
        .unwrap();
    c.dispatch(Screen::Upload, search("Backend Engineer"))
        .await
        .unwrap();
    c.dispatch(Screen::Jobs, Command::SelectJob(0)).await.unwrap();
    c
}

/// Drives a controller through enhance and question population.
async fn at_qa(fake: &FakeService) -> Controller {
    let c = at_details(fake).await;
    match c.dispatch(Screen::Details, Command::Enhance).await.unwrap() {
        Outcome::QuestionsPending(job) => c.populate_questions(job).await,
        other => panic!("expected pending questions, got {other:?}"),
    }
    c
}

#[test]
fn test_storage_key_format() {
    let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
    assert_eq!(storage_key("cv.pdf", now), "resumes/1700000000123_cv.pdf");
}

#[tokio::test]
async fn test_happy_path_reaches_details_with_rendered_job() {
    let fake = FakeService::default();
    let c = controller(&fake);

    let outcome = c
        .dispatch(Screen::Upload, Command::SelectFile(pdf("cv.pdf", MIB)))
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::Stayed));

    let outcome = c
        .dispatch(Screen::Upload, search("Backend Engineer"))
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::Switched(Screen::Jobs)));

    let view = c.take_view().await;
    assert_eq!(view.screen, Screen::Jobs);
    assert_eq!(view.jobs.len(), 1);
    let key = view.storage_key.clone().unwrap();
    assert!(key.starts_with("resumes/") && key.ends_with("_cv.pdf"));

    let cards = render::render_jobs(&view.jobs).unwrap();
    for text in ["Backend Engineer", "Acme", "Good fit", "82% Match"] {
        assert!(cards.contains(text), "missing {text} in {cards}");
    }

    let outcome = c.dispatch(Screen::Jobs, Command::SelectJob(0)).await.unwrap();
    assert!(matches!(outcome, Outcome::Switched(Screen::Details)));

    let view = c.take_view().await;
    let job = view.selected_job.unwrap();
    assert_eq!(job.matching_skills, vec!["Go"]);
    assert_eq!(job.missing_skills, vec!["Kubernetes"]);
    let details = render::render_job_details(&job).unwrap();
    assert_eq!(details.matches("skill-tag common").count(), 1);
    assert_eq!(details.matches("skill-tag missing").count(), 1);
    assert!(details.contains(">Go</span>"));
    assert!(details.contains(">Kubernetes</span>"));

    assert_eq!(
        fake.calls_starting_with("upload:"),
        vec![format!("upload:jobgenie-test:{key}:cv.pdf")]
    );
    assert_eq!(
        fake.calls_starting_with("analyze:"),
        vec![format!("analyze:{key}:Backend Engineer")]
    );
}

#[tokio::test]
async fn test_analyze_without_file_is_rejected_locally() {
    let fake = FakeService::default();
    let c = controller(&fake);

    let err = c
        .dispatch(Screen::Upload, search("Backend Engineer"))
        .await
        .unwrap_err();

    assert_eq!(err.user_message(), "Please upload your resume first!");
    assert!(fake.calls().is_empty());
    assert_eq!(c.take_view().await.screen, Screen::Upload);
}

#[tokio::test]
async fn test_analyze_without_title_is_rejected_locally() {
    let fake = FakeService::default();
    let c = controller(&fake);
    c.dispatch(Screen::Upload, Command::SelectFile(pdf("cv.pdf", MIB)))
        .await
        .unwrap();

    let err = c.dispatch(Screen::Upload, search("   ")).await.unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert!(fake.calls().is_empty());
    assert!(c.take_view().await.storage_key.is_none());
}

#[tokio::test]
async fn test_oversized_and_non_pdf_files_are_rejected_before_network() {
    let fake = FakeService::default();
    let c = controller(&fake);

    let err = c
        .dispatch(Screen::Upload, Command::SelectFile(pdf("cv.pdf", 6 * MIB)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = c
        .dispatch(Screen::Upload, Command::SelectFile(pdf("cv.docx", MIB)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    assert!(c.take_view().await.resume_file.is_none());
    assert!(fake.calls().is_empty());

    c.dispatch(Screen::Upload, Command::SelectFile(pdf("cv.pdf", 2 * MIB)))
        .await
        .unwrap();
    assert_eq!(c.take_view().await.resume_file.unwrap().size(), 2 * MIB);
}

#[tokio::test]
async fn test_failed_upload_leaves_no_storage_key_and_skips_analysis() {
    let fake = FakeService {
        upload: Reply::Fail,
        ..Default::default()
    };
    let c = controller(&fake);
    c.dispatch(Screen::Upload, Command::SelectFile(pdf("cv.pdf", MIB)))
        .await
        .unwrap();

    let err = c
        .dispatch(Screen::Upload, search("Backend Engineer"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Service(ServiceError::Status { operation: Operation::Upload, .. })));
    let view = c.take_view().await;
    assert!(view.storage_key.is_none());
    assert_eq!(view.screen, Screen::Upload);
    assert!(fake.calls_starting_with("analyze:").is_empty());
}

#[tokio::test]
async fn test_empty_analysis_result_stays_on_upload_with_notice() {
    let fake = FakeService {
        jobs: Reply::Ok(vec![]),
        ..Default::default()
    };
    let c = controller(&fake);
    c.dispatch(Screen::Upload, Command::SelectFile(pdf("cv.pdf", MIB)))
        .await
        .unwrap();

    let outcome = c
        .dispatch(
            Screen::Upload,
            Command::Analyze(SearchForm {
                job_title: "Backend Engineer".to_string(),
                job_type: "intern".to_string(),
                region: "Singapore".to_string(),
            }),
        )
        .await
        .unwrap();

    assert!(matches!(outcome, Outcome::Stayed));
    let view = c.take_view().await;
    assert_eq!(view.screen, Screen::Upload);
    assert_eq!(
        view.notice.as_deref(),
        Some("No Backend Engineer Intern in Singapore jobs found. Try different search terms.")
    );
}

#[tokio::test(start_paused = true)]
async fn test_analysis_timeout_surfaces_timeout_error() {
    let fake = FakeService {
        jobs: Reply::Hang,
        ..Default::default()
    };
    let c = controller(&fake);
    c.dispatch(Screen::Upload, Command::SelectFile(pdf("cv.pdf", MIB)))
        .await
        .unwrap();

    let err = c
        .dispatch(Screen::Upload, search("Backend Engineer"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AppError::Service(ServiceError::Timeout { operation: Operation::Analyze, .. })
    ));
    assert!(!c.in_flight.is_running(ActionKind::Analyze));
    assert!(c.take_view().await.jobs.is_empty());
}

#[tokio::test]
async fn test_second_analyze_while_running_is_busy() {
    let fake = FakeService::default();
    let c = controller(&fake);
    c.dispatch(Screen::Upload, Command::SelectFile(pdf("cv.pdf", MIB)))
        .await
        .unwrap();

    let _running = c.in_flight.acquire(ActionKind::Analyze).unwrap();
    let err = c
        .dispatch(Screen::Upload, search("Backend Engineer"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Busy(ActionKind::Analyze)));
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn test_failing_question_generation_falls_back_and_combines_answer() {
    let fake = FakeService::default();
    let c = at_qa(&fake).await;

    let view = c.take_view().await;
    assert_eq!(view.screen, Screen::Qa);
    assert_eq!(view.job_for_resume.as_ref().unwrap().title, "Backend Engineer");
    let prompts = view.qa.skill_answers();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].question, "What experience do you have with Kubernetes?");
    assert_eq!(prompts[0].field_id, "skill-0");

    let outcome = c
        .dispatch(Screen::Qa, answers(&[("skill-0", "Ran 3 production clusters")]))
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::Switched(Screen::Generated)));

    let key = view.storage_key.unwrap();
    assert_eq!(
        fake.calls_starting_with("generate:"),
        vec![format!(
            "generate:{key}:Backend Engineer:Kubernetes: Ran 3 production clusters"
        )]
    );

    let view = c.take_view().await;
    let generated = view.generated.unwrap();
    assert_eq!(generated.url, "https://files.example/tailored.txt");
    assert_eq!(generated.text, "JANE DOE\nBackend Engineer");
}

#[tokio::test]
async fn test_generated_questions_are_shown_in_order() {
    let fake = FakeService {
        questions: Reply::Ok(vec!["Which Kubernetes workloads have you run?".to_string()]),
        ..Default::default()
    };
    let c = at_qa(&fake).await;

    let view = c.take_view().await;
    assert_eq!(
        view.qa.skill_answers()[0].question,
        "Which Kubernetes workloads have you run?"
    );
    assert_eq!(
        fake.calls_starting_with("questions:"),
        vec!["questions:Backend Engineer:Kubernetes".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn test_question_timeout_falls_back_to_templates() {
    let fake = FakeService {
        questions: Reply::Hang,
        ..Default::default()
    };
    let c = at_qa(&fake).await;

    let view = c.take_view().await;
    assert_eq!(view.qa, QaPanel::Questions(questions::fallback_prompts(&["Kubernetes".to_string()])));
    assert!(view.question_cancel.is_none());
}

#[tokio::test]
async fn test_enhance_without_missing_skills_skips_generation() {
    let mut job = backend_engineer_job();
    job["missing_skills"] = serde_json::json!([]);
    let fake = FakeService {
        jobs: Reply::Ok(vec![job]),
        ..Default::default()
    };
    let c = at_details(&fake).await;

    let outcome = c.dispatch(Screen::Details, Command::Enhance).await.unwrap();

    assert!(matches!(outcome, Outcome::Switched(Screen::Qa)));
    assert_eq!(c.take_view().await.qa, QaPanel::NoSkillsNeeded);
    assert!(fake.calls_starting_with("questions:").is_empty());

    c.dispatch(Screen::Qa, answers(&[])).await.unwrap();
    let generate = fake.calls_starting_with("generate:");
    assert_eq!(generate.len(), 1);
    assert!(generate[0].ends_with(":Backend Engineer:"));
}

#[tokio::test]
async fn test_superseded_question_cycle_is_discarded() {
    let fake = FakeService {
        questions: Reply::Ok(vec!["First cycle question?".to_string()]),
        ..Default::default()
    };
    let c = at_details(&fake).await;

    let Outcome::QuestionsPending(first) = c.dispatch(Screen::Details, Command::Enhance).await.unwrap() else {
        panic!("expected pending questions");
    };
    c.dispatch(Screen::Qa, Command::Back).await.unwrap();
    let Outcome::QuestionsPending(second) = c.dispatch(Screen::Details, Command::Enhance).await.unwrap() else {
        panic!("expected pending questions");
    };

    assert!(first.cancel.is_cancelled());
    assert_eq!(second.cycle, first.cycle + 1);

    c.populate_questions(first).await;
    assert_eq!(c.take_view().await.qa, QaPanel::Generating);

    c.populate_questions(second).await;
    assert!(matches!(c.take_view().await.qa, QaPanel::Questions(_)));
}

#[tokio::test]
async fn test_submit_while_generating_is_rejected() {
    let fake = FakeService::default();
    let c = at_details(&fake).await;
    c.dispatch(Screen::Details, Command::Enhance).await.unwrap();

    let err = c.dispatch(Screen::Qa, answers(&[])).await.unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert!(fake.calls_starting_with("generate:").is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_resume_generation_timeout_keeps_qa_screen() {
    let fake = FakeService {
        resume_url: Reply::Hang,
        ..Default::default()
    };
    let c = at_qa(&fake).await;

    let err = c
        .dispatch(Screen::Qa, answers(&[("skill-0", "Ran 3 production clusters")]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AppError::Service(ServiceError::Timeout { operation: Operation::GenerateResume, .. })
    ));
    let view = c.take_view().await;
    assert_eq!(view.screen, Screen::Qa);
    assert!(view.generated.is_none());
    assert!(fake.calls_starting_with("fetch:").is_empty());
    assert!(!c.in_flight.is_running(ActionKind::SubmitAnswers));
}

#[tokio::test]
async fn test_back_from_qa_abandons_running_generation() {
    let fake = FakeService {
        resume_url: Reply::Hang,
        ..Default::default()
    };
    let c = at_qa(&fake).await;

    let running = tokio::spawn({
        let c = c.clone();
        async move {
            c.dispatch(Screen::Qa, answers(&[("skill-0", "Ran 3 production clusters")]))
                .await
        }
    });
    while !c.in_flight.is_running(ActionKind::SubmitAnswers) {
        tokio::task::yield_now().await;
    }

    let outcome = c.dispatch(Screen::Qa, Command::Back).await.unwrap();
    assert!(matches!(outcome, Outcome::Switched(Screen::Details)));

    let abandoned = running.await.unwrap().unwrap();
    assert!(matches!(abandoned, Outcome::Ignored));
    let view = c.take_view().await;
    assert_eq!(view.screen, Screen::Details);
    assert!(view.generated.is_none());
    assert!(view.notice.is_none());
    assert!(!c.in_flight.is_running(ActionKind::SubmitAnswers));
}

#[tokio::test]
async fn test_stale_answers_from_previous_job_do_not_leak() {
    let mut second = backend_engineer_job();
    second["job_title"] = serde_json::json!("Platform Engineer");
    second["missing_skills"] = serde_json::json!(["Terraform"]);
    let fake = FakeService {
        jobs: Reply::Ok(vec![backend_engineer_job(), second]),
        ..Default::default()
    };
    let c = at_qa(&fake).await;

    c.dispatch(Screen::Qa, Command::Back).await.unwrap();
    c.dispatch(Screen::Details, Command::Back).await.unwrap();
    c.dispatch(Screen::Jobs, Command::SelectJob(1)).await.unwrap();
    if let Outcome::QuestionsPending(job) = c.dispatch(Screen::Details, Command::Enhance).await.unwrap() {
        c.populate_questions(job).await;
    }

    c.dispatch(
        Screen::Qa,
        answers(&[("skill-0", "Modules for 4 teams"), ("skill-1", "old answer")]),
    )
    .await
    .unwrap();

    let generate = fake.calls_starting_with("generate:");
    assert_eq!(generate.len(), 1);
    assert!(generate[0].ends_with(":Platform Engineer:Terraform: Modules for 4 teams"));
}

#[tokio::test]
async fn test_back_edges_follow_fixed_targets() {
    let fake = FakeService::default();
    let c = at_qa(&fake).await;
    c.dispatch(Screen::Qa, answers(&[])).await.unwrap();

    let outcome = c.dispatch(Screen::Generated, Command::Back).await.unwrap();
    assert!(matches!(outcome, Outcome::Switched(Screen::Jobs)));

    let outcome = c.dispatch(Screen::Jobs, Command::Back).await.unwrap();
    assert!(matches!(outcome, Outcome::Switched(Screen::Upload)));
    assert!(fake.calls_starting_with("generate:").len() == 1);
}

#[tokio::test]
async fn test_actions_for_inactive_screen_are_ignored() {
    let fake = FakeService::default();
    let c = controller(&fake);

    let outcome = c.dispatch(Screen::Jobs, Command::SelectJob(0)).await.unwrap();
    assert!(matches!(outcome, Outcome::Ignored));

    let outcome = c.dispatch(Screen::Upload, Command::Back).await.unwrap();
    assert!(matches!(outcome, Outcome::Ignored));
    assert_eq!(c.take_view().await.screen, Screen::Upload);
}

#[tokio::test]
async fn test_out_of_range_job_index_is_ignored() {
    let fake = FakeService::default();
    let c = at_details(&fake).await;
    c.dispatch(Screen::Details, Command::Back).await.unwrap();

    let outcome = c.dispatch(Screen::Jobs, Command::SelectJob(9)).await.unwrap();
    assert!(matches!(outcome, Outcome::Ignored));
    assert_eq!(c.take_view().await.screen, Screen::Jobs);
}

#[tokio::test]
async fn test_switching_to_unknown_screen_is_noop() {
    let fake = FakeService::default();
    let c = at_details(&fake).await;
    assert!(!c.switch_screen_named("settings").await);
    assert_eq!(c.take_view().await.screen, Screen::Details);
}

#[tokio::test]
async fn test_submit_application_returns_to_jobs_with_notice() {
    let fake = FakeService::default();
    let c = at_qa(&fake).await;
    c.dispatch(Screen::Qa, answers(&[])).await.unwrap();

    let outcome = c
        .dispatch(Screen::Generated, Command::SubmitApplication)
        .await
        .unwrap();

    assert!(matches!(outcome, Outcome::Switched(Screen::Jobs)));
    let view = c.take_view().await;
    assert!(view
        .notice
        .unwrap()
        .starts_with("Resume submitted for: Backend Engineer"));
    assert!(c.take_view().await.notice.is_none());
}

#[tokio::test]
async fn test_download_requires_generated_content() {
    let fake = FakeService::default();
    let c = controller(&fake);
    let err = c.download().await.unwrap_err();
    assert_eq!(err.user_message(), "No resume content to download");
}

#[tokio::test]
async fn test_download_names_file_with_timestamp() {
    let fake = FakeService::default();
    let c = at_qa(&fake).await;
    c.dispatch(Screen::Qa, answers(&[])).await.unwrap();

    let download = c.download().await.unwrap();
    assert!(download.filename.starts_with("tailored_resume_"));
    assert!(download.filename.ends_with(".txt"));
    assert_eq!(download.content, "JANE DOE\nBackend Engineer");
}
