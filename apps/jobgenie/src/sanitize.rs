//! Normalization of loosely-typed service payloads and escaping of text
//! before it is interpolated into markup.

use serde_json::Value;

use crate::errors::AppError;
use crate::models::JobMatch;

pub const DEFAULT_TITLE: &str = "Untitled";
pub const DEFAULT_COMPANY: &str = "Unknown";
pub const DEFAULT_SUMMARY: &str = "No summary available";

/// Largest resume accepted for upload: 5 MiB.
pub const MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;

/// Converts one raw job object from the analysis service into a `JobMatch`.
///
/// Total: any absent, empty or wrong-typed field falls back to its default.
/// The title is read from `job_title`, then `title`. Scores accept JSON
/// numbers and numeric strings; anything else (including NaN) is 0.
pub fn normalize_job_match(raw: &Value) -> JobMatch {
    let title = non_empty_str(raw.get("job_title"))
        .or_else(|| non_empty_str(raw.get("title")))
        .unwrap_or(DEFAULT_TITLE);

    JobMatch {
        title: title.to_string(),
        company: non_empty_str(raw.get("company"))
            .unwrap_or(DEFAULT_COMPANY)
            .to_string(),
        score: numeric(raw.get("compatibility_score")),
        matching_skills: string_list(raw.get("common_skills")),
        missing_skills: string_list(raw.get("missing_skills")),
        summary: non_empty_str(raw.get("summary"))
            .unwrap_or(DEFAULT_SUMMARY)
            .to_string(),
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn numeric(value: Option<&Value>) -> f64 {
    let n = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

/// Non-string entries are dropped so a skill list never renders a blank tag.
fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Replaces `& < > " '` with entity equivalents.
///
/// Not idempotent: escaping twice double-escapes (`&amp;amp;`), which is
/// still inert as markup.
pub fn escape_for_display(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Local checks on a selected resume file: `.pdf` extension (any case)
/// and at most `MAX_RESUME_BYTES`.
pub fn validate_resume_file(name: &str, size: usize) -> Result<(), AppError> {
    let extension = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    if extension != "pdf" {
        return Err(AppError::Validation("Please upload a PDF file".to_string()));
    }

    if size > MAX_RESUME_BYTES {
        return Err(AppError::Validation(format!(
            "File size must be less than {}MB. Your file is {:.2}MB",
            MAX_RESUME_BYTES / 1024 / 1024,
            size as f64 / 1024.0 / 1024.0
        )));
    }

    Ok(())
}
