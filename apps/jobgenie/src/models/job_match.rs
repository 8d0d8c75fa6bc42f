/// One candidate posting scored against the uploaded resume.
///
/// Built only through `sanitize::normalize_job_match`, so every field is
/// populated and safe to render even when the service omitted it.
#[derive(Debug, Clone, PartialEq)]
pub struct JobMatch {
    pub title: String,
    pub company: String,
    /// Compatibility score as reported; 0 when absent or non-numeric.
    pub score: f64,
    pub matching_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub summary: String,
}

impl JobMatch {
    /// Score formatted for display: whole numbers without a fraction.
    pub fn score_label(&self) -> String {
        if self.score.fract() == 0.0 && self.score.abs() < 1e15 {
            format!("{}", self.score as i64)
        } else {
            format!("{:.1}", self.score)
        }
    }
}
