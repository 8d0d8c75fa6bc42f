pub mod job_match;
pub mod resume_file;

pub use job_match::JobMatch;
pub use resume_file::{GeneratedResume, ResumeFile};
