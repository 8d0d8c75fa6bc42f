use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the analysis service; `/process_resume` and `/generate_resume` hang off it.
    pub api_endpoint: String,
    pub upload_endpoint: String,
    pub s3_bucket: String,
    pub num_jobs: u32,
    pub timeouts: Timeouts,
    pub port: u16,
    pub rust_log: String,
}

/// Per-operation budgets. Upload has none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub analyze: Duration,
    pub questions: Duration,
    pub generate: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            analyze: Duration::from_secs(30),
            questions: Duration::from_secs(15),
            generate: Duration::from_secs(25),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Timeouts::default();

        Ok(Config {
            api_endpoint: require_env("JOBGENIE_API_ENDPOINT")?
                .trim_end_matches('/')
                .to_string(),
            upload_endpoint: require_env("JOBGENIE_UPLOAD_ENDPOINT")?,
            s3_bucket: require_env("S3_BUCKET")?,
            num_jobs: parse_env("NUM_JOBS", 5)?,
            timeouts: Timeouts {
                analyze: secs_env("ANALYZE_TIMEOUT_SECS", defaults.analyze)?,
                questions: secs_env("QUESTIONS_TIMEOUT_SECS", defaults.questions)?,
                generate: secs_env("GENERATE_TIMEOUT_SECS", defaults.generate)?,
            },
            port: parse_env("PORT", 8080)
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

fn secs_env(key: &str, default: Duration) -> Result<Duration> {
    parse_env(key, default.as_secs()).map(Duration::from_secs)
}
