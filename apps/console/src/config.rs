use std::time::Duration;

use anyhow::{bail, Context, Result};

pub const DEFAULT_API_BASE: &str = "http://localhost:8000/api/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_STUB_PORT: u16 = 8000;

/// Console configuration loaded from environment variables.
/// Every value has a default; malformed values are rejected at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base location of the pipeline API, without a trailing slash.
    pub api_base: String,
    /// Upper bound on any single outbound request.
    pub request_timeout: Duration,
    pub stub_port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_base = lookup("PIPELINE_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let timeout_secs = match lookup("REQUEST_TIMEOUT_SECS") {
            Some(raw) => parse_timeout(&raw)?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let stub_port = match lookup("STUB_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .context("STUB_PORT must be a valid port number")?,
            None => DEFAULT_STUB_PORT,
        };

        Ok(Config {
            api_base: normalize_base(&api_base),
            request_timeout: Duration::from_secs(timeout_secs),
            stub_port,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Applies command-line overrides on top of the environment.
    pub fn with_overrides(mut self, api_base: Option<String>, timeout_secs: Option<u64>) -> Result<Self> {
        if let Some(base) = api_base {
            self.api_base = normalize_base(&base);
        }
        if let Some(secs) = timeout_secs {
            if secs == 0 {
                bail!("--timeout must be greater than zero");
            }
            self.request_timeout = Duration::from_secs(secs);
        }
        Ok(self)
    }
}

fn parse_timeout(raw: &str) -> Result<u64> {
    let secs = raw
        .trim()
        .parse::<u64>()
        .context("REQUEST_TIMEOUT_SECS must be a whole number of seconds")?;
    if secs == 0 {
        bail!("REQUEST_TIMEOUT_SECS must be greater than zero");
    }
    Ok(secs)
}

pub(crate) fn normalize_base(base: &str) -> String {
    base.trim().trim_end_matches('/').to_string()
}
