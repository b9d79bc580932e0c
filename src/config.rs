use std::time::Duration;

use crate::models::Language;

/// Application-level constants
pub const APP_NAME: &str = "ContaSfera";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Columns used by a table that has no rows to derive them from.
pub const DEFAULT_COLUMNS: [&str; 2] = ["Column 1", "Column 2"];

/// Largest upload accepted for recognition.
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024; // 100MB

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "contasfera_lib=info,contasfera=info,warn"
}

pub fn default_columns() -> Vec<String> {
    DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect()
}

/// Runtime settings for one review session.
#[derive(Debug, Clone)]
pub struct ReviewConfig {
    /// Lower bound of the simulated recognition delay.
    pub ingest_delay_min: Duration,
    /// Upper bound of the simulated recognition delay.
    pub ingest_delay_max: Duration,
    /// Recognition that takes longer than this fails with `IngestTimedOut`.
    pub ingest_timeout: Duration,
    pub max_file_size_bytes: u64,
    /// Conversion endpoint receiving the edited table.
    pub export_endpoint: String,
    pub export_timeout: Duration,
    pub language: Language,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            ingest_delay_min: Duration::from_millis(1000),
            ingest_delay_max: Duration::from_millis(2500),
            ingest_timeout: Duration::from_secs(30),
            max_file_size_bytes: MAX_FILE_SIZE,
            export_endpoint: "http://localhost:5000/download".into(),
            export_timeout: Duration::from_secs(60),
            language: Language::default(),
        }
    }
}

impl ReviewConfig {
    /// Defaults without the simulated recognition delay.
    pub fn instant() -> Self {
        Self {
            ingest_delay_min: Duration::ZERO,
            ingest_delay_max: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Defaults overridden by `CONTASFERA_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a key lookup. Unparsable values are logged and skipped.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("CONTASFERA_EXPORT_URL") {
            let url = url.trim();
            if url.is_empty() {
                tracing::warn!("Ignoring empty CONTASFERA_EXPORT_URL");
            } else {
                self.export_endpoint = url.to_string();
            }
        }
        if let Some(secs) = parse_secs(&lookup, "CONTASFERA_EXPORT_TIMEOUT_SECS") {
            self.export_timeout = secs;
        }
        if let Some(secs) = parse_secs(&lookup, "CONTASFERA_INGEST_TIMEOUT_SECS") {
            self.ingest_timeout = secs;
        }
        if let Some(lang) = lookup("CONTASFERA_LANG") {
            match lang.trim().parse::<Language>() {
                Ok(language) => self.language = language,
                Err(e) => tracing::warn!(error = %e, "Ignoring CONTASFERA_LANG"),
            }
        }
        self
    }
}

fn parse_secs<F>(lookup: &F, key: &str) -> Option<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
        _ => {
            tracing::warn!(key, value = %raw, "Ignoring invalid timeout override");
            None
        }
    }
}
