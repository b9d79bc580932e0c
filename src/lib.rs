pub mod classify;
pub mod config;
pub mod error;
pub mod export;
pub mod i18n;
pub mod models;
pub mod registry;
pub mod review;

pub use error::ReviewError;
pub use registry::{ChangeEvent, ChangeKind, RecordFilter, Registry, RegistryStats};
pub use review::{IncomingFile, IngestState, KeywordRecognizer, Recognizer, ReviewWorkflow};

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` wins over the default filter.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();
}
