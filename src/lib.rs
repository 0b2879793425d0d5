// ============================================================
// CSVFORGE
// ============================================================
// CSV structural inference and import engine: encoding, preamble,
// delimiter, enclosing, header and column-type detection, a custom
// value-type registry, and the staged-edit consistency engine that
// the desktop shell renders.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;

pub use application::{run_inference, ConsistencyEngine, InferenceOutcome, Registry};
pub use domain::{AppError, ImportSession, Result};
pub use infrastructure::AppConfig;
pub use interfaces::Interaction;

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// `info` level. Calling it twice is a no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
