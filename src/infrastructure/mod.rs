// ============================================================
// INFRASTRUCTURE LAYER
// ============================================================
// Everything that touches the outside world: configuration, the
// filesystem workspace, remote fetches, SQLite, and the external
// pipeline interpreter

pub mod config;
pub mod db;
pub mod fetch;
pub mod pipeline;
pub mod storage;

pub use config::AppConfig;
pub use fetch::Fetcher;
pub use pipeline::{render_pipeline, run_pipeline, PipelineRun};
