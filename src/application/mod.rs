// ============================================================
// APPLICATION LAYER
// ============================================================
// Use cases orchestrating the domain types: the inference stages,
// the registry, and the consistency engine

pub mod use_cases;

pub use use_cases::consistency::ConsistencyEngine;
pub use use_cases::import_flow::{run_inference, InferenceOutcome};
pub use use_cases::registry::Registry;
