// ============================================================
// DOMAIN LAYER
// ============================================================
// Core types and value objects for the CSV import workflow
// No I/O, no async, no external services

pub mod constraint;
pub mod error;
pub mod session;
pub mod staged;
pub mod value_type;

pub use constraint::{Constraint, ConstraintRule};
pub use error::{AppError, Result};
pub use session::ImportSession;
pub use staged::{column_label, RowId, StagedAction};
pub use value_type::{BaseType, ColumnType, ValueType, BUILTIN_TYPE_NAMES};
