pub mod metadata;
pub mod project;
