pub mod consistency;
pub mod delimiter;
pub mod encoding;
pub mod header;
pub mod import_flow;
pub mod project;
pub mod registry;
pub mod statistics;
pub mod structure_scan;
pub mod type_inference;
