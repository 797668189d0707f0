//! Operations - request-scoped work, as opposed to long-lived services

pub mod import;

pub use import::{BatchImportPipeline, ImportError};
