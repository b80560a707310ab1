//! Utility modules: logger setup and the query trace sink.
pub mod devlog;
pub mod logger;
