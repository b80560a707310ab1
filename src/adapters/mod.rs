//! Backend adapters. Each one executes the same [`Query`](crate::query::Query) with the
//! same null rules against a different storage engine.

pub mod document;
pub mod memory;
pub mod sql;

pub use document::{DocumentAdapter, DocumentCollection};
pub use memory::MemoryAdapter;
pub use sql::SqlAdapter;
