//! Storage-agnostic repositories with a chainable query cursor.
//!
//! A [`Repository`] wraps one [`Adapter`] (in-memory, SQLite, or a document collection)
//! and exposes the same create/update/remove and query surface over all of them:
//!
//! ```
//! use repokit::{attrs, Repository, adapters::MemoryAdapter, model::User};
//!
//! let users = Repository::new(MemoryAdapter::<User>::new());
//! users.create(attrs! { "name" => "John", "age" => 18 })?;
//! users.create(attrs! { "name" => "Jane", "age" => 25 })?;
//! assert_eq!(users.lt("age", 20)?.count()?, 1);
//! # Ok::<(), repokit::RepoError>(())
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod docstore;
pub mod errors;
pub mod model;
pub mod query;
pub mod repository;
pub mod types;
pub mod utils;

pub use errors::{RepoError, Result};
pub use model::{Clock, Model};
pub use query::{Cursor, Filter, FilterFactory, Order, Query, QueryExecutor};
pub use repository::{Adapter, Repository};
pub use types::{Attributes, Value};
