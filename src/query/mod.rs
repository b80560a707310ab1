//! Query model: the filter tree, its validating factory, and the cursor that collects
//! constraints before handing them to a backend.

mod cursor;
mod eval;
mod factory;
mod filter;
mod types;

pub use cursor::{Cursor, QueryExecutor};
pub use eval::{compare_records, matches, matches_all};
pub use factory::FilterFactory;
pub use filter::{Filter, Membership};
pub use types::{FieldName, IntoOrder, NonNullValue, Operator, Order, Query, Sort, default_sorts};
