//! Embedded document engine: bson documents queried with `$`-operator filter documents.
//! Backs [`DocumentAdapter`](crate::adapters::DocumentAdapter) when no external store is
//! attached.

mod collection;
mod eval;
mod parse;

pub use collection::{Collection, FindOptions};
pub use eval::{compare_bson, compare_docs, eval_predicate, get_path};
pub use parse::{CmpOp, Predicate, json_to_bson, parse_filter, parse_filter_json};
