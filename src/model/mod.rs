//! Model capability consumed by the query layer, plus the clock used for bookkeeping
//! timestamps and the demonstration `User` model.

mod clock;
mod record;
mod user;

pub use clock::{Clock, FixedClock, SystemClock};
pub use record::{CREATED_AT, Model, UPDATED_AT};
pub(crate) use record::{coerce, normalize, project, verify_attributes};
pub use user::{User, users_table_ddl};
