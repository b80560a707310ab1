mod command;
mod runner;
mod util;

pub use command::Command;
pub use runner::{OutputMode, run, run_with_config, run_with_format};
pub use util::{parse_filters, parse_records, parse_sort};
