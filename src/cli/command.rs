/// One CLI action against a repository. Filter and record arguments are raw JSON text,
/// parsed when the command runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Seed {
        records_json: String,
    },
    Find {
        filter_json: Option<String>,
        // `field` or `field:asc|desc`
        sort: Vec<String>,
        limit: Option<u64>,
        offset: Option<u64>,
    },
    Count {
        filter_json: Option<String>,
    },
    First {
        filter_json: Option<String>,
        sort: Vec<String>,
    },
    Last {
        filter_json: Option<String>,
        sort: Vec<String>,
    },
    Remove {
        filter_json: Option<String>,
    },
}
