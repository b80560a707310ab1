use clap::{Parser, Subcommand, ValueEnum};
use repokit::cli::{self as prog_cli, Command, OutputMode};
use repokit::config::{Backend, RepoConfig};
use repokit::utils::logger;
use std::io::IsTerminal;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "repokit", version, about = "Query users through a repository backend", long_about = None)]
struct Cli {
    #[arg(long, help = "Path to a config file (TOML). Otherwise REPOKIT_CONFIG or repokit.toml is used.")]
    config: Option<PathBuf>,
    #[arg(long, help = "Backend: memory|sqlite|document. Takes precedence over config/env.")]
    backend: Option<String>,
    #[arg(long, help = "SQLite database file for the sqlite backend")]
    sqlite_path: Option<PathBuf>,
    #[arg(long, help = "Table name for the sqlite backend")]
    table: Option<String>,
    #[arg(long, help = "JSON array of records to create before running the command")]
    seed: Option<String>,
    #[arg(long, value_enum, help = "Output format; defaults to human on a terminal, json otherwise")]
    output: Option<OutputArg>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OutputArg {
    Human,
    Plain,
    Json,
}

impl From<OutputArg> for OutputMode {
    fn from(arg: OutputArg) -> Self {
        match arg {
            OutputArg::Human => Self::Human,
            OutputArg::Plain => Self::Plain,
            OutputArg::Json => Self::Json,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Create records from a JSON array of attribute objects")]
    Seed {
        #[arg(help = "Records JSON (e.g., [{\"name\": \"John\", \"age\": 30}])")]
        records: String,
    },
    #[command(about = "Find records matching a filter")]
    Find {
        #[arg(long, help = "Filter JSON (e.g., {\"age\": {\"gte\": 21}})")]
        filter: Option<String>,
        #[arg(long, help = "Sort as field or field:asc|desc; repeatable")]
        sort: Vec<String>,
        #[arg(long)]
        limit: Option<u64>,
        #[arg(long)]
        offset: Option<u64>,
    },
    #[command(about = "Count records matching a filter")]
    Count {
        #[arg(long)]
        filter: Option<String>,
    },
    #[command(about = "First record in sort order (earliest created by default)")]
    First {
        #[arg(long)]
        filter: Option<String>,
        #[arg(long)]
        sort: Vec<String>,
    },
    #[command(about = "Last record in sort order (most recently created by default)")]
    Last {
        #[arg(long)]
        filter: Option<String>,
        #[arg(long)]
        sort: Vec<String>,
    },
    #[command(about = "Remove records matching a filter")]
    Remove {
        #[arg(long)]
        filter: Option<String>,
    },
}

impl From<Commands> for Command {
    fn from(cmd: Commands) -> Self {
        match cmd {
            Commands::Seed { records } => Self::Seed { records_json: records },
            Commands::Find { filter, sort, limit, offset } => Self::Find { filter_json: filter, sort, limit, offset },
            Commands::Count { filter } => Self::Count { filter_json: filter },
            Commands::First { filter, sort } => Self::First { filter_json: filter, sort },
            Commands::Last { filter, sort } => Self::Last { filter_json: filter, sort },
            Commands::Remove { filter } => Self::Remove { filter_json: filter },
        }
    }
}

fn init_logging(cfg: &RepoConfig) -> Result<(), Box<dyn std::error::Error>> {
    match &cfg.log_dir {
        Some(dir) => logger::configure_logging(Some(dir.as_path()), cfg.log_level.as_deref(), None),
        None if std::env::var_os("REPOKIT_LOG_DIR").is_some() => logger::configure_from_env(),
        None => Ok(()),
    }
}

fn main() {
    let cli = Cli::parse();
    let mut cfg = match RepoConfig::load(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };
    // CLI flags win over config files and environment
    if let Some(b) = &cli.backend {
        match b.parse::<Backend>() {
            Ok(b) => cfg.backend = b,
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(2);
            }
        }
    }
    if let Some(p) = cli.sqlite_path {
        cfg.sqlite_path = Some(p);
    }
    if let Some(t) = cli.table {
        cfg.table = t;
    }
    if let Err(e) = init_logging(&cfg) {
        eprintln!("logging disabled: {e}");
    }

    let mode = cli.output.map_or_else(
        || if std::io::stdout().is_terminal() { OutputMode::Human } else { OutputMode::Json },
        OutputMode::from,
    );
    let mut stdout = std::io::stdout().lock();
    if let Err(e) = prog_cli::run_with_config(&cfg, cli.seed.as_deref(), cli.command.into(), mode, &mut stdout) {
        log::error!("command failed: {e}");
        eprintln!("{e}");
        std::process::exit(1);
    }
}
