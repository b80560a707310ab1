use std::error::Error;
use std::io::Write;

use crate::adapters::{DocumentAdapter, MemoryAdapter, SqlAdapter};
use crate::config::{Backend, RepoConfig};
use crate::docstore::Collection;
use crate::model::{Model, User, users_table_ddl};
use crate::query::{Cursor, Filter};
use crate::repository::{Adapter, Repository};
use crate::types::Value;

use super::command::Command;
use super::util::{parse_filters, parse_records, parse_sort};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputMode {
    Human,
    Plain,
    Json,
}

fn filters_of(json: Option<&str>) -> crate::errors::Result<Vec<Filter>> {
    json.map_or_else(|| Ok(Vec::new()), parse_filters)
}

fn cursor<'a, A: Adapter>(
    repo: &'a Repository<A>,
    filter_json: Option<&str>,
    sort: &[String],
) -> crate::errors::Result<Cursor<'a, A>> {
    let mut cursor = filters_of(filter_json)?.into_iter().fold(repo.find(), Cursor::filter);
    for key in sort {
        let (field, order) = parse_sort(key)?;
        cursor = cursor.sort(&field, order)?;
    }
    Ok(cursor)
}

fn emit_records<M: Model>(out: &mut dyn Write, mode: OutputMode, records: &[M]) -> std::io::Result<()> {
    for record in records {
        let attrs = record.to_attributes();
        match mode {
            OutputMode::Json => writeln!(out, "{}", serde_json::to_string(&attrs)?)?,
            OutputMode::Plain => {
                let cells: Vec<String> = attrs.values().map(ToString::to_string).collect();
                writeln!(out, "{}", cells.join("\t"))?;
            }
            OutputMode::Human => {
                let pairs: Vec<String> = attrs.iter().map(|(k, v)| format!("{k}={}", v.inspect())).collect();
                writeln!(out, "{}", pairs.join(" "))?;
            }
        }
    }
    Ok(())
}

fn emit_one<M: Model>(out: &mut dyn Write, mode: OutputMode, record: Option<M>) -> std::io::Result<()> {
    match (record, mode) {
        (Some(r), _) => emit_records(out, mode, &[r]),
        (None, OutputMode::Json) => writeln!(out, "null"),
        (None, _) => writeln!(out, "no record"),
    }
}

fn emit_count(out: &mut dyn Write, mode: OutputMode, action: &str, count: u64) -> std::io::Result<()> {
    match mode {
        OutputMode::Json => writeln!(out, "{}", serde_json::json!({ "action": action, "count": count })),
        OutputMode::Plain => writeln!(out, "{count}"),
        OutputMode::Human => writeln!(out, "{action} count={count}"),
    }
}

/// Runs `cmd` with human readable output.
///
/// # Errors
/// Invalid command input, backend failures and write failures.
pub fn run<A: Adapter>(repo: &Repository<A>, cmd: Command, out: &mut dyn Write) -> Result<(), Box<dyn Error>> {
    run_with_format(repo, cmd, OutputMode::Human, out)
}

/// # Errors
/// Invalid command input, backend failures and write failures.
pub fn run_with_format<A: Adapter>(
    repo: &Repository<A>,
    cmd: Command,
    mode: OutputMode,
    out: &mut dyn Write,
) -> Result<(), Box<dyn Error>> {
    match cmd {
        Command::Seed { records_json } => {
            let mut created = Vec::new();
            for attrs in parse_records(&records_json)? {
                created.push(repo.create(attrs)?);
            }
            log::info!("seeded {} records", created.len());
            match mode {
                OutputMode::Json => emit_records(out, mode, &created)?,
                _ => emit_count(out, mode, "seeded", created.len() as u64)?,
            }
        }
        Command::Find { filter_json, sort, limit, offset } => {
            let mut cur = cursor(repo, filter_json.as_deref(), &sort)?;
            if let Some(n) = limit {
                cur = cur.limit(Value::try_from(n)?)?;
            }
            if let Some(n) = offset {
                cur = cur.offset(Value::try_from(n)?)?;
            }
            emit_records(out, mode, &cur.all()?)?;
        }
        Command::Count { filter_json } => {
            let n = cursor(repo, filter_json.as_deref(), &[])?.count()?;
            emit_count(out, mode, "count", n)?;
        }
        Command::First { filter_json, sort } => {
            emit_one(out, mode, cursor(repo, filter_json.as_deref(), &sort)?.first()?)?;
        }
        Command::Last { filter_json, sort } => {
            emit_one(out, mode, cursor(repo, filter_json.as_deref(), &sort)?.last()?)?;
        }
        Command::Remove { filter_json } => {
            let cur = cursor(repo, filter_json.as_deref(), &[])?;
            let n = cur.count()?;
            cur.remove()?;
            log::info!("removed {n} records");
            emit_count(out, mode, "removed", n)?;
        }
    }
    Ok(())
}

fn seed_then_run<A: Adapter>(
    repo: &Repository<A>,
    seed: Option<&str>,
    cmd: Command,
    mode: OutputMode,
    out: &mut dyn Write,
) -> Result<(), Box<dyn Error>> {
    if let Some(records) = seed {
        for attrs in parse_records(records)? {
            repo.create(attrs)?;
        }
    }
    run_with_format(repo, cmd, mode, out)
}

/// Wires a [`User`] repository to the configured backend, loads `seed` records into
/// it, then runs `cmd`.
///
/// The memory and document backends live only for this call.
///
/// # Errors
/// Backend setup failures plus anything [`run_with_format`] reports.
pub fn run_with_config(
    config: &RepoConfig,
    seed: Option<&str>,
    cmd: Command,
    mode: OutputMode,
    out: &mut dyn Write,
) -> Result<(), Box<dyn Error>> {
    let primary_key = config.primary_key.as_deref().unwrap_or(User::ID_FIELD);
    log::debug!("running against {} backend", config.backend);
    match config.backend {
        Backend::Memory => {
            let adapter = MemoryAdapter::<User>::new().with_primary_key(primary_key);
            seed_then_run(&Repository::new(adapter), seed, cmd, mode, out)
        }
        Backend::Sqlite => {
            let adapter = match &config.sqlite_path {
                Some(path) => SqlAdapter::<User>::open(path, &config.table)?,
                None => SqlAdapter::<User>::open_in_memory(&config.table)?,
            }
            .with_primary_key(primary_key);
            adapter.execute_batch(&users_table_ddl(&config.table))?;
            seed_then_run(&Repository::new(adapter), seed, cmd, mode, out)
        }
        Backend::Document => {
            let adapter = DocumentAdapter::<_, User>::new(Collection::new(&config.collection))
                .with_primary_key(primary_key);
            seed_then_run(&Repository::new(adapter), seed, cmd, mode, out)
        }
    }
}
