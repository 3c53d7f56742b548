use std::fs::File;
use std::io::{BufReader, BufWriter, Write};

use serde::Serialize;

use crate::backend::{AnyBackend, MemoryBackend, SalesBackend, SqliteBackend};
use crate::config::{AppConfig, BackendKind};
use crate::errors::QueryError;
use crate::import::{DataSource, write_sample};
use crate::service::QueryService;

use super::command::Command;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum OutputMode {
    /// One JSON document per line.
    #[default]
    Json,
    /// Indented JSON for people.
    Pretty,
}

fn emit<W: Write, T: Serialize>(out: &mut W, mode: OutputMode, value: &T) -> Result<(), QueryError> {
    match mode {
        OutputMode::Json => serde_json::to_writer(&mut *out, value)?,
        OutputMode::Pretty => serde_json::to_writer_pretty(&mut *out, value)?,
    }
    writeln!(out)?;
    Ok(())
}

/// The backend `cfg` selects, reading from `cfg.data_path()`.
pub async fn build_backend(cfg: &AppConfig) -> Result<AnyBackend, QueryError> {
    let source = DataSource::csv(cfg.data_path());
    Ok(match cfg.backend() {
        BackendKind::Memory => AnyBackend::Memory(MemoryBackend::new(source)),
        BackendKind::Sqlite => {
            AnyBackend::Sqlite(SqliteBackend::connect(cfg.database_url(), Some(source)).await?)
        }
    })
}

async fn service(cfg: &AppConfig) -> Result<QueryService<AnyBackend>, QueryError> {
    Ok(QueryService::new(build_backend(cfg).await?).with_policy(cfg.paging_policy()))
}

/// Execute `cmd` and write its JSON output to `out`.
pub async fn run<W: Write>(
    cmd: Command,
    cfg: &AppConfig,
    mode: OutputMode,
    out: &mut W,
) -> Result<(), QueryError> {
    match cmd {
        Command::Query(raw) => {
            let svc = service(cfg).await?;
            svc.initialize().await?;
            emit(out, mode, &svc.query(&raw).await?)
        }
        Command::Catalog => {
            let svc = service(cfg).await?;
            svc.initialize().await?;
            emit(out, mode, &svc.catalog()?)
        }
        Command::Health => {
            let svc = service(cfg).await?;
            if let Err(e) = svc.initialize().await {
                log::warn!("health: dataset not loaded: {e}");
            }
            emit(out, mode, &svc.health())
        }
        Command::Import { csv } => {
            let url = cfg.database_url();
            if url == crate::config::DEFAULT_DATABASE_URL {
                log::warn!("importing into an in-memory database; nothing will persist");
            }
            let backend = SqliteBackend::connect(url, Some(DataSource::csv(&csv))).await?;
            let records = backend.load().await?;
            emit(out, mode, &serde_json::json!({ "database": url, "records": records }))
        }
        Command::Sample { input, output, rows } => {
            let reader = BufReader::new(File::open(&input)?);
            let writer = BufWriter::new(File::create(&output)?);
            let written = write_sample(reader, writer, rows)?;
            emit(out, mode, &serde_json::json!({ "output": output, "rows": written }))
        }
    }
}
