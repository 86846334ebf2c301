use anyhow::{Context, Result};
use rusqlite::Connection;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, warn};

use super::schema_gen::{generate_create_table, generate_indexes, quote_ident};
use crate::parser::{parse_records, ParsedRow, SqlValue};
use crate::schema::TableSchema;
use crate::ui::{Phase, Ui};
use crate::validate::{validate_database, ValidationReport};

const BATCH_SIZE: usize = 1000;

pub struct SqliteWriter {
    conn: Connection,
}

impl SqliteWriter {
    /// Create a fresh database file, replacing any existing one
    pub fn new(db_path: &Path) -> Result<Self> {
        if db_path.exists() {
            std::fs::remove_file(db_path).context("Failed to remove existing database")?;
        }

        let conn = Connection::open(db_path).context("Failed to create database")?;
        Self::with_connection(conn)
    }

    /// Wrap an already open connection (e.g. in-memory for tests)
    pub fn with_connection(conn: Connection) -> Result<Self> {
        // Foreign keys are what reject dangling composite keys at load time
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -64000;",
        )?;

        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Create all tables for the given schemas
    pub fn create_tables(&self, schemas: &[&TableSchema]) -> Result<()> {
        info!(count = schemas.len(), "creating tables");

        for schema in schemas {
            let sql = generate_create_table(schema);
            debug!(table = schema.name, %sql, "create table");
            self.conn
                .execute(&sql, [])
                .with_context(|| format!("Failed to create table: {}", schema.name))?;

            for index_sql in generate_indexes(schema) {
                self.conn
                    .execute(&index_sql, [])
                    .with_context(|| format!("Failed to create index for: {}", schema.name))?;
            }
        }

        Ok(())
    }

    /// Import data from a JSONL file for a single table, in one transaction
    pub fn import_table(
        &mut self,
        schema: &TableSchema,
        input_dir: &Path,
        ui: &mut impl Ui,
    ) -> Result<u64> {
        let file_path = input_dir.join(schema.source_file);

        if !file_path.exists() {
            warn!(table = schema.name, file = %file_path.display(), "source file not found, skipping");
            ui.log(format!("{}: skipped (file not found)", schema.name));
            return Ok(0);
        }

        let total_lines = count_lines(&file_path)?;
        let file = File::open(&file_path)
            .with_context(|| format!("Failed to open: {:?}", file_path))?;
        let reader = BufReader::new(file);

        let columns = schema.column_names();
        let insert_sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(schema.name),
            columns
                .iter()
                .map(|c| quote_ident(c))
                .collect::<Vec<_>>()
                .join(", "),
            vec!["?"; columns.len()].join(", ")
        );

        let tx = self.conn.transaction()?;
        let mut count: u64 = 0;
        let mut batch: Vec<ParsedRow> = Vec::with_capacity(BATCH_SIZE);

        for (line_no, line) in reader.lines().enumerate() {
            let line = line.context("Failed to read line")?;
            if line.trim().is_empty() {
                continue;
            }

            let rows = parse_records(&line, schema).with_context(|| {
                format!("Failed to parse {} line {}", schema.source_file, line_no + 1)
            })?;
            batch.extend(rows);

            if batch.len() >= BATCH_SIZE {
                count += insert_batch(&tx, &insert_sql, &columns, &batch)
                    .with_context(|| format!("Failed to insert into {}", schema.name))?;
                batch.clear();
            }
            ui.set_progress(line_no as u64 + 1, total_lines, schema.name);
        }

        if !batch.is_empty() {
            count += insert_batch(&tx, &insert_sql, &columns, &batch)
                .with_context(|| format!("Failed to insert into {}", schema.name))?;
        }

        // Deferred constraints (pokemon.preevolution_id) are checked here
        tx.commit()
            .with_context(|| format!("Constraint violation committing {}", schema.name))?;

        info!(table = schema.name, rows = count, "loaded");
        ui.log(format!("{}: {} rows", schema.name, count));

        Ok(count)
    }

    /// Run the invariants SQLite constraints cannot express
    pub fn validate(&self) -> Result<ValidationReport> {
        validate_database(&self.conn)
    }

    /// Finalize the database
    pub fn finalize(self) -> Result<()> {
        self.conn.execute_batch("PRAGMA optimize;")?;
        Ok(())
    }
}

fn count_lines(path: &Path) -> Result<u64> {
    let file = File::open(path).with_context(|| format!("Failed to open: {:?}", path))?;
    Ok(BufReader::new(file).lines().count() as u64)
}

/// Insert a batch of rows, returning how many were written
fn insert_batch(
    tx: &rusqlite::Transaction,
    sql: &str,
    columns: &[&str],
    batch: &[ParsedRow],
) -> Result<u64> {
    let mut stmt = tx.prepare_cached(sql)?;

    for row in batch {
        for (idx, col_name) in columns.iter().enumerate() {
            row.values
                .get(*col_name)
                .unwrap_or(&SqlValue::Null)
                .bind_to(idx + 1, &mut stmt)?;
        }
        stmt.raw_execute()?;
    }

    Ok(batch.len() as u64)
}

/// Summary of a completed load
#[derive(Debug, Clone)]
pub struct LoadSummary {
    pub tables: usize,
    pub rows: u64,
    pub report: ValidationReport,
}

/// Create tables, bulk-load JSONL files and validate the result
pub fn convert_to_sqlite(
    input_dir: &Path,
    output_db: &Path,
    tables: Vec<&TableSchema>,
    ui: &mut impl Ui,
) -> Result<LoadSummary> {
    let mut writer = SqliteWriter::new(output_db)?;
    let summary = load_into(&mut writer, input_dir, &tables, ui)?;
    writer.finalize()?;
    Ok(summary)
}

/// Same as [`convert_to_sqlite`] against an existing writer
pub fn load_into(
    writer: &mut SqliteWriter,
    input_dir: &Path,
    tables: &[&TableSchema],
    ui: &mut impl Ui,
) -> Result<LoadSummary> {
    ui.set_phase(Phase::CreatingTables);
    writer.create_tables(tables)?;

    ui.set_phase(Phase::Loading);
    let mut rows: u64 = 0;
    for schema in tables {
        ui.set_info(format!("Loading {}", schema.name));
        rows += writer.import_table(schema, input_dir, ui)?;
    }
    ui.clear_progress();

    ui.set_phase(Phase::Validating);
    let report = writer.validate()?;
    for violation in &report.violations {
        warn!(%violation, "invariant violated");
        ui.log(violation.to_string());
    }

    Ok(LoadSummary {
        tables: tables.len(),
        rows,
        report,
    })
}
