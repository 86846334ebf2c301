//! Load-time invariants that table constraints cannot express.
//!
//! SQLite already rejects dangling keys and duplicate unique values while
//! loading. What remains are cardinality rules ("exactly one default form",
//! "one or two contiguous type slots") plus a foreign-key sweep for databases
//! that were written with enforcement off.

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::fmt;

use crate::model::{FormId, GameId, GenerationId, PokemonId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Species without exactly one default form (zero covers "no forms at all")
    DefaultFormCount { pokemon_id: PokemonId, defaults: i64 },
    DuplicateOrder { table: &'static str, order: i64, count: i64 },
    /// Generation appearance whose types are not slots 1..=n with n in {1, 2}
    TypeSlots {
        generation_id: GenerationId,
        pokemon_id: PokemonId,
        form_id: FormId,
        types: i64,
        max_slot: i64,
    },
    GameGeneration {
        game_id: GameId,
        pokemon_id: PokemonId,
        form_id: FormId,
        game_generation_id: GenerationId,
        recorded_generation_id: GenerationId,
    },
    ForeignKey {
        table: String,
        rowid: Option<i64>,
        parent: String,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::DefaultFormCount {
                pokemon_id,
                defaults,
            } => write!(
                f,
                "pokemon {} has {} default forms, expected exactly one",
                pokemon_id, defaults
            ),
            Violation::DuplicateOrder {
                table,
                order,
                count,
            } => write!(f, "{}: order {} used {} times", table, order, count),
            Violation::TypeSlots {
                generation_id,
                pokemon_id,
                form_id,
                types,
                max_slot,
            } => write!(
                f,
                "form ({}, {}) in generation {} has {} types (highest slot {})",
                pokemon_id, form_id, generation_id, types, max_slot
            ),
            Violation::GameGeneration {
                game_id,
                pokemon_id,
                form_id,
                game_generation_id,
                recorded_generation_id,
            } => write!(
                f,
                "form ({}, {}) in game {} records generation {} but the game is generation {}",
                pokemon_id, form_id, game_id, recorded_generation_id, game_generation_id
            ),
            Violation::ForeignKey {
                table,
                rowid,
                parent,
            } => match rowid {
                Some(rowid) => write!(f, "{} row {} has no parent in {}", table, rowid, parent),
                None => write!(f, "{} row has no parent in {}", table, parent),
            },
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }
}

fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Check every invariant whose tables are present in the database
pub fn validate_database(conn: &Connection) -> Result<ValidationReport> {
    let mut report = ValidationReport::default();
    let has = |name: &str| table_exists(conn, name);

    if has("pokemon")? && has("pokemon_forms")? {
        check_default_forms(conn, &mut report).context("default form check")?;
    }
    for table in ["pokemon", "pokemon_forms"] {
        if has(table)? {
            check_unique_order(conn, table, &mut report).context("order check")?;
        }
    }
    if has("generation_pokemon_forms")? && has("pokemon_types")? {
        check_type_slots(conn, &mut report).context("type slot check")?;
    }
    if has("game_pokemon_forms")? && has("games")? {
        check_game_generations(conn, &mut report).context("game generation check")?;
    }
    check_foreign_keys(conn, &mut report).context("foreign key check")?;

    Ok(report)
}

fn check_default_forms(conn: &Connection, report: &mut ValidationReport) -> Result<()> {
    let mut stmt = conn.prepare(
        "SELECT p.id, COALESCE(SUM(pf.is_default), 0) AS defaults
         FROM pokemon p
         LEFT JOIN pokemon_forms pf ON pf.pokemon_id = p.id
         GROUP BY p.id
         HAVING defaults != 1
         ORDER BY p.id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(Violation::DefaultFormCount {
            pokemon_id: row.get(0)?,
            defaults: row.get(1)?,
        })
    })?;
    for violation in rows {
        report.violations.push(violation?);
    }
    Ok(())
}

fn check_unique_order(
    conn: &Connection,
    table: &'static str,
    report: &mut ValidationReport,
) -> Result<()> {
    let sql = format!(
        "SELECT \"order\", COUNT(*) FROM \"{}\" GROUP BY \"order\" HAVING COUNT(*) > 1",
        table
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| {
        Ok(Violation::DuplicateOrder {
            table,
            order: row.get(0)?,
            count: row.get(1)?,
        })
    })?;
    for violation in rows {
        report.violations.push(violation?);
    }
    Ok(())
}

fn check_type_slots(conn: &Connection, report: &mut ValidationReport) -> Result<()> {
    let mut stmt = conn.prepare(
        "SELECT g.generation_id, g.pokemon_id, g.form_id,
                COUNT(pt.slot) AS types, COALESCE(MAX(pt.slot), 0) AS max_slot
         FROM generation_pokemon_forms g
         LEFT JOIN pokemon_types pt
           ON pt.generation_id = g.generation_id
          AND pt.pokemon_id = g.pokemon_id
          AND pt.form_id = g.form_id
         GROUP BY g.generation_id, g.pokemon_id, g.form_id
         HAVING types NOT IN (1, 2) OR max_slot != types
         ORDER BY g.pokemon_id, g.form_id, g.generation_id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(Violation::TypeSlots {
            generation_id: row.get(0)?,
            pokemon_id: row.get(1)?,
            form_id: row.get(2)?,
            types: row.get(3)?,
            max_slot: row.get(4)?,
        })
    })?;
    for violation in rows {
        report.violations.push(violation?);
    }
    Ok(())
}

fn check_game_generations(conn: &Connection, report: &mut ValidationReport) -> Result<()> {
    let mut stmt = conn.prepare(
        "SELECT gpf.game_id, gpf.pokemon_id, gpf.form_id, g.generation_id, gpf.generation_id
         FROM game_pokemon_forms gpf
         JOIN games g ON g.id = gpf.game_id
         WHERE g.generation_id != gpf.generation_id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(Violation::GameGeneration {
            game_id: row.get(0)?,
            pokemon_id: row.get(1)?,
            form_id: row.get(2)?,
            game_generation_id: row.get(3)?,
            recorded_generation_id: row.get(4)?,
        })
    })?;
    for violation in rows {
        report.violations.push(violation?);
    }
    Ok(())
}

fn check_foreign_keys(conn: &Connection, report: &mut ValidationReport) -> Result<()> {
    let mut stmt = conn.prepare("PRAGMA foreign_key_check")?;
    let rows = stmt.query_map([], |row| {
        Ok(Violation::ForeignKey {
            table: row.get(0)?,
            rowid: row.get(1)?,
            parent: row.get(2)?,
        })
    })?;
    for violation in rows {
        report.violations.push(violation?);
    }
    Ok(())
}
