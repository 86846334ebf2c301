//! Integration tests against the fixture dataset in `tests/fixtures/`.
//!
//! These tests:
//! 1. Load the fixture JSONL files into a temporary SQLite database
//! 2. Compare sampled JSONL records with the rows they produced
//! 3. Exercise constraints, cascades and generation-scoped type resolution
//! 4. Check that keyed SQL, batch SQL and the in-memory catalog agree

use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rusqlite::Connection;
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;
use tempfile::{NamedTempFile, TempDir};

use porydex_db::context::Session;
use porydex_db::download::prepare_input;
use porydex_db::filter::resolve_tables;
use porydex_db::model::{ByLanguage, Catalog, GenerationId, Type};
use porydex_db::schema::tables::ALL_TABLES;
use porydex_db::store::{FormQuery, Store};
use porydex_db::ui::SilentUi;
use porydex_db::validate::validate_database;
use porydex_db::writer::{convert_to_sqlite, LoadSummary, SqliteWriter};

// =============================================================================
// Test Configuration
// =============================================================================

/// Number of random samples per table
const SAMPLE_SIZE: usize = 5;

/// Random seed for reproducible sampling
const RANDOM_SEED: u64 = 42;

const JA: i64 = 1;
const FR: i64 = 5;
const EN: i64 = 9;

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

// =============================================================================
// Shared Test Database
// =============================================================================

/// Shared test database - loaded once and reused by the read-only tests
static TEST_DB: Lazy<Mutex<TestDatabase>> = Lazy::new(|| Mutex::new(TestDatabase::new()));

struct TestDatabase {
    _temp_file: NamedTempFile,
    db_path: PathBuf,
    summary: LoadSummary,
}

impl TestDatabase {
    fn new() -> Self {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let db_path = temp_file.path().to_path_buf();
        let summary = load_fixtures(&db_path);

        Self {
            _temp_file: temp_file,
            db_path,
            summary,
        }
    }
}

fn load_fixtures(db_path: &Path) -> LoadSummary {
    let tables: Vec<_> = ALL_TABLES.iter().copied().collect();
    convert_to_sqlite(&fixtures_dir(), db_path, tables, &mut SilentUi::new())
        .expect("Failed to load fixtures")
}

fn get_test_db_path() -> PathBuf {
    TEST_DB.lock().unwrap().db_path.clone()
}

fn get_store() -> Store {
    Store::open(&get_test_db_path())
        .expect("Failed to open test database")
        .with_fallback_language(Some("en"))
        .expect("Fixture has no 'en' language")
}

/// A private, writable copy of the fixture database
fn writable_fixture_db() -> (TempDir, Connection) {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("fixture.db");
    load_fixtures(&db_path);
    let conn = Connection::open(&db_path).unwrap();
    conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
    (dir, conn)
}

fn count(conn: &Connection, sql: &str) -> i64 {
    conn.query_row(sql, [], |row| row.get(0)).unwrap()
}

fn identifiers(types: &[Type]) -> Vec<&str> {
    types.iter().map(|t| t.identifier.as_str()).collect()
}

// =============================================================================
// Sampling Utilities
// =============================================================================

/// Sample random lines from a fixture JSONL file
fn sample_jsonl_lines(filename: &str, count: usize) -> Vec<Value> {
    let file = File::open(fixtures_dir().join(filename)).expect("Failed to open JSONL file");
    let lines: Vec<String> = BufReader::new(file)
        .lines()
        .filter_map(|l| l.ok())
        .filter(|l| !l.trim().is_empty())
        .collect();

    let mut rng = rand::rngs::StdRng::seed_from_u64(RANDOM_SEED);
    lines
        .choose_multiple(&mut rng, count.min(lines.len()))
        .map(|l| serde_json::from_str(l).expect("Failed to parse JSON"))
        .collect()
}

// =============================================================================
// Loading
// =============================================================================

#[test]
fn test_fixture_loads_without_violations() {
    let db = TEST_DB.lock().unwrap();
    assert!(
        db.summary.report.is_ok(),
        "violations: {:?}",
        db.summary.report.violations
    );
    assert_eq!(db.summary.tables, ALL_TABLES.len());

    let conn = Connection::open(&db.db_path).unwrap();
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM pokemon"), 6);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM pokemon_forms"), 8);
    assert!(validate_database(&conn).unwrap().is_ok());
}

#[test]
fn test_pokemon_names_match_jsonl() {
    let conn = Connection::open(get_test_db_path()).unwrap();

    for json in sample_jsonl_lines("pokemon_names.jsonl", SAMPLE_SIZE) {
        let name: String = conn
            .query_row(
                "SELECT name FROM pokemon_names WHERE language_id = ?1 AND pokemon_id = ?2",
                [json["language_id"].as_i64().unwrap(), json["pokemon_id"].as_i64().unwrap()],
                |row| row.get(0),
            )
            .expect("Sampled name not found");
        assert_eq!(Some(name.as_str()), json["name"].as_str());
    }
}

#[test]
fn test_form_names_read_name_key() {
    let conn = Connection::open(get_test_db_path()).unwrap();

    for json in sample_jsonl_lines("pokemon_form_names.jsonl", SAMPLE_SIZE) {
        let (form_name, full_name): (String, String) = conn
            .query_row(
                "SELECT form_name, full_name FROM pokemon_form_names \
                 WHERE language_id = ?1 AND pokemon_id = ?2 AND form_id = ?3",
                [
                    json["language_id"].as_i64().unwrap(),
                    json["pokemon_id"].as_i64().unwrap(),
                    json["form_id"].as_i64().unwrap(),
                ],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .expect("Sampled form name not found");
        assert_eq!(Some(form_name.as_str()), json["name"].as_str());
        assert_eq!(Some(full_name.as_str()), json["full_name"].as_str());
    }
}

#[test]
fn test_type_ids_expand_to_slots() {
    let conn = Connection::open(get_test_db_path()).unwrap();
    let mut stmt = conn
        .prepare(
            "SELECT type_id FROM pokemon_types \
             WHERE generation_id = ?1 AND pokemon_id = ?2 AND form_id = ?3 ORDER BY slot",
        )
        .unwrap();

    for json in sample_jsonl_lines("generation_pokemon_forms.jsonl", SAMPLE_SIZE * 2) {
        let expected: Vec<i64> = json["type_ids"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_i64().unwrap())
            .collect();
        let actual: Vec<i64> = stmt
            .query_map(
                [
                    json["generation_id"].as_i64().unwrap(),
                    json["pokemon_id"].as_i64().unwrap(),
                    json["form_id"].as_i64().unwrap(),
                ],
                |row| row.get(0),
            )
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        assert_eq!(actual, expected, "types of {}", json);
    }
}

#[test]
fn test_preevolution_defined_later_in_file() {
    let store = get_store();
    let clefairy = store.pokemon_by_identifier("clefairy").unwrap();
    assert_eq!(clefairy.preevolution_id, Some(173));

    let evolutions = store.evolutions(173).unwrap();
    assert_eq!(evolutions.len(), 1);
    assert_eq!(evolutions[0].identifier, "clefairy");
}

#[test]
fn test_zip_input_is_extracted() {
    let dir = TempDir::new().unwrap();
    let zip_path = dir.path().join("porydex-fixture.zip");

    let mut writer = zip::ZipWriter::new(File::create(&zip_path).unwrap());
    for entry in std::fs::read_dir(fixtures_dir()).unwrap() {
        let path = entry.unwrap().path();
        let name = path.file_name().unwrap().to_str().unwrap().to_string();
        writer
            .start_file(
                format!("porydex/{}", name),
                zip::write::SimpleFileOptions::default(),
            )
            .unwrap();
        writer.write_all(&std::fs::read(&path).unwrap()).unwrap();
    }
    writer.finish().unwrap();

    let input_dir = prepare_input(
        &zip_path,
        Some(dir.path().join("cache")),
        &mut SilentUi::new(),
    )
    .unwrap();
    assert!(input_dir.join("pokemon.jsonl").exists());

    let db_path = dir.path().join("zip.db");
    let tables: Vec<_> = ALL_TABLES.iter().copied().collect();
    let summary = convert_to_sqlite(&input_dir, &db_path, tables, &mut SilentUi::new()).unwrap();
    assert!(summary.report.is_ok());
}

#[test]
fn test_include_filter_loads_parents_only() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("types.db");

    let tables = resolve_tables(Some(vec!["pokemon_types".to_string()]), None).unwrap();
    let names: Vec<_> = tables.iter().map(|t| t.name).collect();
    assert!(names.contains(&"pokemon_forms"));
    assert!(!names.contains(&"pokemon_names"));
    assert!(!names.contains(&"game_pokemon_forms"));

    let summary = convert_to_sqlite(&fixtures_dir(), &db_path, tables, &mut SilentUi::new()).unwrap();
    assert!(summary.report.is_ok(), "{:?}", summary.report.violations);

    let conn = Connection::open(&db_path).unwrap();
    assert!(count(&conn, "SELECT COUNT(*) FROM pokemon_types") > 0);
    assert_eq!(
        count(
            &conn,
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'pokemon_names'"
        ),
        0
    );
}

// =============================================================================
// Constraints
// =============================================================================

#[test]
fn test_generation_form_without_form_is_rejected() {
    let (_dir, conn) = writable_fixture_db();
    // Bulbasaur exists in generation 1 but has no form 9
    let result = conn.execute(
        "INSERT INTO generation_pokemon_forms (generation_id, pokemon_id, form_id) VALUES (1, 1, 9)",
        [],
    );
    assert!(result.is_err());
}

#[test]
fn test_game_generation_mismatch_is_rejected() {
    let (_dir, conn) = writable_fixture_db();
    // Red is a generation 1 game; bulbasaur also appears in generation 2
    let result = conn.execute(
        "INSERT INTO game_pokemon_forms (game_id, pokemon_id, form_id, generation_id) \
         VALUES (1, 1, 1, 2)",
        [],
    );
    assert!(result.is_err());

    conn.execute(
        "INSERT INTO game_pokemon_forms (game_id, pokemon_id, form_id, generation_id) \
         VALUES (2, 1, 1, 2)",
        [],
    )
    .expect("matching generation accepted");
}

#[test]
fn test_third_and_duplicate_slots_are_rejected() {
    let (_dir, conn) = writable_fixture_db();

    // Magnemite in generation 2 already has electric/steel
    let third = conn.execute(
        "INSERT INTO pokemon_types (generation_id, pokemon_id, form_id, slot, type_id) \
         VALUES (2, 81, 1, 3, 1)",
        [],
    );
    assert!(third.is_err());

    let duplicate_slot = conn.execute(
        "INSERT INTO pokemon_types (generation_id, pokemon_id, form_id, slot, type_id) \
         VALUES (2, 81, 1, 2, 1)",
        [],
    );
    assert!(duplicate_slot.is_err());

    // Generation 1 magnemite is electric only; electric again in slot 2 is a duplicate type
    let duplicate_type = conn.execute(
        "INSERT INTO pokemon_types (generation_id, pokemon_id, form_id, slot, type_id) \
         VALUES (1, 81, 1, 2, 13)",
        [],
    );
    assert!(duplicate_type.is_err());
}

#[test]
fn test_duplicate_order_is_rejected() {
    let (_dir, conn) = writable_fixture_db();

    // Bulbasaur already holds order 1 in both tables
    let species = conn.execute(
        "INSERT INTO pokemon (id, identifier, preevolution_id, \"order\") VALUES (999, 'dupemon', NULL, 1)",
        [],
    );
    assert!(species.is_err());

    conn.execute(
        "INSERT INTO pokemon (id, identifier, preevolution_id, \"order\") VALUES (998, 'formdupe', NULL, 9998)",
        [],
    )
    .expect("unused order accepted");
    let form = conn.execute(
        "INSERT INTO pokemon_forms (pokemon_id, form_id, identifier, is_default, \"order\") \
         VALUES (998, 1, 'formdupe', 1, 1)",
        [],
    );
    assert!(form.is_err());

    assert_eq!(count(&conn, "SELECT COUNT(*) FROM pokemon WHERE \"order\" = 1"), 1);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM pokemon_forms WHERE \"order\" = 1"), 1);
}

#[test]
fn test_deleting_species_cascades() {
    let (_dir, conn) = writable_fixture_db();
    conn.execute("DELETE FROM pokemon WHERE id = 479", []).unwrap();

    for table in [
        "pokemon_names",
        "pokemon_forms",
        "pokemon_form_names",
        "generation_pokemon",
        "generation_pokemon_forms",
        "pokemon_types",
        "game_pokemon_forms",
    ] {
        let remaining = count(
            &conn,
            &format!("SELECT COUNT(*) FROM {} WHERE pokemon_id = 479", table),
        );
        assert_eq!(remaining, 0, "{} still has rotom rows", table);
    }
    assert!(validate_database(&conn).unwrap().is_ok());
}

#[test]
fn test_validation_reports_missing_default_form() {
    let (_dir, conn) = writable_fixture_db();
    conn.execute(
        "UPDATE pokemon_forms SET is_default = 1 WHERE identifier = 'rotom-wash'",
        [],
    )
    .unwrap();

    let report = validate_database(&conn).unwrap();
    assert_eq!(report.violations.len(), 1);
    assert!(report.violations[0].to_string().contains("pokemon 479 has 2 default forms"));
}

// =============================================================================
// Generation-scoped types
// =============================================================================

/// A database holding one form that appeared in generations 1, 3 and 5 only
fn sparse_generation_db() -> (TempDir, Store) {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("sparse.db");

    let writer = SqliteWriter::new(&db_path).unwrap();
    writer.create_tables(ALL_TABLES).unwrap();
    writer
        .connection()
        .execute_batch(
            "INSERT INTO generations (id, identifier) VALUES
                (1, 'generation-i'), (2, 'generation-ii'), (3, 'generation-iii'),
                (4, 'generation-iv'), (5, 'generation-v');
             INSERT INTO types (id, identifier) VALUES
                (1, 'normal'), (2, 'fighting'), (3, 'flying'), (4, 'poison');
             INSERT INTO pokemon (id, identifier, preevolution_id, \"order\")
                VALUES (900, 'sparsemon', NULL, 1);
             INSERT INTO pokemon_forms (pokemon_id, form_id, identifier, is_default, \"order\")
                VALUES (900, 1, 'sparsemon', 1, 1);
             INSERT INTO generation_pokemon (generation_id, pokemon_id)
                VALUES (1, 900), (3, 900), (5, 900);
             INSERT INTO generation_pokemon_forms (generation_id, pokemon_id, form_id)
                VALUES (1, 900, 1), (3, 900, 1), (5, 900, 1);
             INSERT INTO pokemon_types (generation_id, pokemon_id, form_id, slot, type_id) VALUES
                (1, 900, 1, 1, 1),
                (3, 900, 1, 1, 2), (3, 900, 1, 2, 3),
                (5, 900, 1, 1, 4);",
        )
        .unwrap();
    assert!(writer.validate().unwrap().is_ok());
    writer.finalize().unwrap();

    (dir, Store::open(&db_path).unwrap())
}

#[test]
fn test_types_follow_generation_context() {
    let (_dir, store) = sparse_generation_db();
    let catalog = store.load_catalog().unwrap();
    let form = catalog.form(900, 1).unwrap();

    let cases: [(Session, Vec<&str>); 3] = [
        (Session::new(), vec!["poison"]),
        (Session::new().with_generation(3), vec!["fighting", "flying"]),
        (Session::new().with_generation(2), vec![]),
    ];

    for (session, expected) in cases {
        assert_eq!(identifiers(form.types(&session)), expected, "{:?}", session);
        assert_eq!(
            identifiers(&store.form_types(900, 1, &session).unwrap()),
            expected,
            "{:?}",
            session
        );
    }
}

#[test]
fn test_all_types_does_not_coalesce() {
    let (_dir, store) = sparse_generation_db();

    let all = store.all_types(900, 1).unwrap();
    let generations: Vec<GenerationId> = all.keys().copied().collect();
    assert_eq!(generations, vec![1, 3, 5]);
    assert_eq!(identifiers(&all[&1]), vec!["normal"]);
    assert_eq!(identifiers(&all[&3]), vec!["fighting", "flying"]);
    assert_eq!(identifiers(&all[&5]), vec!["poison"]);

    let catalog = store.load_catalog().unwrap();
    let in_memory = catalog.form(900, 1).unwrap().all_types();
    assert_eq!(in_memory.len(), 3);
    for (generation, types) in &all {
        assert_eq!(in_memory[generation], types.as_slice());
    }
}

#[test]
fn test_unknown_generation_gives_empty_types() {
    let store = get_store();
    let session = Session::new().with_generation(42);
    assert!(store.form_types(1, 1, &session).unwrap().is_empty());
    assert!(store.form_types(999, 1, &Session::new()).unwrap().is_empty());
}

#[test]
fn test_unknown_form_lookups() {
    let store = get_store();
    let session = Session::new();

    let err = store.current_generation_id(999, 1, &session).unwrap_err();
    assert!(err.is_not_found());
    assert!(store.form_types(999, 1, &session).unwrap().is_empty());

    // An existing form absent from the session's generation is not an error
    let gen42 = Session::new().with_generation(42);
    assert_eq!(store.current_generation_id(1, 1, &gen42).unwrap(), Some(42));
    assert!(store.form_types(1, 1, &gen42).unwrap().is_empty());
}

#[test]
fn test_form_type_changes_across_generations() {
    let store = get_store();
    let heat = store.form_by_identifier("rotom-heat").unwrap();

    let latest = store.form_types(heat.pokemon_id, heat.form_id, &Session::new()).unwrap();
    assert_eq!(identifiers(&latest), vec!["electric", "fire"]);

    let gen4 = Session::new().with_generation(4);
    let original = store.form_types(heat.pokemon_id, heat.form_id, &gen4).unwrap();
    assert_eq!(identifiers(&original), vec!["electric", "ghost"]);

    let gen3 = Session::new().with_generation(3);
    assert!(store.form_types(heat.pokemon_id, heat.form_id, &gen3).unwrap().is_empty());
}

/// Keyed SQL, batch SQL and the catalog resolve the same generation and types
#[test]
fn test_sql_batch_and_catalog_agree() {
    let store = get_store();
    let catalog = store.load_catalog().unwrap();
    let base = store.session();

    let mut sessions = vec![base];
    sessions.extend((1..=8).map(|g| base.with_generation(g)));

    for session in &sessions {
        let listings = store.list_forms(&FormQuery::new(), session).unwrap();
        assert_eq!(listings.len(), catalog.all_forms().len());

        for listing in &listings {
            let form = catalog.form(listing.form.pokemon_id, listing.form.form_id).unwrap();
            assert_eq!(listing.generation_id, form.current_generation_id(session));
            assert_eq!(listing.types.as_slice(), form.types(session), "{}", listing.form.identifier);
        }
    }

    // Keyed lookups over a seeded sample of (form, session) pairs
    let mut pairs = Vec::new();
    for form in catalog.all_forms() {
        for session in &sessions {
            pairs.push((form, *session));
        }
    }
    let mut rng = rand::rngs::StdRng::seed_from_u64(RANDOM_SEED);
    for (form, session) in pairs.choose_multiple(&mut rng, 30) {
        let (pokemon_id, form_id) = form.key();
        assert_eq!(
            store.form_types(pokemon_id, form_id, session).unwrap().as_slice(),
            form.types(session)
        );
        assert_eq!(
            store.current_generation_id(pokemon_id, form_id, session).unwrap(),
            form.current_generation_id(session)
        );
    }
}

#[test]
fn test_existing_only_listing() {
    let store = get_store();
    let session = store.session().with_generation(1);
    let listings = store
        .list_forms(&FormQuery::new().existing_only(), &session)
        .unwrap();

    let identifiers: Vec<_> = listings.iter().map(|l| l.form.identifier.as_str()).collect();
    assert_eq!(identifiers, vec!["bulbasaur", "ivysaur", "clefairy", "magnemite"]);
}

// =============================================================================
// Names
// =============================================================================

#[test]
fn test_name_falls_back_to_configured_language() {
    let store = get_store();
    let catalog = store.load_catalog().unwrap();
    let session = store.session();

    // Ivysaur has no French row; English is the fallback
    let name = store.pokemon_name(2, Some(FR), &session).unwrap();
    assert_eq!(name.name, "Ivysaur");
    assert_eq!(name.language_id, EN);
    assert_eq!(catalog.species(2).unwrap().name(Some(FR), &session).unwrap(), "Ivysaur");

    let french = store.pokemon_name(1, Some(FR), &session).unwrap();
    assert_eq!(french.name, "Bulbizarre");

    let ja = session.with_language(JA);
    assert_eq!(store.pokemon_name(479, None, &ja).unwrap().name, "ロトム");
    assert_eq!(catalog.species(479).unwrap().name(None, &ja).unwrap(), "ロトム");

    // Wash Rotom has no Japanese names at all
    assert_eq!(store.form_full_name(479, 3, None, &ja).unwrap(), "Wash Rotom");
    assert_eq!(
        catalog.form(479, 3).unwrap().full_name(None, &ja).unwrap(),
        "Wash Rotom"
    );
}

#[test]
fn test_name_without_fallback_is_not_found() {
    let store = Store::open(&get_test_db_path()).unwrap();
    let session = store.session();
    assert_eq!(session.fallback_language_id, None);

    let err = store.pokemon_name(2, Some(FR), &session).unwrap_err();
    assert!(err.is_not_found());

    let catalog = store.load_catalog().unwrap();
    let ivysaur = catalog.species(2).unwrap();
    assert!(ivysaur.name(Some(FR), &session).is_err());
    assert_eq!(ivysaur.languages(), vec![JA, EN]);
}

// =============================================================================
// Shared catalog
// =============================================================================

#[test]
fn test_catalog_shared_across_threads() {
    let store = get_store();
    let catalog: Arc<Catalog> = Arc::new(store.load_catalog().unwrap());
    let base = store.session();

    let handles: Vec<_> = (1..=7)
        .map(|generation| {
            let catalog = Arc::clone(&catalog);
            let session = base.with_generation(generation);
            thread::spawn(move || {
                let clefairy = catalog.form_by_identifier("clefairy").unwrap();
                (generation, identifiers(clefairy.types(&session)).join("/"))
            })
        })
        .collect();

    for handle in handles {
        let (generation, types) = handle.join().unwrap();
        let expected = if generation < 6 { "normal" } else { "fairy" };
        assert_eq!(types, expected, "generation {}", generation);
    }
}
