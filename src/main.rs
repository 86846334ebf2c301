use anyhow::{bail, Context, Result};
use porydex_db::{
    cli::{Cli, Commands, TableFilter},
    config::Config,
    download::{ensure_dataset, prepare_input},
    filter::resolve_tables,
    logging,
    schema::{get_table, table_names, ALL_TABLES},
    store::{FormQuery, Store},
    ui::{LogUi, TerminalUi, Ui},
    validate::validate_database,
    writer::{convert_to_sqlite, generate_create_table, generate_indexes, LoadSummary},
};
use std::path::{Path, PathBuf};
use std::time::Instant;

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    let config = Config::load(cli.config.as_deref())?;

    let tui = match &cli.command {
        Commands::Load { filter, .. } | Commands::Sync { filter, .. } => filter.tui,
        _ => false,
    };
    logging::init(config.log_filter.as_deref(), !tui);

    match cli.command {
        Commands::Load {
            input,
            output_db,
            filter,
        } => {
            run_load(Source::Local(input), &output_db, &filter, config.cache_dir)?;
        }

        Commands::Fetch { url, output, force } => {
            let cache_dir = output.or(config.cache_dir);
            let path = ensure_dataset(&url, cache_dir, force, &mut LogUi::new())?;
            println!("{}", path.display());
        }

        Commands::Sync {
            url,
            output_db,
            filter,
            force,
            cache_dir,
        } => {
            run_load(
                Source::Remote { url, force },
                &output_db,
                &filter,
                cache_dir.or(config.cache_dir),
            )?;
        }

        Commands::ListTables => {
            println!("Available tables:\n");
            for name in table_names() {
                println!("  {}", name);
            }
        }

        Commands::Schema { table } => {
            let tables: Vec<_> = match table {
                Some(name) => vec![get_table(&name)
                    .with_context(|| format!("Unknown table: {}", name))?],
                None => ALL_TABLES.to_vec(),
            };
            for schema in tables {
                println!("{};", generate_create_table(schema));
                for index in generate_indexes(schema) {
                    println!("{};", index);
                }
                println!();
            }
        }

        Commands::Validate { db } => {
            let store = Store::open(&db)?;
            let report = validate_database(store.connection())?;
            if !report.is_ok() {
                for violation in &report.violations {
                    println!("{}", violation);
                }
                bail!("{} invariant violation(s) in {:?}", report.violations.len(), db);
            }
            println!("{:?}: all invariants hold", db);
        }

        Commands::Types {
            db,
            form,
            generation,
            history,
        } => {
            let store = open_store(&db, &config)?;
            let form = store.form_by_identifier(&form)?;
            let mut session = store.session();
            if let Some(generation) = generation {
                session = session.with_generation(generation);
            }

            let resolved = store.current_generation_id(form.pokemon_id, form.form_id, &session)?;
            let types = store.form_types(form.pokemon_id, form.form_id, &session)?;
            match resolved {
                Some(generation) => println!(
                    "{} (generation {}): {}",
                    form.identifier,
                    generation,
                    join_types(types.iter().map(|t| t.identifier.as_str()))
                ),
                None => println!("{}: no generation appearances", form.identifier),
            }

            if history {
                for (generation, types) in store.all_types(form.pokemon_id, form.form_id)? {
                    println!(
                        "  generation {}: {}",
                        generation,
                        join_types(types.iter().map(|t| t.identifier.as_str()))
                    );
                }
            }
        }

        Commands::Forms {
            db,
            generation,
            language,
            pokemon,
            existing_only,
            json,
        } => {
            let store = open_store(&db, &config)?;
            let mut session = store.session();
            if let Some(generation) = generation {
                session = session.with_generation(generation);
            }
            if let Some(language) = language {
                session = session.with_language(store.language_id(&language)?);
            }

            let mut query = FormQuery::new();
            if let Some(pokemon_id) = pokemon {
                query = query.pokemon(pokemon_id);
            }
            if existing_only {
                query = query.existing_only();
            }

            for listing in store.list_forms(&query, &session)? {
                if json {
                    println!("{}", serde_json::to_string(&listing)?);
                    continue;
                }
                println!(
                    "{:<24} {:<8} {:<20} {}",
                    listing.form.identifier,
                    listing
                        .generation_id
                        .map(|g| format!("gen {}", g))
                        .unwrap_or_else(|| "-".to_string()),
                    join_types(listing.types.iter().map(|t| t.identifier.as_str())),
                    listing.full_name.as_deref().unwrap_or("-")
                );
            }
        }
    }

    Ok(())
}

fn open_store(db: &Path, config: &Config) -> Result<Store> {
    let store = Store::open(db).with_context(|| format!("Failed to open {:?}", db))?;
    store
        .with_fallback_language(config.fallback_language.as_deref())
        .context("Invalid fallback_language in config")
}

/// Where `load` and `sync` take their dataset from
enum Source {
    Local(PathBuf),
    Remote { url: String, force: bool },
}

/// Run the load against the terminal UI or the log UI and print its summary
fn run_load(
    source: Source,
    output_db: &Path,
    filter: &TableFilter,
    cache_dir: Option<PathBuf>,
) -> Result<()> {
    if filter.tui {
        let mut ui = TerminalUi::new()?;
        match load(&mut ui, source, output_db, filter, cache_dir) {
            Ok(summary) => ui.finish(&summary),
            Err(err) => {
                ui.restore()?;
                Err(err)
            }
        }
    } else {
        let summary = load(&mut LogUi::new(), source, output_db, filter, cache_dir)?;
        println!("{}", summary);
        Ok(())
    }
}

fn load(
    ui: &mut impl Ui,
    source: Source,
    output_db: &Path,
    filter: &TableFilter,
    cache_dir: Option<PathBuf>,
) -> Result<String> {
    let start = Instant::now();
    let tables = resolve_tables(filter.include.clone(), filter.exclude.clone())?;

    let input_dir = match source {
        Source::Local(input) => prepare_input(&input, cache_dir, ui)?,
        Source::Remote { url, force } => ensure_dataset(&url, cache_dir, force, ui)?,
    };

    let LoadSummary {
        tables,
        rows,
        report,
    } = convert_to_sqlite(&input_dir, output_db, tables, ui)?;

    if !report.is_ok() {
        bail!(
            "{} invariant violation(s) after loading {:?}",
            report.violations.len(),
            output_db
        );
    }

    Ok(format!(
        "Created {:?} ({} tables, {} rows) in {:.1}s",
        output_db,
        tables,
        rows,
        start.elapsed().as_secs_f64()
    ))
}

fn join_types<'a>(types: impl Iterator<Item = &'a str>) -> String {
    let joined = types.collect::<Vec<_>>().join("/");
    if joined.is_empty() {
        "-".to_string()
    } else {
        joined
    }
}
