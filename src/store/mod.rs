//! Read-only access to a loaded database.
//!
//! Single-entity lookups issue one keyed query each; [`FormQuery`] covers
//! listing many forms at once; [`Store::load_catalog`] reads everything into
//! an in-memory [`Catalog`].

pub mod generation;

pub use generation::*;

use rusqlite::{named_params, Connection, OpenFlags, OptionalExtension};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::debug;

use crate::context::Session;
use crate::error::{PokedexError, Result};
use crate::model::*;

pub struct Store {
    conn: Connection,
    fallback_language_id: Option<LanguageId>,
}

impl Store {
    /// Open a database file read-only
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            fallback_language_id: None,
        }
    }

    /// Set the process-wide fallback language by identifier (e.g. "en")
    pub fn with_fallback_language(mut self, identifier: Option<&str>) -> Result<Self> {
        self.fallback_language_id = match identifier {
            Some(identifier) => Some(self.language_id(identifier)?),
            None => None,
        };
        Ok(self)
    }

    pub fn fallback_language_id(&self) -> Option<LanguageId> {
        self.fallback_language_id
    }

    /// A fresh context carrying this store's fallback language
    pub fn session(&self) -> Session {
        Session::new().with_fallback_language(self.fallback_language_id)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    // =========================================================================
    // Reference lookups
    // =========================================================================

    pub fn language_id(&self, identifier: &str) -> Result<LanguageId> {
        self.conn
            .query_row(
                "SELECT id FROM languages WHERE identifier = ?1",
                [identifier],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| PokedexError::not_found("language", identifier))
    }

    pub fn generation_id(&self, identifier: &str) -> Result<GenerationId> {
        self.conn
            .query_row(
                "SELECT id FROM generations WHERE identifier = ?1",
                [identifier],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| PokedexError::not_found("generation", identifier))
    }

    // =========================================================================
    // Species and forms
    // =========================================================================

    pub fn pokemon(&self, id: PokemonId) -> Result<Pokemon> {
        self.conn
            .query_row("SELECT * FROM pokemon WHERE id = ?1", [id], |row| {
                Pokemon::from_row(row)
            })
            .optional()?
            .ok_or_else(|| PokedexError::not_found("pokemon", id))
    }

    pub fn pokemon_by_identifier(&self, identifier: &str) -> Result<Pokemon> {
        self.conn
            .query_row(
                "SELECT * FROM pokemon WHERE identifier = ?1",
                [identifier],
                |row| Pokemon::from_row(row),
            )
            .optional()?
            .ok_or_else(|| PokedexError::not_found("pokemon", identifier))
    }

    pub fn form(&self, pokemon_id: PokemonId, form_id: FormId) -> Result<PokemonForm> {
        self.conn
            .query_row(
                "SELECT * FROM pokemon_forms WHERE pokemon_id = ?1 AND form_id = ?2",
                [pokemon_id, form_id],
                |row| PokemonForm::from_row(row),
            )
            .optional()?
            .ok_or_else(|| {
                PokedexError::not_found("pokemon form", format!("({}, {})", pokemon_id, form_id))
            })
    }

    pub fn form_by_identifier(&self, identifier: &str) -> Result<PokemonForm> {
        self.conn
            .query_row(
                "SELECT * FROM pokemon_forms WHERE identifier = ?1",
                [identifier],
                |row| PokemonForm::from_row(row),
            )
            .optional()?
            .ok_or_else(|| PokedexError::not_found("pokemon form", identifier))
    }

    /// Forms of a species in display order
    pub fn forms_of(&self, pokemon_id: PokemonId) -> Result<Vec<PokemonForm>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT * FROM pokemon_forms WHERE pokemon_id = ?1 ORDER BY \"order\"")?;
        let forms = stmt
            .query_map([pokemon_id], |row| PokemonForm::from_row(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(forms)
    }

    pub fn default_form(&self, pokemon_id: PokemonId) -> Result<PokemonForm> {
        self.conn
            .query_row(
                "SELECT * FROM pokemon_forms WHERE pokemon_id = ?1 AND is_default = 1",
                [pokemon_id],
                |row| PokemonForm::from_row(row),
            )
            .optional()?
            .ok_or_else(|| PokedexError::not_found("default form", pokemon_id))
    }

    /// Species that evolve directly from this one
    pub fn evolutions(&self, pokemon_id: PokemonId) -> Result<Vec<Pokemon>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT * FROM pokemon WHERE preevolution_id = ?1 ORDER BY id")?;
        let children = stmt
            .query_map([pokemon_id], |row| Pokemon::from_row(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(children)
    }

    // =========================================================================
    // Localized names
    // =========================================================================

    /// Keyed name lookup: requested (or session) language, then fallback
    pub fn pokemon_name(
        &self,
        pokemon_id: PokemonId,
        language: Option<LanguageId>,
        session: &Session,
    ) -> Result<PokemonName> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT * FROM pokemon_names WHERE language_id = ?1 AND pokemon_id = ?2")?;

        for candidate in session.language_candidates(language) {
            if let Some(name) = stmt
                .query_row([candidate, pokemon_id], |row| PokemonName::from_row(row))
                .optional()?
            {
                return Ok(name);
            }
        }

        Err(PokedexError::NameNotFound {
            entity: "pokemon",
            key: pokemon_id.to_string(),
            language: language.or(session.language_id),
        })
    }

    pub fn form_name(
        &self,
        pokemon_id: PokemonId,
        form_id: FormId,
        language: Option<LanguageId>,
        session: &Session,
    ) -> Result<PokemonFormName> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT * FROM pokemon_form_names \
             WHERE language_id = ?1 AND pokemon_id = ?2 AND form_id = ?3",
        )?;

        for candidate in session.language_candidates(language) {
            if let Some(name) = stmt
                .query_row([candidate, pokemon_id, form_id], |row| {
                    PokemonFormName::from_row(row)
                })
                .optional()?
            {
                return Ok(name);
            }
        }

        Err(PokedexError::NameNotFound {
            entity: "pokemon form",
            key: format!("({}, {})", pokemon_id, form_id),
            language: language.or(session.language_id),
        })
    }

    pub fn form_full_name(
        &self,
        pokemon_id: PokemonId,
        form_id: FormId,
        language: Option<LanguageId>,
        session: &Session,
    ) -> Result<String> {
        self.form_name(pokemon_id, form_id, language, session)
            .map(|n| n.full_name)
    }

    // =========================================================================
    // Generation-scoped types
    // =========================================================================

    /// The generation `form_types` resolves in for this session.
    ///
    /// Unlike `form_types`, an unknown form is an error here
    /// ([`PokedexError::NotFound`]). `Ok(None)` means the form exists but has
    /// no generation appearances and the session names no generation.
    pub fn current_generation_id(
        &self,
        pokemon_id: PokemonId,
        form_id: FormId,
        session: &Session,
    ) -> Result<Option<GenerationId>> {
        let sql = format!(
            "SELECT {} FROM pokemon_forms pf WHERE pf.pokemon_id = :pokemon_id AND pf.form_id = :form_id",
            current_generation_expr("pf")
        );
        self.conn
            .query_row(
                &sql,
                named_params! {
                    ":session_generation_id": session.generation_id,
                    ":pokemon_id": pokemon_id,
                    ":form_id": form_id,
                },
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| {
                PokedexError::not_found("pokemon form", format!("({}, {})", pokemon_id, form_id))
            })
    }

    /// Slot-ordered types of one form in the session's generation, or in its
    /// latest generation when the session has none. Empty if the form did not
    /// exist in that generation.
    ///
    /// An unknown form also gives an empty list rather than an error; use
    /// [`Store::current_generation_id`] or [`Store::form`] to tell the two
    /// apart.
    pub fn form_types(
        &self,
        pokemon_id: PokemonId,
        form_id: FormId,
        session: &Session,
    ) -> Result<Vec<Type>> {
        let sql = format!(
            "SELECT t.id, t.identifier \
             FROM pokemon_forms pf \
             JOIN pokemon_types pt \
               ON pt.pokemon_id = pf.pokemon_id AND pt.form_id = pf.form_id \
              AND pt.generation_id = {} \
             JOIN types t ON t.id = pt.type_id \
             WHERE pf.pokemon_id = :pokemon_id AND pf.form_id = :form_id \
             ORDER BY pt.slot",
            current_generation_expr("pf")
        );
        debug!(%sql, "form types");

        let mut stmt = self.conn.prepare_cached(&sql)?;
        let types = stmt
            .query_map(
                named_params! {
                    ":session_generation_id": session.generation_id,
                    ":pokemon_id": pokemon_id,
                    ":form_id": form_id,
                },
                |row| {
                    Ok(Type {
                        id: row.get(0)?,
                        identifier: row.get(1)?,
                    })
                },
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(types)
    }

    /// Types of one form in every generation it appeared in
    pub fn all_types(
        &self,
        pokemon_id: PokemonId,
        form_id: FormId,
    ) -> Result<BTreeMap<GenerationId, Vec<Type>>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT g.generation_id, t.id, t.identifier \
             FROM generation_pokemon_forms g \
             LEFT JOIN pokemon_types pt \
               ON pt.generation_id = g.generation_id \
              AND pt.pokemon_id = g.pokemon_id AND pt.form_id = g.form_id \
             LEFT JOIN types t ON t.id = pt.type_id \
             WHERE g.pokemon_id = ?1 AND g.form_id = ?2 \
             ORDER BY g.generation_id, pt.slot",
        )?;

        let mut all: BTreeMap<GenerationId, Vec<Type>> = BTreeMap::new();
        let mut rows = stmt.query([pokemon_id, form_id])?;
        while let Some(row) = rows.next()? {
            let types = all.entry(row.get(0)?).or_default();
            if let (Some(id), Some(identifier)) = (row.get(1)?, row.get(2)?) {
                types.push(Type { id, identifier });
            }
        }
        Ok(all)
    }

    /// Batch listing of forms, see [`FormQuery`]
    pub fn list_forms(&self, query: &FormQuery, session: &Session) -> Result<Vec<FormListing>> {
        query.run(&self.conn, session)
    }

    pub fn game_form(
        &self,
        game_id: GameId,
        pokemon_id: PokemonId,
        form_id: FormId,
    ) -> Result<GamePokemonForm> {
        self.conn
            .query_row(
                "SELECT * FROM game_pokemon_forms \
                 WHERE game_id = ?1 AND pokemon_id = ?2 AND form_id = ?3",
                [game_id, pokemon_id, form_id],
                |row| GamePokemonForm::from_row(row),
            )
            .optional()?
            .ok_or_else(|| {
                PokedexError::not_found(
                    "game pokemon form",
                    format!("({}, {}, {})", game_id, pokemon_id, form_id),
                )
            })
    }

    // =========================================================================
    // In-memory catalog
    // =========================================================================

    /// Read every species, form and appearance into memory
    pub fn load_catalog(&self) -> Result<Catalog> {
        let mut rows = CatalogRows {
            pokemon: self.select_all("pokemon", Pokemon::from_row)?,
            pokemon_names: self.select_all("pokemon_names", PokemonName::from_row)?,
            forms: self.select_all("pokemon_forms", PokemonForm::from_row)?,
            form_names: self.select_all("pokemon_form_names", PokemonFormName::from_row)?,
            generation_pokemon: self.select_all("generation_pokemon", GenerationPokemon::from_row)?,
            generation_forms: self
                .select_all("generation_pokemon_forms", GenerationPokemonForm::from_row)?,
            game_forms: self.select_all("game_pokemon_forms", GamePokemonForm::from_row)?,
        };

        let mut types: HashMap<(GenerationId, PokemonId, FormId), Vec<Type>> = HashMap::new();
        let mut stmt = self.conn.prepare(
            "SELECT pt.generation_id, pt.pokemon_id, pt.form_id, t.id, t.identifier \
             FROM pokemon_types pt JOIN types t ON t.id = pt.type_id \
             ORDER BY pt.generation_id, pt.pokemon_id, pt.form_id, pt.slot",
        )?;
        let mut type_rows = stmt.query([])?;
        while let Some(row) = type_rows.next()? {
            types
                .entry((row.get(0)?, row.get(1)?, row.get(2)?))
                .or_default()
                .push(Type {
                    id: row.get(3)?,
                    identifier: row.get(4)?,
                });
        }
        for gpf in &mut rows.generation_forms {
            if let Some(list) = types.remove(&(gpf.generation_id, gpf.pokemon_id, gpf.form_id)) {
                gpf.types = list;
            }
        }

        debug!(
            pokemon = rows.pokemon.len(),
            forms = rows.forms.len(),
            "catalog loaded"
        );
        Ok(Catalog::from_rows(rows))
    }

    fn select_all<T>(
        &self,
        table: &str,
        map: fn(&rusqlite::Row) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>> {
        let mut stmt = self.conn.prepare(&format!("SELECT * FROM \"{}\"", table))?;
        let rows = stmt
            .query_map([], |row| map(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}
