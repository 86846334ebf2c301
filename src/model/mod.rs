//! Entity rows and their in-memory aggregates.

pub mod catalog;
pub mod language;

pub use catalog::*;
pub use language::*;

use rusqlite::Row;
use serde::Serialize;

pub type PokemonId = i64;
pub type FormId = i64;
pub type LanguageId = i64;
pub type GenerationId = i64;
pub type GameId = i64;
pub type TypeId = i64;

/// (pokemon_id, form_id)
pub type FormKey = (PokemonId, FormId);

/// A species
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pokemon {
    pub id: PokemonId,
    pub identifier: String,
    pub preevolution_id: Option<PokemonId>,
    pub order: i64,
}

impl Pokemon {
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            identifier: row.get("identifier")?,
            preevolution_id: row.get("preevolution_id")?,
            order: row.get("order")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PokemonName {
    pub language_id: LanguageId,
    pub pokemon_id: PokemonId,
    pub name: String,
}

impl PokemonName {
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            language_id: row.get("language_id")?,
            pokemon_id: row.get("pokemon_id")?,
            name: row.get("name")?,
        })
    }
}

/// A specific form of a species, e.g. Heat Rotom. Species without alternate
/// forms still have one (default) form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PokemonForm {
    pub pokemon_id: PokemonId,
    pub form_id: FormId,
    pub identifier: String,
    pub is_default: bool,
    pub order: i64,
}

impl PokemonForm {
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            pokemon_id: row.get("pokemon_id")?,
            form_id: row.get("form_id")?,
            identifier: row.get("identifier")?,
            is_default: row.get("is_default")?,
            order: row.get("order")?,
        })
    }

    pub fn key(&self) -> FormKey {
        (self.pokemon_id, self.form_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PokemonFormName {
    pub language_id: LanguageId,
    pub pokemon_id: PokemonId,
    pub form_id: FormId,
    /// Short qualifier, e.g. "Heat"; stored in the `form_name` column
    pub name: String,
    /// Species and form together, e.g. "Heat Rotom"
    pub full_name: String,
}

impl PokemonFormName {
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            language_id: row.get("language_id")?,
            pokemon_id: row.get("pokemon_id")?,
            form_id: row.get("form_id")?,
            name: row.get("form_name")?,
            full_name: row.get("full_name")?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GenerationPokemon {
    pub generation_id: GenerationId,
    pub pokemon_id: PokemonId,
}

impl GenerationPokemon {
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            generation_id: row.get("generation_id")?,
            pokemon_id: row.get("pokemon_id")?,
        })
    }
}

/// An elemental type, as referenced from `pokemon_types`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Type {
    pub id: TypeId,
    pub identifier: String,
}

/// A form's appearance in one generation, with its slot-ordered types there
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationPokemonForm {
    pub generation_id: GenerationId,
    pub pokemon_id: PokemonId,
    pub form_id: FormId,
    pub types: Vec<Type>,
}

impl GenerationPokemonForm {
    /// Types are filled in separately from `pokemon_types`
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            generation_id: row.get("generation_id")?,
            pokemon_id: row.get("pokemon_id")?,
            form_id: row.get("form_id")?,
            types: Vec::new(),
        })
    }

    pub fn form_key(&self) -> FormKey {
        (self.pokemon_id, self.form_id)
    }
}

/// A form's appearance in one specific game
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GamePokemonForm {
    pub game_id: GameId,
    pub pokemon_id: PokemonId,
    pub form_id: FormId,
    /// Always the game's own generation
    pub generation_id: GenerationId,
    pub ingame_internal_id: Option<i64>,
}

impl GamePokemonForm {
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            game_id: row.get("game_id")?,
            pokemon_id: row.get("pokemon_id")?,
            form_id: row.get("form_id")?,
            generation_id: row.get("generation_id")?,
            ingame_internal_id: row.get("ingame_internal_id")?,
        })
    }

    pub fn form_key(&self) -> FormKey {
        (self.pokemon_id, self.form_id)
    }
}
