//! Immutable in-memory view of the whole database.
//!
//! Built once from loaded rows and shared read-only (it is `Send + Sync`);
//! every context-dependent accessor takes the caller's [`Session`].

use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::warn;

use super::language::{index_by_language, ByLanguage};
use super::*;
use crate::context::{current_generation, Session};
use crate::error::{PokedexError, Result};

/// A species with its names, generation appearances and forms
#[derive(Debug, Clone)]
pub struct Species {
    pub pokemon: Pokemon,
    names: HashMap<LanguageId, PokemonName>,
    generations: BTreeSet<GenerationId>,
    /// Form ids in display order
    form_ids: Vec<FormId>,
}

impl Species {
    pub fn id(&self) -> PokemonId {
        self.pokemon.id
    }

    pub fn name(&self, language: Option<LanguageId>, session: &Session) -> Result<&str> {
        self.name_row(language, session).map(|n| n.name.as_str())
    }

    pub fn generations(&self) -> impl Iterator<Item = GenerationId> + '_ {
        self.generations.iter().copied()
    }

    pub fn exists_in(&self, generation_id: GenerationId) -> bool {
        self.generations.contains(&generation_id)
    }

    pub fn form_ids(&self) -> &[FormId] {
        &self.form_ids
    }
}

impl ByLanguage for Species {
    type Name = PokemonName;
    const ENTITY: &'static str = "pokemon";

    fn names_by_language(&self) -> &HashMap<LanguageId, PokemonName> {
        &self.names
    }

    fn lookup_key(&self) -> String {
        self.pokemon.identifier.clone()
    }
}

/// A form with its names and per-generation / per-game appearances
#[derive(Debug, Clone)]
pub struct Form {
    pub form: PokemonForm,
    names: HashMap<LanguageId, PokemonFormName>,
    by_generation: BTreeMap<GenerationId, GenerationPokemonForm>,
    by_game: BTreeMap<GameId, GamePokemonForm>,
}

impl Form {
    pub fn key(&self) -> FormKey {
        self.form.key()
    }

    /// The session's generation, or else the latest one this form appeared in
    pub fn current_generation_id(&self, session: &Session) -> Option<GenerationId> {
        current_generation(session.generation_id, self.by_generation.keys().copied())
    }

    /// The appearance row for the current generation, if the form existed then
    pub fn current(&self, session: &Session) -> Option<&GenerationPokemonForm> {
        self.current_generation_id(session)
            .and_then(|generation_id| self.by_generation.get(&generation_id))
    }

    /// Slot-ordered types in the current generation; empty if the form did
    /// not exist in that generation
    pub fn types(&self, session: &Session) -> &[Type] {
        self.current(session).map(|g| g.types.as_slice()).unwrap_or(&[])
    }

    /// Types in every generation the form appeared in
    pub fn all_types(&self) -> BTreeMap<GenerationId, &[Type]> {
        self.by_generation
            .iter()
            .map(|(generation_id, g)| (*generation_id, g.types.as_slice()))
            .collect()
    }

    pub fn generations(&self) -> impl Iterator<Item = GenerationId> + '_ {
        self.by_generation.keys().copied()
    }

    pub fn exists_in(&self, generation_id: GenerationId) -> bool {
        self.by_generation.contains_key(&generation_id)
    }

    pub fn in_game(&self, game_id: GameId) -> Option<&GamePokemonForm> {
        self.by_game.get(&game_id)
    }

    pub fn games(&self) -> impl Iterator<Item = &GamePokemonForm> {
        self.by_game.values()
    }

    pub fn form_name(&self, language: Option<LanguageId>, session: &Session) -> Result<&str> {
        self.name_row(language, session).map(|n| n.name.as_str())
    }

    pub fn full_name(&self, language: Option<LanguageId>, session: &Session) -> Result<&str> {
        self.name_row(language, session).map(|n| n.full_name.as_str())
    }
}

impl ByLanguage for Form {
    type Name = PokemonFormName;
    const ENTITY: &'static str = "pokemon form";

    fn names_by_language(&self) -> &HashMap<LanguageId, PokemonFormName> {
        &self.names
    }

    fn lookup_key(&self) -> String {
        self.form.identifier.clone()
    }
}

/// Every row of the schema, as read from storage
#[derive(Debug, Clone, Default)]
pub struct CatalogRows {
    pub pokemon: Vec<Pokemon>,
    pub pokemon_names: Vec<PokemonName>,
    pub forms: Vec<PokemonForm>,
    pub form_names: Vec<PokemonFormName>,
    pub generation_pokemon: Vec<GenerationPokemon>,
    /// With types already attached
    pub generation_forms: Vec<GenerationPokemonForm>,
    pub game_forms: Vec<GamePokemonForm>,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    species: BTreeMap<PokemonId, Species>,
    forms: BTreeMap<FormKey, Form>,
    species_by_identifier: HashMap<String, PokemonId>,
    forms_by_identifier: HashMap<String, FormKey>,
    evolutions: HashMap<PokemonId, Vec<PokemonId>>,
}

impl Catalog {
    /// Assemble the catalog. Rows whose parent is missing are dropped with a
    /// warning; a database loaded with foreign keys on has none.
    pub fn from_rows(rows: CatalogRows) -> Self {
        let mut pokemon_names: HashMap<PokemonId, Vec<PokemonName>> = HashMap::new();
        for name in rows.pokemon_names {
            pokemon_names.entry(name.pokemon_id).or_default().push(name);
        }
        let mut generations: HashMap<PokemonId, BTreeSet<GenerationId>> = HashMap::new();
        for gp in rows.generation_pokemon {
            generations
                .entry(gp.pokemon_id)
                .or_default()
                .insert(gp.generation_id);
        }

        let mut catalog = Catalog::default();

        for pokemon in rows.pokemon {
            let id = pokemon.id;
            if let Some(pre) = pokemon.preevolution_id {
                catalog.evolutions.entry(pre).or_default().push(id);
            }
            catalog
                .species_by_identifier
                .insert(pokemon.identifier.clone(), id);
            catalog.species.insert(
                id,
                Species {
                    pokemon,
                    names: index_by_language(pokemon_names.remove(&id).unwrap_or_default()),
                    generations: generations.remove(&id).unwrap_or_default(),
                    form_ids: Vec::new(),
                },
            );
        }

        let mut forms = rows.forms;
        forms.sort_by_key(|f| f.order);
        for form in forms {
            let key = form.key();
            match catalog.species.get_mut(&form.pokemon_id) {
                Some(species) => species.form_ids.push(form.form_id),
                None => {
                    warn!(form = %form.identifier, "form of unknown pokemon dropped");
                    continue;
                }
            }
            catalog
                .forms_by_identifier
                .insert(form.identifier.clone(), key);
            catalog.forms.insert(
                key,
                Form {
                    form,
                    names: HashMap::new(),
                    by_generation: BTreeMap::new(),
                    by_game: BTreeMap::new(),
                },
            );
        }

        for name in rows.form_names {
            if let Some(form) = catalog.forms.get_mut(&(name.pokemon_id, name.form_id)) {
                form.names.insert(name.language_id, name);
            }
        }
        for gpf in rows.generation_forms {
            match catalog.forms.get_mut(&gpf.form_key()) {
                Some(form) => {
                    form.by_generation.insert(gpf.generation_id, gpf);
                }
                None => warn!(key = ?gpf.form_key(), "generation appearance of unknown form dropped"),
            }
        }
        for game_form in rows.game_forms {
            match catalog.forms.get_mut(&game_form.form_key()) {
                Some(form) => {
                    form.by_game.insert(game_form.game_id, game_form);
                }
                None => warn!(key = ?game_form.form_key(), "game appearance of unknown form dropped"),
            }
        }

        for children in catalog.evolutions.values_mut() {
            children.sort_unstable();
        }

        catalog
    }

    pub fn species(&self, id: PokemonId) -> Result<&Species> {
        self.species
            .get(&id)
            .ok_or_else(|| PokedexError::not_found("pokemon", id))
    }

    pub fn species_by_identifier(&self, identifier: &str) -> Result<&Species> {
        self.species_by_identifier
            .get(identifier)
            .and_then(|id| self.species.get(id))
            .ok_or_else(|| PokedexError::not_found("pokemon", identifier))
    }

    pub fn form(&self, pokemon_id: PokemonId, form_id: FormId) -> Result<&Form> {
        self.forms
            .get(&(pokemon_id, form_id))
            .ok_or_else(|| PokedexError::not_found("pokemon form", format!("({}, {})", pokemon_id, form_id)))
    }

    pub fn form_by_identifier(&self, identifier: &str) -> Result<&Form> {
        self.forms_by_identifier
            .get(identifier)
            .and_then(|key| self.forms.get(key))
            .ok_or_else(|| PokedexError::not_found("pokemon form", identifier))
    }

    /// Forms of a species in display order
    pub fn forms_of(&self, species: &Species) -> Vec<&Form> {
        species
            .form_ids
            .iter()
            .filter_map(|form_id| self.forms.get(&(species.id(), *form_id)))
            .collect()
    }

    pub fn default_form(&self, species: &Species) -> Result<&Form> {
        self.forms_of(species)
            .into_iter()
            .find(|f| f.form.is_default)
            .ok_or_else(|| PokedexError::not_found("default form", &species.pokemon.identifier))
    }

    pub fn preevolution(&self, species: &Species) -> Option<&Species> {
        species
            .pokemon
            .preevolution_id
            .and_then(|id| self.species.get(&id))
    }

    /// Species that evolve directly from this one
    pub fn evolutions(&self, species: &Species) -> Vec<&Species> {
        self.evolutions
            .get(&species.id())
            .map(|ids| ids.iter().filter_map(|id| self.species.get(id)).collect())
            .unwrap_or_default()
    }

    /// All species in display order
    pub fn all_species(&self) -> Vec<&Species> {
        let mut all: Vec<_> = self.species.values().collect();
        all.sort_by_key(|s| s.pokemon.order);
        all
    }

    /// All forms in display order
    pub fn all_forms(&self) -> Vec<&Form> {
        let mut all: Vec<_> = self.forms.values().collect();
        all.sort_by_key(|f| f.form.order);
        all
    }
}
