//! Table schema definitions for the Pokédex database

use super::types::*;

// =============================================================================
// Reference Tables (owned elsewhere; minimal shapes for FK enforcement)
// =============================================================================

pub static LANGUAGES: TableSchema = TableSchema {
    name: "languages",
    source_file: "languages.jsonl",
    columns: &[
        Column::required("id", ColumnType::Integer),
        Column::required("identifier", ColumnType::Text),
    ],
    primary_key: &["id"],
    foreign_keys: &[],
    indexes: &[Index::unique(&["identifier"])],
    checks: &[],
    array_source: None,
};

pub static GENERATIONS: TableSchema = TableSchema {
    name: "generations",
    source_file: "generations.jsonl",
    columns: &[
        Column::required("id", ColumnType::Integer),
        Column::required("identifier", ColumnType::Text),
    ],
    primary_key: &["id"],
    foreign_keys: &[],
    indexes: &[Index::unique(&["identifier"])],
    checks: &[],
    array_source: None,
};

pub static TYPES: TableSchema = TableSchema {
    name: "types",
    source_file: "types.jsonl",
    columns: &[
        Column::required("id", ColumnType::Integer),
        Column::required("identifier", ColumnType::Text),
    ],
    primary_key: &["id"],
    foreign_keys: &[],
    indexes: &[Index::unique(&["identifier"])],
    checks: &[],
    array_source: None,
};

/// The (id, generation_id) pair is unique so game appearances can pin their
/// generation to the game's own.
pub static GAMES: TableSchema = TableSchema {
    name: "games",
    source_file: "games.jsonl",
    columns: &[
        Column::required("id", ColumnType::Integer),
        Column::required("identifier", ColumnType::Text),
        Column::required("generation_id", ColumnType::Integer),
    ],
    primary_key: &["id"],
    foreign_keys: &[ForeignKey::new(&["generation_id"], "generations")],
    indexes: &[
        Index::unique(&["identifier"]),
        Index::unique(&["id", "generation_id"]),
    ],
    checks: &[],
    array_source: None,
};

// =============================================================================
// Species and Forms
// =============================================================================

/// A species. The pre-evolution may be defined later in the same file.
pub static POKEMON: TableSchema = TableSchema {
    name: "pokemon",
    source_file: "pokemon.jsonl",
    columns: &[
        Column::required("id", ColumnType::Integer),
        Column::required("identifier", ColumnType::Text),
        Column::new("preevolution_id", ColumnType::Integer),
        Column::required("order", ColumnType::Integer),
    ],
    primary_key: &["id"],
    foreign_keys: &[ForeignKey::new(&["preevolution_id"], "pokemon")],
    indexes: &[Index::unique(&["identifier"]), Index::unique(&["order"])],
    checks: &[],
    array_source: None,
};

pub static POKEMON_NAMES: TableSchema = TableSchema {
    name: "pokemon_names",
    source_file: "pokemon_names.jsonl",
    columns: &[
        Column::required("language_id", ColumnType::Integer),
        Column::required("pokemon_id", ColumnType::Integer),
        Column::required("name", ColumnType::Text),
    ],
    primary_key: &["language_id", "pokemon_id"],
    foreign_keys: &[
        ForeignKey::new(&["language_id"], "languages").cascade(),
        ForeignKey::new(&["pokemon_id"], "pokemon").cascade(),
    ],
    indexes: &[],
    checks: &[],
    array_source: None,
};

/// Every species has at least one form, even without alternate forms.
pub static POKEMON_FORMS: TableSchema = TableSchema {
    name: "pokemon_forms",
    source_file: "pokemon_forms.jsonl",
    columns: &[
        Column::required("pokemon_id", ColumnType::Integer),
        Column::required("form_id", ColumnType::Integer),
        Column::required("identifier", ColumnType::Text),
        Column::required("is_default", ColumnType::Boolean),
        Column::required("order", ColumnType::Integer),
    ],
    primary_key: &["pokemon_id", "form_id"],
    foreign_keys: &[ForeignKey::new(&["pokemon_id"], "pokemon").cascade()],
    indexes: &[Index::unique(&["identifier"]), Index::unique(&["order"])],
    checks: &["is_default IN (0, 1)"],
    array_source: None,
};

pub static POKEMON_FORM_NAMES: TableSchema = TableSchema {
    name: "pokemon_form_names",
    source_file: "pokemon_form_names.jsonl",
    columns: &[
        Column::required("language_id", ColumnType::Integer),
        Column::required("pokemon_id", ColumnType::Integer),
        Column::required("form_id", ColumnType::Integer),
        Column::required("form_name", ColumnType::Text).json("name"),
        Column::required("full_name", ColumnType::Text),
    ],
    primary_key: &["language_id", "pokemon_id", "form_id"],
    foreign_keys: &[
        ForeignKey::new(&["language_id"], "languages").cascade(),
        ForeignKey::composite(
            &["pokemon_id", "form_id"],
            "pokemon_forms",
            &["pokemon_id", "form_id"],
        )
        .cascade(),
    ],
    indexes: &[],
    checks: &[],
    array_source: None,
};

// =============================================================================
// Generation and Game Appearances
// =============================================================================

pub static GENERATION_POKEMON: TableSchema = TableSchema {
    name: "generation_pokemon",
    source_file: "generation_pokemon.jsonl",
    columns: &[
        Column::required("generation_id", ColumnType::Integer),
        Column::required("pokemon_id", ColumnType::Integer),
    ],
    primary_key: &["generation_id", "pokemon_id"],
    foreign_keys: &[
        ForeignKey::new(&["generation_id"], "generations"),
        ForeignKey::new(&["pokemon_id"], "pokemon").cascade(),
    ],
    indexes: &[Index::on(&["pokemon_id"])],
    checks: &[],
    array_source: None,
};

/// A form may only appear in a generation its species appears in.
pub static GENERATION_POKEMON_FORMS: TableSchema = TableSchema {
    name: "generation_pokemon_forms",
    source_file: "generation_pokemon_forms.jsonl",
    columns: &[
        Column::required("generation_id", ColumnType::Integer),
        Column::required("pokemon_id", ColumnType::Integer),
        Column::required("form_id", ColumnType::Integer),
    ],
    primary_key: &["generation_id", "pokemon_id", "form_id"],
    foreign_keys: &[
        ForeignKey::new(&["generation_id"], "generations"),
        ForeignKey::composite(
            &["pokemon_id", "form_id"],
            "pokemon_forms",
            &["pokemon_id", "form_id"],
        )
        .cascade(),
        ForeignKey::composite(
            &["generation_id", "pokemon_id"],
            "generation_pokemon",
            &["generation_id", "pokemon_id"],
        )
        .cascade(),
    ],
    indexes: &[Index::on(&["pokemon_id", "form_id"])],
    checks: &[],
    array_source: None,
};

/// Slot-ordered types of a form in one generation, expanded from the
/// `type_ids` array of each `generation_pokemon_forms` record.
pub static POKEMON_TYPES: TableSchema = TableSchema {
    name: "pokemon_types",
    source_file: "generation_pokemon_forms.jsonl",
    columns: &[
        Column::required("generation_id", ColumnType::Integer),
        Column::required("pokemon_id", ColumnType::Integer),
        Column::required("form_id", ColumnType::Integer),
        Column::required("slot", ColumnType::Integer),
        Column::required("type_id", ColumnType::Integer),
    ],
    primary_key: &["generation_id", "pokemon_id", "form_id", "slot"],
    foreign_keys: &[
        ForeignKey::composite(
            &["generation_id", "pokemon_id", "form_id"],
            "generation_pokemon_forms",
            &["generation_id", "pokemon_id", "form_id"],
        )
        .cascade(),
        ForeignKey::new(&["type_id"], "types"),
    ],
    indexes: &[Index::unique(&[
        "generation_id",
        "pokemon_id",
        "form_id",
        "type_id",
    ])],
    checks: &["slot IN (1, 2)"],
    array_source: Some(ArraySource::OrderedIntArray {
        array_field: "type_ids",
        key_columns: &["generation_id", "pokemon_id", "form_id"],
        value_column: "type_id",
        ordinal_column: "slot",
    }),
};

/// `generation_id` is redundant with the game's own and pinned to it through
/// the games(id, generation_id) pair.
pub static GAME_POKEMON_FORMS: TableSchema = TableSchema {
    name: "game_pokemon_forms",
    source_file: "game_pokemon_forms.jsonl",
    columns: &[
        Column::required("game_id", ColumnType::Integer),
        Column::required("pokemon_id", ColumnType::Integer),
        Column::required("form_id", ColumnType::Integer),
        Column::required("generation_id", ColumnType::Integer),
        // Nullable until the dataset covers every game
        Column::new("ingame_internal_id", ColumnType::Integer),
    ],
    primary_key: &["game_id", "pokemon_id", "form_id"],
    foreign_keys: &[
        ForeignKey::composite(
            &["game_id", "generation_id"],
            "games",
            &["id", "generation_id"],
        ),
        ForeignKey::composite(
            &["generation_id", "pokemon_id", "form_id"],
            "generation_pokemon_forms",
            &["generation_id", "pokemon_id", "form_id"],
        )
        .cascade(),
    ],
    indexes: &[Index::on(&["pokemon_id", "form_id"])],
    checks: &[],
    array_source: None,
};

// =============================================================================
// Schema Registry
// =============================================================================

/// All table schemas in dependency order
pub static ALL_TABLES: &[&TableSchema] = &[
    // Wave 1: No dependencies
    &LANGUAGES,
    &GENERATIONS,
    &TYPES,
    // Wave 2: Level 1 deps
    &GAMES,
    &POKEMON,
    // Wave 3: Level 2 deps
    &POKEMON_NAMES,
    &POKEMON_FORMS,
    &GENERATION_POKEMON,
    // Wave 4: Level 3 deps
    &POKEMON_FORM_NAMES,
    &GENERATION_POKEMON_FORMS,
    // Wave 5: Appearance details
    &POKEMON_TYPES,
    &GAME_POKEMON_FORMS,
];

/// Get table schema by name
pub fn get_table(name: &str) -> Option<&'static TableSchema> {
    ALL_TABLES.iter().find(|t| t.name == name).copied()
}

/// Get all table names
pub fn table_names() -> Vec<&'static str> {
    ALL_TABLES.iter().map(|t| t.name).collect()
}
