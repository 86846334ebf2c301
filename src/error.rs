//! Lookup errors.

use thiserror::Error;

use crate::model::LanguageId;

pub type Result<T, E = PokedexError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum PokedexError {
    /// No row with the given key
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// Neither the requested language nor the fallback has a name row
    #[error("no {entity} name for {key} in language {language:?}")]
    NameNotFound {
        entity: &'static str,
        key: String,
        language: Option<LanguageId>,
    },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl PokedexError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::NameNotFound { .. })
    }
}
