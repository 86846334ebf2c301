use std::collections::HashMap;

use super::{LanguageId, PokemonFormName, PokemonName};
use crate::context::Session;
use crate::error::{PokedexError, Result};

/// Name rows of one language, as owned by a species or form
pub trait LocalizedRow {
    fn language_id(&self) -> LanguageId;
}

impl LocalizedRow for PokemonName {
    fn language_id(&self) -> LanguageId {
        self.language_id
    }
}

impl LocalizedRow for PokemonFormName {
    fn language_id(&self) -> LanguageId {
        self.language_id
    }
}

/// Keyed per-language name lookup with fallback.
///
/// The requested language (or the session's) is tried first, then the
/// session's fallback language.
pub trait ByLanguage {
    type Name: LocalizedRow;

    /// Entity name used in errors
    const ENTITY: &'static str;

    fn names_by_language(&self) -> &HashMap<LanguageId, Self::Name>;

    fn lookup_key(&self) -> String;

    fn name_row(&self, language: Option<LanguageId>, session: &Session) -> Result<&Self::Name> {
        let names = self.names_by_language();
        session
            .language_candidates(language)
            .into_iter()
            .find_map(|candidate| names.get(&candidate))
            .ok_or_else(|| PokedexError::NameNotFound {
                entity: Self::ENTITY,
                key: self.lookup_key(),
                language: language.or(session.language_id),
            })
    }

    fn languages(&self) -> Vec<LanguageId> {
        let mut ids: Vec<_> = self.names_by_language().keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

/// Index name rows by language; later rows for the same language win
pub(crate) fn index_by_language<N: LocalizedRow>(rows: Vec<N>) -> HashMap<LanguageId, N> {
    rows.into_iter().map(|n| (n.language_id(), n)).collect()
}
