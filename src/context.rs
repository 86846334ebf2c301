//! Per-unit-of-work lookup context.
//!
//! A [`Session`] carries the generation and language a caller is reading in.
//! It is a plain value handed to each read, so two requests with different
//! contexts never see each other's settings.

use crate::model::{GenerationId, LanguageId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Session {
    /// Generation to resolve types in; unset means "latest appearance"
    pub generation_id: Option<GenerationId>,
    /// Preferred language for names
    pub language_id: Option<LanguageId>,
    /// Process-wide default language, used when the preferred one has no row
    pub fallback_language_id: Option<LanguageId>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_generation(self, generation_id: GenerationId) -> Self {
        Self {
            generation_id: Some(generation_id),
            ..self
        }
    }

    pub fn with_language(self, language_id: LanguageId) -> Self {
        Self {
            language_id: Some(language_id),
            ..self
        }
    }

    pub fn with_fallback_language(self, language_id: Option<LanguageId>) -> Self {
        Self {
            fallback_language_id: language_id,
            ..self
        }
    }

    /// Languages to try, in order, for a name lookup
    pub fn language_candidates(&self, requested: Option<LanguageId>) -> Vec<LanguageId> {
        let mut candidates = Vec::with_capacity(2);
        if let Some(language) = requested.or(self.language_id) {
            candidates.push(language);
        }
        if let Some(fallback) = self.fallback_language_id {
            if !candidates.contains(&fallback) {
                candidates.push(fallback);
            }
        }
        candidates
    }
}

/// The generation a form's "current" types come from: the explicit context
/// if one is set, otherwise the latest generation the form appeared in.
///
/// `store::current_generation_expr` is the SQL rendition of the same rule.
pub fn current_generation<I>(explicit: Option<GenerationId>, appearances: I) -> Option<GenerationId>
where
    I: IntoIterator<Item = GenerationId>,
{
    explicit.or_else(|| appearances.into_iter().max())
}
