//! Current-generation resolution as SQL.
//!
//! Mirrors `context::current_generation`: the session's generation if bound,
//! otherwise the form's latest generation appearance.

use rusqlite::types::ToSql;
use rusqlite::Connection;
use serde::Serialize;

use crate::context::Session;
use crate::error::Result;
use crate::model::{GenerationId, PokemonForm, PokemonId, Type};

/// Named parameter the fragment reads the session generation from
pub const SESSION_GENERATION_PARAM: &str = ":session_generation_id";

/// `COALESCE(:session_generation_id, <latest generation of the form>)`,
/// correlated on the `pokemon_forms` row aliased `form_alias`.
///
/// Bind [`SESSION_GENERATION_PARAM`] to the session's generation (NULL when
/// unset). The subquery uses the alias `latest_gpf`, which the enclosing
/// query must not reuse.
pub fn current_generation_expr(form_alias: &str) -> String {
    format!(
        "COALESCE({param}, (SELECT MAX(latest_gpf.generation_id) \
         FROM generation_pokemon_forms latest_gpf \
         WHERE latest_gpf.pokemon_id = {a}.pokemon_id \
         AND latest_gpf.form_id = {a}.form_id))",
        param = SESSION_GENERATION_PARAM,
        a = form_alias
    )
}

/// One form in a batch listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormListing {
    pub form: PokemonForm,
    /// Generation the types were resolved in
    pub generation_id: Option<GenerationId>,
    /// Empty when the form did not exist in that generation
    pub types: Vec<Type>,
    /// In the session language, else the fallback language
    pub full_name: Option<String>,
}

/// Batch listing of forms with their current-generation types in one query
#[derive(Debug, Clone, Default)]
pub struct FormQuery {
    pokemon_id: Option<PokemonId>,
    existing_only: bool,
}

impl FormQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to the forms of one species
    pub fn pokemon(mut self, pokemon_id: PokemonId) -> Self {
        self.pokemon_id = Some(pokemon_id);
        self
    }

    /// Drop forms that did not exist in the resolved generation
    pub fn existing_only(mut self) -> Self {
        self.existing_only = true;
        self
    }

    pub fn to_sql(&self) -> String {
        let current = current_generation_expr("pf");
        let mut conditions = Vec::new();
        if self.pokemon_id.is_some() {
            conditions.push("pf.pokemon_id = :pokemon_id".to_string());
        }
        if self.existing_only {
            conditions.push("g.generation_id IS NOT NULL".to_string());
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        format!(
            "SELECT pf.pokemon_id, pf.form_id, pf.identifier, pf.is_default, pf.\"order\", \
                    {current} AS current_generation_id, \
                    g.generation_id AS appearance_generation_id, \
                    t.id AS type_id, t.identifier AS type_identifier, \
                    COALESCE(n.full_name, fb.full_name) AS full_name \
             FROM pokemon_forms pf \
             LEFT JOIN generation_pokemon_forms g \
               ON g.pokemon_id = pf.pokemon_id AND g.form_id = pf.form_id \
              AND g.generation_id = {current} \
             LEFT JOIN pokemon_types pt \
               ON pt.generation_id = g.generation_id \
              AND pt.pokemon_id = g.pokemon_id AND pt.form_id = g.form_id \
             LEFT JOIN types t ON t.id = pt.type_id \
             LEFT JOIN pokemon_form_names n \
               ON n.pokemon_id = pf.pokemon_id AND n.form_id = pf.form_id \
              AND n.language_id = :language_id \
             LEFT JOIN pokemon_form_names fb \
               ON fb.pokemon_id = pf.pokemon_id AND fb.form_id = pf.form_id \
              AND fb.language_id = :fallback_language_id \
             {where_clause} \
             ORDER BY pf.\"order\", pt.slot",
        )
    }

    pub fn run(&self, conn: &Connection, session: &Session) -> Result<Vec<FormListing>> {
        let sql = self.to_sql();
        tracing::debug!(%sql, "form query");

        let mut params: Vec<(&str, &dyn ToSql)> = vec![
            (SESSION_GENERATION_PARAM, &session.generation_id),
            (":language_id", &session.language_id),
            (":fallback_language_id", &session.fallback_language_id),
        ];
        if let Some(pokemon_id) = &self.pokemon_id {
            params.push((":pokemon_id", pokemon_id));
        }

        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params.as_slice())?;
        let mut listings: Vec<FormListing> = Vec::new();

        while let Some(row) = rows.next()? {
            let form = PokemonForm::from_row(row)?;
            let type_id: Option<i64> = row.get("type_id")?;
            let type_identifier: Option<String> = row.get("type_identifier")?;

            let same_form = listings
                .last()
                .map(|last| last.form.key() == form.key())
                .unwrap_or(false);
            if !same_form {
                listings.push(FormListing {
                    form,
                    generation_id: row.get("current_generation_id")?,
                    types: Vec::new(),
                    full_name: row.get("full_name")?,
                });
            }

            if let (Some(id), Some(identifier), Some(listing)) =
                (type_id, type_identifier, listings.last_mut())
            {
                listing.types.push(Type { id, identifier });
            }
        }

        Ok(listings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expression_correlates_on_alias() {
        let expr = current_generation_expr("f");
        assert!(expr.starts_with("COALESCE(:session_generation_id, (SELECT MAX("));
        assert!(expr.contains("latest_gpf.pokemon_id = f.pokemon_id"));
        assert!(expr.contains("latest_gpf.form_id = f.form_id"));
    }

    #[test]
    fn test_query_filters() {
        let sql = FormQuery::new().to_sql();
        assert!(!sql.contains("WHERE pf.pokemon_id"));
        assert!(!sql.contains("IS NOT NULL"));

        let sql = FormQuery::new().pokemon(479).existing_only().to_sql();
        assert!(sql.contains("WHERE pf.pokemon_id = :pokemon_id AND g.generation_id IS NOT NULL"));
    }
}
