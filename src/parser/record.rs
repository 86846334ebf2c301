use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::collections::HashMap;

use crate::schema::{ArraySource, ColumnType, TableSchema};

/// A parsed row ready for insertion
#[derive(Debug, Clone, Default)]
pub struct ParsedRow {
    pub values: HashMap<String, SqlValue>,
}

impl ParsedRow {
    pub fn get(&self, column: &str) -> &SqlValue {
        self.values.get(column).unwrap_or(&SqlValue::Null)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Text(String),
}

impl SqlValue {
    pub fn bind_to(&self, idx: usize, stmt: &mut rusqlite::Statement) -> rusqlite::Result<()> {
        match self {
            SqlValue::Null => stmt.raw_bind_parameter(idx, rusqlite::types::Null)?,
            SqlValue::Integer(i) => stmt.raw_bind_parameter(idx, i)?,
            SqlValue::Text(s) => stmt.raw_bind_parameter(idx, s.as_str())?,
        }
        Ok(())
    }
}

/// Parse a JSON line into the rows it contributes to the given table.
///
/// Plain tables yield exactly one row; tables with an [`ArraySource`] yield one
/// row per array element (possibly none).
pub fn parse_records(line: &str, schema: &TableSchema) -> Result<Vec<ParsedRow>> {
    let json: Value = serde_json::from_str(line).context("Failed to parse JSON")?;

    match &schema.array_source {
        None => Ok(vec![parse_plain(&json, schema)?]),
        Some(ArraySource::OrderedIntArray {
            array_field,
            key_columns,
            value_column,
            ordinal_column,
        }) => {
            let items = match json.get(*array_field) {
                None | Some(Value::Null) => return Ok(Vec::new()),
                Some(Value::Array(items)) => items,
                Some(_) => bail!("Field '{}' is not an array", array_field),
            };

            let mut key = HashMap::new();
            for col in *key_columns {
                key.insert(
                    col.to_string(),
                    extract_value(&json, col, ColumnType::Integer)?,
                );
            }

            items
                .iter()
                .enumerate()
                .map(|(idx, item)| {
                    let value = item
                        .as_i64()
                        .with_context(|| format!("'{}' holds a non-integer", array_field))?;
                    let mut values = key.clone();
                    values.insert(value_column.to_string(), SqlValue::Integer(value));
                    values.insert(
                        ordinal_column.to_string(),
                        SqlValue::Integer(idx as i64 + 1),
                    );
                    Ok(ParsedRow { values })
                })
                .collect()
        }
    }
}

fn parse_plain(json: &Value, schema: &TableSchema) -> Result<ParsedRow> {
    let mut values = HashMap::new();

    for col in schema.columns {
        let value = extract_value(json, col.json_key(), col.col_type)?;
        if value == SqlValue::Null && !col.nullable {
            bail!("Missing required field '{}'", col.json_key());
        }
        values.insert(col.name.to_string(), value);
    }

    Ok(ParsedRow { values })
}

/// Missing keys and JSON nulls map to NULL; a present value of the wrong
/// type is an error rather than a silent NULL.
fn extract_value(json: &Value, key: &str, col_type: ColumnType) -> Result<SqlValue> {
    let value = match json.get(key) {
        None | Some(Value::Null) => return Ok(SqlValue::Null),
        Some(v) => v,
    };

    let parsed = match col_type {
        ColumnType::Integer => value.as_i64().map(SqlValue::Integer),
        ColumnType::Text => value.as_str().map(|s| SqlValue::Text(s.to_string())),
        ColumnType::Boolean => value
            .as_bool()
            .map(|b| SqlValue::Integer(if b { 1 } else { 0 })),
    };

    parsed.with_context(|| format!("Field '{}' is not of type {:?}", key, col_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tables::{GAME_POKEMON_FORMS, POKEMON_FORMS, POKEMON_FORM_NAMES, POKEMON_TYPES};

    #[test]
    fn test_boolean_becomes_integer() {
        let rows = parse_records(
            r#"{"pokemon_id": 479, "form_id": 2, "identifier": "rotom-heat", "is_default": false, "order": 701}"#,
            &POKEMON_FORMS,
        )
        .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("is_default"), &SqlValue::Integer(0));
        assert_eq!(rows[0].get("identifier"), &SqlValue::Text("rotom-heat".into()));
    }

    #[test]
    fn test_json_field_override() {
        let rows = parse_records(
            r#"{"language_id": 9, "pokemon_id": 479, "form_id": 2, "name": "Heat", "full_name": "Heat Rotom"}"#,
            &POKEMON_FORM_NAMES,
        )
        .unwrap();

        assert_eq!(rows[0].get("form_name"), &SqlValue::Text("Heat".into()));
    }

    #[test]
    fn test_nullable_column_may_be_absent() {
        let rows = parse_records(
            r#"{"game_id": 4, "pokemon_id": 479, "form_id": 3, "generation_id": 4}"#,
            &GAME_POKEMON_FORMS,
        )
        .unwrap();

        assert_eq!(rows[0].get("ingame_internal_id"), &SqlValue::Null);
    }

    #[test]
    fn test_missing_required_field_is_an_error() {
        let result = parse_records(r#"{"pokemon_id": 1, "form_id": 1}"#, &POKEMON_FORMS);
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_type_is_an_error() {
        let result = parse_records(
            r#"{"pokemon_id": "one", "form_id": 1, "identifier": "x", "is_default": true, "order": 1}"#,
            &POKEMON_FORMS,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_type_ids_expand_in_slot_order() {
        let rows = parse_records(
            r#"{"generation_id": 5, "pokemon_id": 479, "form_id": 2, "type_ids": [13, 10]}"#,
            &POKEMON_TYPES,
        )
        .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("slot"), &SqlValue::Integer(1));
        assert_eq!(rows[0].get("type_id"), &SqlValue::Integer(13));
        assert_eq!(rows[1].get("slot"), &SqlValue::Integer(2));
        assert_eq!(rows[1].get("type_id"), &SqlValue::Integer(10));
        assert_eq!(rows[1].get("generation_id"), &SqlValue::Integer(5));
        assert_eq!(rows[1].get("form_id"), &SqlValue::Integer(2));
    }

    #[test]
    fn test_missing_type_ids_yield_no_rows() {
        let rows = parse_records(
            r#"{"generation_id": 5, "pokemon_id": 479, "form_id": 2}"#,
            &POKEMON_TYPES,
        )
        .unwrap();
        assert!(rows.is_empty());
    }
}
