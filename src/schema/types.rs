use std::collections::HashSet;

/// Column data type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Text,
    /// Stored as INTEGER 0/1
    Boolean,
}

impl ColumnType {
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnType::Integer | ColumnType::Boolean => "INTEGER",
            ColumnType::Text => "TEXT",
        }
    }
}

/// Column definition
#[derive(Debug, Clone)]
pub struct Column {
    pub name: &'static str,
    pub col_type: ColumnType,
    pub nullable: bool,
    /// Override JSON field name (default: the column name)
    pub json_field: Option<&'static str>,
}

impl Column {
    /// Create an optional (nullable) column
    pub const fn new(name: &'static str, col_type: ColumnType) -> Self {
        Self {
            name,
            col_type,
            nullable: true,
            json_field: None,
        }
    }

    /// Create a required (non-nullable) column
    pub const fn required(name: &'static str, col_type: ColumnType) -> Self {
        Self {
            name,
            col_type,
            nullable: false,
            json_field: None,
        }
    }

    /// Set the JSON field name (for when it differs from the column name)
    pub const fn json(self, field: &'static str) -> Self {
        Self {
            json_field: Some(field),
            ..self
        }
    }

    pub fn json_key(&self) -> &'static str {
        self.json_field.unwrap_or(self.name)
    }
}

/// What happens to child rows when the referenced parent row is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    Restrict,
    Cascade,
}

/// Foreign key reference, possibly spanning several columns
#[derive(Debug, Clone)]
pub struct ForeignKey {
    pub columns: &'static [&'static str],
    pub references_table: &'static str,
    pub references_columns: &'static [&'static str],
    pub on_delete: OnDelete,
}

impl ForeignKey {
    /// Single-column reference to `references_table(id)`
    pub const fn new(columns: &'static [&'static str], references_table: &'static str) -> Self {
        Self {
            columns,
            references_table,
            references_columns: &["id"],
            on_delete: OnDelete::Restrict,
        }
    }

    /// Composite reference; `columns` and `references_columns` pair up by position
    pub const fn composite(
        columns: &'static [&'static str],
        references_table: &'static str,
        references_columns: &'static [&'static str],
    ) -> Self {
        Self {
            columns,
            references_table,
            references_columns,
            on_delete: OnDelete::Restrict,
        }
    }

    /// Delete child rows together with the parent row
    pub const fn cascade(self) -> Self {
        Self {
            on_delete: OnDelete::Cascade,
            ..self
        }
    }
}

/// Index definition
#[derive(Debug, Clone)]
pub struct Index {
    pub columns: &'static [&'static str],
    pub unique: bool,
}

impl Index {
    /// Create a non-unique index
    pub const fn on(columns: &'static [&'static str]) -> Self {
        Self {
            columns,
            unique: false,
        }
    }

    /// Create a unique index
    pub const fn unique(columns: &'static [&'static str]) -> Self {
        Self {
            columns,
            unique: true,
        }
    }
}

/// Describes how to derive rows from an array nested in another table's records
#[derive(Debug, Clone)]
pub enum ArraySource {
    /// Ordered array of integers:
    /// `{"generation_id": 1, "pokemon_id": 1, "form_id": 1, "type_ids": [12, 4]}`
    ///
    /// Produces one row per element; the parent key columns are copied over,
    /// the element lands in `value_column` and its 1-based position in
    /// `ordinal_column`.
    OrderedIntArray {
        array_field: &'static str,
        key_columns: &'static [&'static str],
        value_column: &'static str,
        ordinal_column: &'static str,
    },
}

/// Table schema definition
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub name: &'static str,
    pub source_file: &'static str,
    pub columns: &'static [Column],
    pub primary_key: &'static [&'static str],
    pub foreign_keys: &'static [ForeignKey],
    /// Explicit index definitions; unique ones become table constraints
    pub indexes: &'static [Index],
    /// Raw CHECK expressions
    pub checks: &'static [&'static str],
    /// For join tables: how to extract rows from another table's records
    pub array_source: Option<ArraySource>,
}

impl TableSchema {
    /// Get all tables this table depends on (FK parents)
    pub fn dependencies(&self) -> HashSet<&'static str> {
        self.foreign_keys
            .iter()
            .map(|fk| fk.references_table)
            .collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }
}
