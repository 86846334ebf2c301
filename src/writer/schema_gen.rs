use crate::schema::{OnDelete, TableSchema};

/// Quote an identifier; `order` is a keyword and must always be quoted
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn column_list(columns: &[&str]) -> String {
    columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Generate CREATE TABLE SQL for a table schema
pub fn generate_create_table(schema: &TableSchema) -> String {
    let mut sql = format!("CREATE TABLE {} (\n", quote_ident(schema.name));
    let mut lines = Vec::new();

    for col in schema.columns {
        let null_constraint = if col.nullable { "" } else { " NOT NULL" };
        lines.push(format!(
            "    {} {}{}",
            quote_ident(col.name),
            col.col_type.sql_type(),
            null_constraint
        ));
    }

    lines.push(format!("    PRIMARY KEY ({})", column_list(schema.primary_key)));

    // Unique constraints double as FK targets (games(id, generation_id))
    for index in schema.indexes.iter().filter(|i| i.unique) {
        lines.push(format!("    UNIQUE ({})", column_list(index.columns)));
    }

    for check in schema.checks {
        lines.push(format!("    CHECK ({})", check));
    }

    for fk in schema.foreign_keys {
        let mut line = format!(
            "    FOREIGN KEY ({}) REFERENCES {}({})",
            column_list(fk.columns),
            quote_ident(fk.references_table),
            column_list(fk.references_columns)
        );
        if fk.on_delete == OnDelete::Cascade {
            line.push_str(" ON DELETE CASCADE");
        }
        // Rows may point at a parent later in the same file
        if fk.references_table == schema.name {
            line.push_str(" DEFERRABLE INITIALLY DEFERRED");
        }
        lines.push(line);
    }

    sql.push_str(&lines.join(",\n"));
    sql.push_str("\n)");

    sql
}

/// Generate CREATE INDEX statements for non-unique indexes and FK columns
/// not already covered by the leading columns of the primary key
pub fn generate_indexes(schema: &TableSchema) -> Vec<String> {
    let mut wanted: Vec<&[&str]> = schema
        .indexes
        .iter()
        .filter(|i| !i.unique)
        .map(|i| i.columns)
        .collect();

    for fk in schema.foreign_keys {
        let covered_by_pk = schema.primary_key.starts_with(fk.columns);
        if !covered_by_pk && !wanted.contains(&fk.columns) {
            wanted.push(fk.columns);
        }
    }

    wanted
        .into_iter()
        .map(|columns| {
            format!(
                "CREATE INDEX {} ON {}({})",
                quote_ident(&format!("idx_{}_{}", schema.name, columns.join("_"))),
                quote_ident(schema.name),
                column_list(columns)
            )
        })
        .collect()
}
