use crate::schema::{DependencyResolver, TableSchema};
use anyhow::{bail, Result};
use tracing::info;

/// Resolves which tables to load based on include/exclude filters
pub fn resolve_tables(
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
) -> Result<Vec<&'static TableSchema>> {
    let resolver = DependencyResolver::new();

    match (include, exclude) {
        (Some(_), Some(_)) => {
            bail!("Cannot use both --include and --exclude at the same time");
        }
        (Some(include_list), None) => {
            let refs: Vec<&str> = include_list.iter().map(|s| s.as_str()).collect();
            let tables = resolver.resolve_includes(&refs)?;
            info!(
                requested = ?refs,
                resolved = ?tables.iter().map(|t| t.name).collect::<Vec<_>>(),
                "including tables with their parents"
            );
            Ok(tables)
        }
        (None, Some(exclude_list)) => {
            let refs: Vec<&str> = exclude_list.iter().map(|s| s.as_str()).collect();
            let tables = resolver.resolve_excludes(&refs)?;
            info!(excluded = ?refs, remaining = tables.len(), "excluding tables and their dependants");
            Ok(tables)
        }
        (None, None) => Ok(resolver.all_tables_ordered()),
    }
}
