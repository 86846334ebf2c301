use anyhow::{bail, Result};
use std::collections::{HashMap, HashSet, VecDeque};

use super::tables::{get_table, ALL_TABLES};
use super::types::TableSchema;

/// Resolves table dependencies for filtering
pub struct DependencyResolver {
    /// Map of table name -> tables it depends on
    deps: HashMap<&'static str, HashSet<&'static str>>,
    /// Map of table name -> tables that depend on it
    reverse_deps: HashMap<&'static str, HashSet<&'static str>>,
}

impl DependencyResolver {
    pub fn new() -> Self {
        let mut deps: HashMap<&'static str, HashSet<&'static str>> = HashMap::new();
        let mut reverse_deps: HashMap<&'static str, HashSet<&'static str>> = HashMap::new();

        for table in ALL_TABLES {
            let mut table_deps = table.dependencies();
            table_deps.remove(table.name);

            for &dep in &table_deps {
                reverse_deps.entry(dep).or_default().insert(table.name);
            }
            deps.insert(table.name, table_deps);
        }

        Self { deps, reverse_deps }
    }

    /// Given a set of requested tables, resolve all required dependencies.
    /// Returns tables in dependency order (parents before children).
    pub fn resolve_includes(&self, requested: &[&str]) -> Result<Vec<&'static TableSchema>> {
        let mut included: HashSet<&'static str> = HashSet::new();
        let mut queue: VecDeque<&'static str> = VecDeque::new();

        for name in requested {
            match get_table(name) {
                Some(table) => queue.push_back(table.name),
                None => bail!("Unknown table: {}", name),
            }
        }

        while let Some(table_name) = queue.pop_front() {
            if !included.insert(table_name) {
                continue;
            }

            if let Some(table_deps) = self.deps.get(table_name) {
                for &dep in table_deps {
                    if !included.contains(dep) {
                        queue.push_back(dep);
                    }
                }
            }
        }

        self.topological_sort(&included)
    }

    /// Given a set of tables to exclude, return remaining tables in order.
    /// Tables that depend on an excluded table (directly or not) go too.
    pub fn resolve_excludes(&self, excluded: &[&str]) -> Result<Vec<&'static TableSchema>> {
        let mut dropped: HashSet<&'static str> = HashSet::new();
        let mut queue: VecDeque<&'static str> = VecDeque::new();

        for name in excluded {
            match get_table(name) {
                Some(table) => queue.push_back(table.name),
                None => bail!("Unknown table: {}", name),
            }
        }

        while let Some(table_name) = queue.pop_front() {
            if !dropped.insert(table_name) {
                continue;
            }
            if let Some(children) = self.reverse_deps.get(table_name) {
                queue.extend(children.iter().copied());
            }
        }

        let included: HashSet<&'static str> = ALL_TABLES
            .iter()
            .map(|t| t.name)
            .filter(|name| !dropped.contains(name))
            .collect();

        self.topological_sort(&included)
    }

    /// Return all tables in dependency order
    pub fn all_tables_ordered(&self) -> Vec<&'static TableSchema> {
        ALL_TABLES.to_vec()
    }

    /// Topological sort of tables by dependencies, stable w.r.t. registry order
    fn topological_sort(&self, included: &HashSet<&'static str>) -> Result<Vec<&'static TableSchema>> {
        let mut result = Vec::new();
        let mut visited: HashSet<&'static str> = HashSet::new();
        let mut temp_visited: HashSet<&'static str> = HashSet::new();

        for table in ALL_TABLES {
            if included.contains(table.name) && !visited.contains(table.name) {
                self.visit(
                    table.name,
                    included,
                    &mut visited,
                    &mut temp_visited,
                    &mut result,
                )?;
            }
        }

        Ok(result)
    }

    fn visit(
        &self,
        name: &'static str,
        included: &HashSet<&'static str>,
        visited: &mut HashSet<&'static str>,
        temp_visited: &mut HashSet<&'static str>,
        result: &mut Vec<&'static TableSchema>,
    ) -> Result<()> {
        if temp_visited.contains(name) {
            bail!("Circular dependency detected at: {}", name);
        }
        if visited.contains(name) {
            return Ok(());
        }

        temp_visited.insert(name);

        if let Some(deps) = self.deps.get(name) {
            // Self-references (pokemon.preevolution_id) were dropped in new()
            for &dep in deps {
                if included.contains(dep) {
                    self.visit(dep, included, visited, temp_visited, result)?;
                }
            }
        }

        temp_visited.remove(name);
        visited.insert(name);

        if let Some(table) = get_table(name) {
            result.push(table);
        }

        Ok(())
    }
}

impl Default for DependencyResolver {
    fn default() -> Self {
        Self::new()
    }
}
