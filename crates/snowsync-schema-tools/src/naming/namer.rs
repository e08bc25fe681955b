//! Base naming strategy

use convert_case::{Case, Casing};

/// Produces table, column and constraint names from source identifiers
pub trait Namer: Send + Sync {
    /// Table name for an entity
    fn table_name(&self, entity: &str) -> String;
    /// Entity name for a table
    fn schema_name(&self, table: &str) -> String;
    /// Table name for a many-to-many join entity
    fn join_table_name(&self, joint: &str) -> String;
    /// Column name for a field of `table`
    fn column_name(&self, table: &str, field: &str) -> String;
    /// Foreign-key constraint name
    fn relationship_fk_name(&self, table: &str, referenced_table: &str, columns: &[String]) -> String;
    /// Check constraint name
    fn checker_name(&self, table: &str, column: &str) -> String;
    /// Index name
    fn index_name(&self, table: &str, column: &str) -> String;
    /// Unique constraint name
    fn unique_name(&self, table: &str, column: &str) -> String;
}

/// Options for [`DefaultNamer`]
#[derive(Debug, Clone, Default)]
pub struct NamingConfig {
    /// Prepended to every table name
    pub table_prefix: String,
    /// Use entity names as-is instead of pluralizing them
    pub singular_table: bool,
}

impl NamingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    pub fn with_singular_tables(mut self) -> Self {
        self.singular_table = true;
        self
    }
}

/// Snake-case naming with pluralized table names
#[derive(Debug, Clone, Default)]
pub struct DefaultNamer {
    config: NamingConfig,
}

impl DefaultNamer {
    pub fn new(config: NamingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NamingConfig {
        &self.config
    }
}

impl Namer for DefaultNamer {
    fn table_name(&self, entity: &str) -> String {
        let snake = to_snake(entity);
        if self.config.singular_table {
            format!("{}{}", self.config.table_prefix, snake)
        } else {
            format!("{}{}", self.config.table_prefix, pluralize(&snake))
        }
    }

    fn schema_name(&self, table: &str) -> String {
        let table = table
            .strip_prefix(self.config.table_prefix.as_str())
            .unwrap_or(table);
        let singular = if self.config.singular_table {
            table.to_string()
        } else {
            singularize(table)
        };
        singular.to_case(Case::Pascal)
    }

    fn join_table_name(&self, joint: &str) -> String {
        let snake = to_snake(joint);
        if self.config.singular_table || joint.contains('.') {
            format!("{}{}", self.config.table_prefix, snake)
        } else {
            format!("{}{}", self.config.table_prefix, pluralize(&snake))
        }
    }

    fn column_name(&self, _table: &str, field: &str) -> String {
        to_snake(field)
    }

    fn relationship_fk_name(&self, table: &str, referenced_table: &str, columns: &[String]) -> String {
        let mut name = format!("fk_{}_{}", table, referenced_table);
        for column in columns {
            name.push('_');
            name.push_str(column);
        }
        name
    }

    fn checker_name(&self, table: &str, column: &str) -> String {
        format!("chk_{}_{}", table, column)
    }

    fn index_name(&self, table: &str, column: &str) -> String {
        format!("idx_{}_{}", table, column)
    }

    fn unique_name(&self, table: &str, column: &str) -> String {
        format!("uni_{}_{}", table, column)
    }
}

fn to_snake(identifier: &str) -> String {
    // Dotted names are already qualified; convert each part on its own.
    identifier
        .split('.')
        .map(|part| part.to_case(Case::Snake))
        .collect::<Vec<_>>()
        .join(".")
}

fn pluralize(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    if lower.ends_with("ss")
        || lower.ends_with('x')
        || lower.ends_with('z')
        || lower.ends_with("ch")
        || lower.ends_with("sh")
    {
        return format!("{}es", word);
    }
    if lower.ends_with('s') {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix(['y', 'Y']) {
        let before = stem.chars().last().map(|c| c.to_ascii_lowercase());
        if before.is_some_and(|c| !"aeiou".contains(c)) {
            return format!("{}ies", stem);
        }
    }
    format!("{}s", word)
}

fn singularize(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    if lower.ends_with("ies") && word.len() > 3 {
        return format!("{}y", &word[..word.len() - 3]);
    }
    for suffix in ["sses", "xes", "zes", "ches", "shes"] {
        if lower.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if lower.ends_with('s') && !lower.ends_with("ss") {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

#[cfg(test)]
mod inflection_tests {
    use super::*;

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize("user"), "users");
        assert_eq!(pluralize("company"), "companies");
        assert_eq!(pluralize("day"), "days");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("address"), "addresses");
        assert_eq!(pluralize("status"), "status");
    }

    #[test]
    fn test_singularize() {
        assert_eq!(singularize("users"), "user");
        assert_eq!(singularize("companies"), "company");
        assert_eq!(singularize("boxes"), "box");
        assert_eq!(singularize("addresses"), "address");
        assert_eq!(singularize("access"), "access");
    }
}
