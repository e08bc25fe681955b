//! Warehouse naming policy

use ring::digest;

use super::{DefaultNamer, Namer};

/// Longest identifier the warehouse accepts
pub const MAX_IDENTIFIER_LENGTH: usize = 255;

/// Bytes of the SHA-1 digest kept in a truncated name (16 hex characters)
const DIGEST_BYTES: usize = 8;

/// Column names that collide with warehouse keywords and must be quoted
pub const RESERVED_COLUMN_NAMES: &[&str] = &["ORDER", "LOCALITY"];

/// Uppercases `name` and, if it exceeds [`MAX_IDENTIFIER_LENGTH`],
/// truncates it to `<prefix>_<digest>` where the digest is taken over the
/// whole uppercased name.
pub fn truncate_with_hash(name: &str) -> String {
    truncate_with_hash_to(name, MAX_IDENTIFIER_LENGTH)
}

/// [`truncate_with_hash`] against an arbitrary limit.
///
/// The kept prefix is never shorter than one character, so a limit smaller
/// than the suffix produces a name longer than the limit.
pub fn truncate_with_hash_to(name: &str, limit: usize) -> String {
    let upper = name.to_uppercase();
    if upper.chars().count() <= limit {
        return upper;
    }

    let hashed = digest::digest(&digest::SHA1_FOR_LEGACY_USE_ONLY, upper.as_bytes());
    let tail = hex::encode(&hashed.as_ref()[..DIGEST_BYTES]);
    let keep = limit.saturating_sub(1 + tail.len()).max(1);
    let prefix: String = upper.chars().take(keep).collect();

    format!("{}_{}", prefix, tail)
}

/// Quotes `upper` when it is a reserved column name
pub fn quote_reserved(upper: String) -> String {
    if RESERVED_COLUMN_NAMES.contains(&upper.as_str()) {
        format!("\"{}\"", upper)
    } else {
        upper
    }
}

/// Comparison key for identifiers: surrounding quotes removed, uppercased.
///
/// The warehouse folds unquoted identifiers to uppercase, so a declared
/// `"ORDER"` and an introspected `ORDER` refer to the same column.
pub fn fold_identifier(name: &str) -> String {
    name.trim().trim_matches('"').to_uppercase()
}

/// Naming strategy that applies the warehouse policy over a base strategy
#[derive(Debug, Clone, Default)]
pub struct WarehouseNamer<N: Namer = DefaultNamer> {
    base: N,
}

impl<N: Namer> WarehouseNamer<N> {
    pub fn new(base: N) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &N {
        &self.base
    }
}

impl<N: Namer> Namer for WarehouseNamer<N> {
    fn table_name(&self, entity: &str) -> String {
        self.base.table_name(entity).to_uppercase()
    }

    fn schema_name(&self, table: &str) -> String {
        self.base.schema_name(table).to_uppercase()
    }

    fn join_table_name(&self, joint: &str) -> String {
        self.base.join_table_name(joint).to_uppercase()
    }

    fn column_name(&self, table: &str, field: &str) -> String {
        quote_reserved(self.base.column_name(table, field).to_uppercase())
    }

    fn relationship_fk_name(&self, table: &str, referenced_table: &str, columns: &[String]) -> String {
        truncate_with_hash(&self.base.relationship_fk_name(table, referenced_table, columns))
    }

    fn checker_name(&self, table: &str, column: &str) -> String {
        truncate_with_hash(&self.base.checker_name(table, column))
    }

    fn index_name(&self, table: &str, column: &str) -> String {
        truncate_with_hash(&self.base.index_name(table, column))
    }

    fn unique_name(&self, table: &str, column: &str) -> String {
        truncate_with_hash(&format!("{}_{}", table, column))
    }
}
