//! Introspected type to comparable category

use crate::catalog::ColumnType;

/// Comparable type category
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    BigInt,
    Float,
    /// Any character type, bounded or not
    Text,
    Boolean,
    Binary,
    /// Compared by exact (uppercased) name: temporal types and anything
    /// without a category
    Exact(String),
}

impl TypeCategory {
    /// Name used when a category stands in for a type name
    pub fn as_str(&self) -> &str {
        match self {
            TypeCategory::BigInt => "BIGINT",
            TypeCategory::Float => "FLOAT",
            TypeCategory::Text => "TEXT",
            TypeCategory::Boolean => "BOOLEAN",
            TypeCategory::Binary => "VARBINARY",
            TypeCategory::Exact(name) => name,
        }
    }
}

impl std::fmt::Display for TypeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Splits `NUMBER(10,2)` into `("NUMBER", Some(2))`, dropping identity
/// clauses and uppercasing
fn split_type(raw: &str) -> (String, Option<u32>) {
    let upper = raw.trim().to_uppercase();
    let upper = match upper.find(" IDENTITY").or_else(|| upper.find(" AUTOINCREMENT")) {
        Some(pos) => upper[..pos].to_string(),
        None => upper,
    };

    match upper.split_once('(') {
        Some((base, params)) => {
            let scale = params
                .trim_end_matches(')')
                .split(',')
                .nth(1)
                .and_then(|s| s.trim().parse::<u32>().ok());
            (base.trim().to_string(), scale)
        }
        None => (upper.trim().to_string(), None),
    }
}

fn classify(base: &str, scale: Option<u32>) -> Option<TypeCategory> {
    let category = match base {
        "NUMBER" | "DECIMAL" | "NUMERIC" | "FIXED" => {
            if scale.unwrap_or(0) > 0 {
                TypeCategory::Float
            } else {
                TypeCategory::BigInt
            }
        }
        "INT" | "INTEGER" | "BIGINT" | "SMALLINT" | "TINYINT" | "BYTEINT" => TypeCategory::BigInt,
        "FLOAT" | "FLOAT4" | "FLOAT8" | "DOUBLE" | "DOUBLE PRECISION" | "REAL" => {
            TypeCategory::Float
        }
        "TEXT" | "VARCHAR" | "STRING" | "CHAR" | "CHARACTER" | "NCHAR" | "NVARCHAR"
        | "NVARCHAR2" | "CHAR VARYING" | "NCHAR VARYING" => TypeCategory::Text,
        "BOOLEAN" => TypeCategory::Boolean,
        "BINARY" | "VARBINARY" => TypeCategory::Binary,
        "TIMESTAMP_NTZ" | "TIMESTAMP_LTZ" | "TIMESTAMP_TZ" | "TIMESTAMP" | "DATETIME" | "DATE"
        | "TIME" => TypeCategory::Exact(base.to_string()),
        _ => return None,
    };
    Some(category)
}

/// Category of a type name reported by the catalog.
///
/// `scale` comes from NUMERIC_SCALE; when absent it is read from the type
/// parameters. Unknown names pass through unchanged, with a warning.
pub fn normalize_introspected_type(raw: &str, scale: Option<u32>) -> TypeCategory {
    let (base, parsed_scale) = split_type(raw);
    match classify(&base, scale.or(parsed_scale)) {
        Some(category) => category,
        None => {
            tracing::warn!(data_type = %raw, "unknown introspected data type, comparing by name");
            TypeCategory::Exact(base)
        }
    }
}

/// Category of a DDL type as this crate renders it or a caller declares it
pub fn declared_category(ddl_type: &str) -> TypeCategory {
    let (base, scale) = split_type(ddl_type);
    classify(&base, scale).unwrap_or(TypeCategory::Exact(base))
}

/// Column wrapper that reports the normalized category as its type name and
/// delegates every other accessor
#[derive(Debug, Clone)]
pub struct NormalizedColumn<C: ColumnType> {
    inner: C,
    category: TypeCategory,
}

impl<C: ColumnType> NormalizedColumn<C> {
    pub fn new(inner: C) -> Self {
        let scale = inner.decimal_size().map(|(_, scale)| scale);
        let category = normalize_introspected_type(inner.database_type_name(), scale);
        Self { inner, category }
    }

    pub fn category(&self) -> &TypeCategory {
        &self.category
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C: ColumnType> ColumnType for NormalizedColumn<C> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn database_type_name(&self) -> &str {
        self.category.as_str()
    }

    fn length(&self) -> Option<u64> {
        self.inner.length()
    }

    fn decimal_size(&self) -> Option<(u32, u32)> {
        self.inner.decimal_size()
    }

    fn nullable(&self) -> Option<bool> {
        self.inner.nullable()
    }

    fn default_value(&self) -> Option<&str> {
        self.inner.default_value()
    }

    fn primary_key(&self) -> Option<bool> {
        self.inner.primary_key()
    }

    fn auto_increment(&self) -> Option<bool> {
        self.inner.auto_increment()
    }

    fn unique(&self) -> Option<bool> {
        self.inner.unique()
    }
}
