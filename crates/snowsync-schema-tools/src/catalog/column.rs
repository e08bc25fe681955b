//! Introspected column metadata

use serde::{Deserialize, Serialize};

/// Accessors over a live column's metadata.
///
/// `None` means the catalog did not report the attribute, which is
/// different from reporting it as false or zero.
pub trait ColumnType: Send + Sync {
    fn name(&self) -> &str;
    /// Type name as the catalog spells it (e.g. `NUMBER`, `TEXT`)
    fn database_type_name(&self) -> &str;
    /// Character or byte length
    fn length(&self) -> Option<u64>;
    /// Numeric precision and scale
    fn decimal_size(&self) -> Option<(u32, u32)>;
    fn nullable(&self) -> Option<bool>;
    fn default_value(&self) -> Option<&str>;
    fn primary_key(&self) -> Option<bool>;
    fn auto_increment(&self) -> Option<bool>;
    fn unique(&self) -> Option<bool>;
}

/// One row of INFORMATION_SCHEMA.COLUMNS
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntrospectedColumn {
    pub name: String,
    pub data_type: String,
    pub length: Option<u64>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub nullable: Option<bool>,
    pub default_value: Option<String>,
    pub primary_key: Option<bool>,
    pub auto_increment: Option<bool>,
    pub unique: Option<bool>,
    pub comment: Option<String>,
}

impl IntrospectedColumn {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            ..Default::default()
        }
    }

    pub fn with_length(mut self, length: u64) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_numeric(mut self, precision: u32, scale: u32) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }

    pub fn with_identity(mut self) -> Self {
        self.auto_increment = Some(true);
        self
    }
}

impl ColumnType for IntrospectedColumn {
    fn name(&self) -> &str {
        &self.name
    }

    fn database_type_name(&self) -> &str {
        &self.data_type
    }

    fn length(&self) -> Option<u64> {
        self.length
    }

    fn decimal_size(&self) -> Option<(u32, u32)> {
        self.precision
            .map(|precision| (precision, self.scale.unwrap_or(0)))
    }

    fn nullable(&self) -> Option<bool> {
        self.nullable
    }

    fn default_value(&self) -> Option<&str> {
        self.default_value.as_deref()
    }

    fn primary_key(&self) -> Option<bool> {
        self.primary_key
    }

    fn auto_increment(&self) -> Option<bool> {
        self.auto_increment
    }

    fn unique(&self) -> Option<bool> {
        self.unique
    }
}
