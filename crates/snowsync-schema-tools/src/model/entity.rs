//! Entity, relationship and check-constraint descriptors

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::FieldDescriptor;
use crate::{SchemaError, SchemaResult};

/// Referential action for ON DELETE / ON UPDATE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForeignKeyAction {
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

impl ForeignKeyAction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ForeignKeyAction::NoAction => "NO ACTION",
            ForeignKeyAction::Restrict => "RESTRICT",
            ForeignKeyAction::Cascade => "CASCADE",
            ForeignKeyAction::SetNull => "SET NULL",
            ForeignKeyAction::SetDefault => "SET DEFAULT",
        }
    }
}

/// A foreign key between two entities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipDescriptor {
    /// Entity whose table holds the key columns. When absent, the entity
    /// declaring the relationship owns it.
    #[serde(default)]
    pub owner: Option<String>,
    /// Key fields on the owning entity, in order
    pub local_fields: Vec<String>,
    pub referenced_entity: String,
    /// Referenced fields, positionally matched with `local_fields`
    pub referenced_fields: Vec<String>,
    #[serde(default)]
    pub on_delete: Option<ForeignKeyAction>,
    #[serde(default)]
    pub on_update: Option<ForeignKeyAction>,
}

impl RelationshipDescriptor {
    pub fn new(
        local_fields: impl IntoIterator<Item = impl Into<String>>,
        referenced_entity: impl Into<String>,
        referenced_fields: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            owner: None,
            local_fields: local_fields.into_iter().map(Into::into).collect(),
            referenced_entity: referenced_entity.into(),
            referenced_fields: referenced_fields.into_iter().map(Into::into).collect(),
            on_delete: None,
            on_update: None,
        }
    }

    /// Places the key columns on another entity (has-many style declaration)
    pub fn owned_by(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn on_delete(mut self, action: ForeignKeyAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    pub fn on_update(mut self, action: ForeignKeyAction) -> Self {
        self.on_update = Some(action);
        self
    }

    /// Owning entity, given the entity that declared the relationship
    pub fn owner_or<'a>(&'a self, declaring_entity: &'a str) -> &'a str {
        self.owner.as_deref().unwrap_or(declaring_entity)
    }
}

/// A CHECK constraint on an entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckConstraintDescriptor {
    /// Explicit constraint name; derived from the table and field when absent
    #[serde(default)]
    pub name: Option<String>,
    /// Field the check is attached to
    #[serde(default)]
    pub field: Option<String>,
    /// Boolean SQL expression, emitted verbatim
    pub expression: String,
}

impl CheckConstraintDescriptor {
    pub fn on_field(field: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            name: None,
            field: Some(field.into()),
            expression: expression.into(),
        }
    }

    pub fn named(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            field: None,
            expression: expression.into(),
        }
    }
}

/// A logical table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    pub name: String,
    /// Column emission order and composite primary key order
    pub fields: Vec<FieldDescriptor>,
    #[serde(default)]
    pub relationships: Vec<RelationshipDescriptor>,
    #[serde(default)]
    pub checks: Vec<CheckConstraintDescriptor>,
}

impl EntityDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            relationships: Vec::new(),
            checks: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_relationship(mut self, relationship: RelationshipDescriptor) -> Self {
        self.relationships.push(relationship);
        self
    }

    pub fn with_check(mut self, check: CheckConstraintDescriptor) -> Self {
        self.checks.push(check);
        self
    }

    /// Looks up a field by source name, falling back to a case-insensitive
    /// match on the explicit column name
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .or_else(|| {
                self.fields.iter().find(|f| {
                    f.name.eq_ignore_ascii_case(name)
                        || f.column_name
                            .as_deref()
                            .is_some_and(|c| c.eq_ignore_ascii_case(name))
                })
            })
    }

    pub fn primary_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.primary_key)
    }

    /// Checks the structural invariants that do not depend on naming:
    /// a non-empty name, at least one field, well-formed relationships and
    /// checks that point at declared fields.
    ///
    /// Column-name uniqueness is checked once names are resolved, see
    /// [`crate::TableSchema::resolve`].
    pub fn validate(&self) -> SchemaResult<()> {
        if self.name.trim().is_empty() {
            return Err(SchemaError::InvalidEntity {
                entity: self.name.clone(),
                reason: "entity name is empty".into(),
            });
        }
        if self.fields.is_empty() {
            return Err(SchemaError::InvalidEntity {
                entity: self.name.clone(),
                reason: "entity declares no fields".into(),
            });
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(SchemaError::InvalidEntity {
                    entity: self.name.clone(),
                    reason: "field name is empty".into(),
                });
            }
            if !seen.insert(field.name.to_uppercase()) {
                return Err(SchemaError::DuplicateField {
                    entity: self.name.clone(),
                    column: field.name.clone(),
                });
            }
        }

        for relationship in &self.relationships {
            if relationship.local_fields.is_empty() {
                return Err(SchemaError::InvalidRelationship {
                    entity: self.name.clone(),
                    reason: format!(
                        "relationship to '{}' has no key fields",
                        relationship.referenced_entity
                    ),
                });
            }
            if relationship.local_fields.len() != relationship.referenced_fields.len() {
                return Err(SchemaError::InvalidRelationship {
                    entity: self.name.clone(),
                    reason: format!(
                        "relationship to '{}' pairs {} key fields with {} referenced fields",
                        relationship.referenced_entity,
                        relationship.local_fields.len(),
                        relationship.referenced_fields.len()
                    ),
                });
            }
            if relationship.owner_or(&self.name) == self.name {
                for local in &relationship.local_fields {
                    if self.field(local).is_none() {
                        return Err(SchemaError::UnknownField {
                            entity: self.name.clone(),
                            field: local.clone(),
                        });
                    }
                }
            }
        }

        for check in &self.checks {
            if check.expression.trim().is_empty() {
                return Err(SchemaError::InvalidEntity {
                    entity: self.name.clone(),
                    reason: "check constraint has an empty expression".into(),
                });
            }
            if let Some(field) = &check.field {
                if self.field(field).is_none() {
                    return Err(SchemaError::UnknownField {
                        entity: self.name.clone(),
                        field: field.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}
