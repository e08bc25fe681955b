//! Resolution of entity descriptors to warehouse names

use std::collections::{HashMap, HashSet};

use crate::constraint::{ConstraintBuilder, ForeignKeyDefinition};
use crate::model::{CheckConstraintDescriptor, EntityDescriptor, FieldDescriptor};
use crate::naming::{Namer, fold_identifier, quote_reserved};
use crate::ordering::dependency_order;
use crate::{SchemaError, SchemaResult};

/// A field together with its warehouse column name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumn {
    /// Column name as emitted in DDL (reserved words quoted)
    pub name: String,
    pub field: FieldDescriptor,
}

/// An entity with every name resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub entity: String,
    pub table: String,
    pub columns: Vec<ResolvedColumn>,
    /// Checks with the column they are attached to, if any
    pub checks: Vec<(Option<String>, CheckConstraintDescriptor)>,
}

impl TableSchema {
    /// Validates `entity` and resolves its table and column names.
    ///
    /// Fails when two fields resolve to the same column once case and
    /// quoting are folded away, or when two checks end up with the same
    /// constraint name.
    pub fn resolve(entity: &EntityDescriptor, namer: &dyn Namer) -> SchemaResult<Self> {
        entity.validate()?;

        let table = namer.table_name(&entity.name);
        let mut seen = HashSet::with_capacity(entity.fields.len());
        let mut columns = Vec::with_capacity(entity.fields.len());
        for field in &entity.fields {
            let name = match &field.column_name {
                Some(explicit) if explicit.starts_with('"') => explicit.clone(),
                Some(explicit) => quote_reserved(explicit.to_uppercase()),
                None => namer.column_name(&table, &field.name),
            };
            if !seen.insert(fold_identifier(&name)) {
                return Err(SchemaError::DuplicateField {
                    entity: entity.name.clone(),
                    column: name,
                });
            }
            columns.push(ResolvedColumn {
                name,
                field: field.clone(),
            });
        }

        let mut schema = Self {
            entity: entity.name.clone(),
            table,
            columns,
            checks: Vec::with_capacity(entity.checks.len()),
        };
        for check in &entity.checks {
            let column = match &check.field {
                Some(field) => Some(schema.require_column(field)?.name.clone()),
                None => None,
            };
            schema.checks.push((column, check.clone()));
        }

        let builder = ConstraintBuilder::new(namer);
        let mut check_names = HashSet::with_capacity(schema.checks.len());
        for (position, (column, check)) in schema.checks.iter().enumerate() {
            let name = builder.check_name(&schema.table, column.as_deref(), check, position + 1);
            if !check_names.insert(fold_identifier(&name)) {
                return Err(SchemaError::InvalidEntity {
                    entity: entity.name.clone(),
                    reason: format!(
                        "check constraint name {} is used more than once; name one of the checks explicitly",
                        name
                    ),
                });
            }
        }
        Ok(schema)
    }

    /// Column for a field, looked up by source name or column name
    pub fn column(&self, field: &str) -> Option<&ResolvedColumn> {
        self.columns
            .iter()
            .find(|c| c.field.name == field)
            .or_else(|| {
                let folded = fold_identifier(field);
                self.columns.iter().find(|c| {
                    fold_identifier(&c.field.name) == folded || fold_identifier(&c.name) == folded
                })
            })
    }

    pub fn require_column(&self, field: &str) -> SchemaResult<&ResolvedColumn> {
        self.column(field).ok_or_else(|| SchemaError::UnknownField {
            entity: self.entity.clone(),
            field: field.to_string(),
        })
    }

    /// Primary key columns in field order
    pub fn primary_key(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.field.primary_key)
            .map(|c| c.name.clone())
            .collect()
    }
}

/// A set of entities resolved together, in dependency order, with each
/// foreign key attached to the table that owns it
#[derive(Debug, Clone)]
pub struct ResolvedSchema {
    pub tables: Vec<TableSchema>,
    /// Foreign keys owned by `tables[i]`
    pub foreign_keys: Vec<Vec<ForeignKeyDefinition>>,
}

impl ResolvedSchema {
    pub fn resolve(entities: &[EntityDescriptor], namer: &dyn Namer) -> SchemaResult<Self> {
        let order = dependency_order(entities)?;
        let tables = order
            .iter()
            .map(|&i| TableSchema::resolve(&entities[i], namer))
            .collect::<SchemaResult<Vec<_>>>()?;

        let position: HashMap<String, usize> = tables
            .iter()
            .enumerate()
            .map(|(i, t)| (t.entity.to_uppercase(), i))
            .collect();

        let mut foreign_keys = vec![Vec::new(); tables.len()];
        for &i in &order {
            let entity = &entities[i];
            for relationship in &entity.relationships {
                let owner_name = relationship.owner_or(&entity.name);
                let Some(&owner) = position.get(&owner_name.to_uppercase()) else {
                    tracing::debug!(
                        owner = %owner_name,
                        referenced = %relationship.referenced_entity,
                        "skipping foreign key owned by an entity outside this pass"
                    );
                    continue;
                };
                let owner_table = &tables[owner];

                let columns = relationship
                    .local_fields
                    .iter()
                    .map(|f| owner_table.require_column(f).map(|c| c.name.clone()))
                    .collect::<SchemaResult<Vec<_>>>()?;

                let (referenced_table, referenced_columns) =
                    match position.get(&relationship.referenced_entity.to_uppercase()) {
                        Some(&referenced) => {
                            let target = &tables[referenced];
                            let columns = relationship
                                .referenced_fields
                                .iter()
                                .map(|f| target.require_column(f).map(|c| c.name.clone()))
                                .collect::<SchemaResult<Vec<_>>>()?;
                            (target.table.clone(), columns)
                        }
                        None => {
                            let table = namer.table_name(&relationship.referenced_entity);
                            let columns = relationship
                                .referenced_fields
                                .iter()
                                .map(|f| namer.column_name(&table, f))
                                .collect();
                            (table, columns)
                        }
                    };

                let definition = ForeignKeyDefinition {
                    table: owner_table.table.clone(),
                    columns,
                    referenced_table,
                    referenced_columns,
                    on_delete: relationship.on_delete,
                    on_update: relationship.on_update,
                };
                if !foreign_keys[owner].contains(&definition) {
                    foreign_keys[owner].push(definition);
                }
            }
        }

        Ok(Self {
            tables,
            foreign_keys,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TableSchema, &[ForeignKeyDefinition])> {
        self.tables
            .iter()
            .zip(self.foreign_keys.iter().map(Vec::as_slice))
    }

    pub fn table(&self, entity: &str) -> Option<(&TableSchema, &[ForeignKeyDefinition])> {
        self.iter()
            .find(|(t, _)| t.entity.eq_ignore_ascii_case(entity))
    }
}
