//! Command implementations

use std::path::Path;

use anyhow::{Context, bail};
use serde::Deserialize;
use snowsync_schema_tools::{EntityDescriptor, MigratorConfig, Namer, WarehouseNamer, plan_tables};

use crate::ConnectionCheck;

/// Desired-schema file layout: a list of entities under `entities`
/// (`[[entities]]` in TOML). JSON files may also hold a bare array.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaFile {
    entities: Vec<EntityDescriptor>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonSchemaFile {
    List(Vec<EntityDescriptor>),
    File(SchemaFile),
}

/// Reads entity descriptors from a `.toml` or `.json` file
pub fn load_entities(path: &Path) -> anyhow::Result<Vec<EntityDescriptor>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read schema file {}", path.display()))?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let entities = match extension.as_deref() {
        Some("toml") => {
            toml::from_str::<SchemaFile>(&text)
                .with_context(|| format!("failed to parse {}", path.display()))?
                .entities
        }
        Some("json") => match serde_json::from_str::<JsonSchemaFile>(&text)
            .with_context(|| format!("failed to parse {}", path.display()))?
        {
            JsonSchemaFile::List(entities) => entities,
            JsonSchemaFile::File(file) => file.entities,
        },
        _ => bail!(
            "unsupported schema file {}: expected a .toml or .json extension",
            path.display()
        ),
    };

    tracing::debug!(path = %path.display(), entities = entities.len(), "loaded schema file");
    Ok(entities)
}

/// `CREATE TABLE` statements for `entities` against an empty database, in
/// creation order
pub fn plan_statements(
    entities: &[EntityDescriptor],
    config: &MigratorConfig,
) -> anyhow::Result<Vec<String>> {
    let namer = <WarehouseNamer>::default();
    let tables = plan_tables(entities, &namer, config).context("failed to plan schema")?;
    tracing::info!(tables = tables.len(), "planned schema");
    Ok(tables.iter().map(|table| table.to_sql()).collect())
}

/// Warehouse names for source identifiers: table names, or column names
/// when `column` is set
pub fn normalize_identifiers(identifiers: &[String], column: bool) -> Vec<String> {
    let namer = <WarehouseNamer>::default();
    identifiers
        .iter()
        .map(|identifier| {
            if column {
                namer.column_name("", identifier)
            } else {
                namer.table_name(identifier)
            }
        })
        .collect()
}

/// One-line summary of a validated connection, safe to print
pub fn describe_connection(check: &ConnectionCheck) -> String {
    match check {
        ConnectionCheck::Dsn(dsn) => format!("dsn {}", dsn.redacted()),
        ConnectionCheck::Password { account, user } => {
            format!("password authentication for {}@{}", user, account)
        }
        ConnectionCheck::KeyPair(credential) => format!(
            "key-pair authentication for {} ({}-bit key, public key fingerprint {})",
            credential.subject(),
            credential.key().bits(),
            credential.fingerprint()
        ),
    }
}
