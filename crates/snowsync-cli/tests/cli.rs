//! Drives the command functions against files on disk

use std::fs;
use std::path::{Path, PathBuf};

use indoc::indoc;
use pretty_assertions::assert_eq;
use snowsync_cli::*;
use snowsync_schema_tools::MigratorConfig;
use tempfile::TempDir;

const USERS_CREATE: &str = "CREATE TABLE IF NOT EXISTS USERS (ID BIGINT IDENTITY(1,1) NOT NULL, \
    NAME VARCHAR NOT NULL, EMAIL VARCHAR(256) UNIQUE, PRIMARY KEY (ID)) CHANGE_TRACKING = TRUE";

const ORDERS_CREATE: &str = "CREATE TABLE IF NOT EXISTS ORDERS (ID BIGINT NOT NULL, \
    USER_ID BIGINT NOT NULL, TOTAL FLOAT, PRIMARY KEY (ID), \
    CONSTRAINT FK_ORDERS_USERS_USER_ID FOREIGN KEY (USER_ID) REFERENCES USERS (ID) ENFORCED, \
    CONSTRAINT CHK_ORDERS_TOTAL CHECK (TOTAL >= 0)) CHANGE_TRACKING = TRUE";

/// Orders are declared first; planning must still create users first.
const SCHEMA_TOML: &str = indoc! {r#"
    [[entities]]
    name = "Order"

    [[entities.fields]]
    name = "id"
    type = "int"
    primary_key = true

    [[entities.fields]]
    name = "user_id"
    type = "int"
    nullable = false

    [[entities.fields]]
    name = "total"
    type = "float"

    [[entities.relationships]]
    local_fields = ["user_id"]
    referenced_entity = "User"
    referenced_fields = ["id"]

    [[entities.checks]]
    field = "total"
    expression = "TOTAL >= 0"

    [[entities]]
    name = "User"

    [[entities.fields]]
    name = "id"
    type = "int"
    primary_key = true
    auto_increment = true

    [[entities.fields]]
    name = "name"
    type = "string"
    nullable = false

    [[entities.fields]]
    name = "email"
    type = "string"
    unique = true
"#};

const RSA_2048: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../snowsync-driver-snowflake/tests/fixtures/rsa_2048.pem"
);

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_plan_from_toml_in_dependency_order() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "schema.toml", SCHEMA_TOML);

    let entities = load_entities(&path).unwrap();
    let statements = plan_statements(&entities, &MigratorConfig::default()).unwrap();

    assert_eq!(statements, vec![USERS_CREATE.to_string(), ORDERS_CREATE.to_string()]);
}

#[test]
fn test_plan_from_json_array() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "schema.json",
        r#"[{"name": "Tag", "fields": [{"name": "label", "type": "string", "size": 64}]}]"#,
    );

    let entities = load_entities(&path).unwrap();
    let statements =
        plan_statements(&entities, &MigratorConfig::new().without_change_tracking()).unwrap();

    assert_eq!(
        statements,
        vec!["CREATE TABLE IF NOT EXISTS TAGS (LABEL VARCHAR(64))".to_string()]
    );
}

#[test]
fn test_plan_without_foreign_keys() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "schema.toml", SCHEMA_TOML);
    let config = MigratorConfig::new().without_foreign_keys();

    let statements = plan_statements(&load_entities(&path).unwrap(), &config).unwrap();

    assert!(statements.iter().all(|s| !s.contains("FOREIGN KEY")));
}

#[test]
fn test_unknown_schema_extension_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "schema.yaml", "entities: []");

    let err = load_entities(&path).unwrap_err();
    assert!(err.to_string().contains("expected a .toml or .json"), "{err:#}");
}

#[test]
fn test_missing_schema_file_names_the_path() {
    let err = load_entities(Path::new("/nonexistent/schema.toml")).unwrap_err();
    assert!(format!("{err:#}").contains("/nonexistent/schema.toml"));
}

#[test]
fn test_cyclic_schema_fails_to_plan() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "schema.toml",
        indoc! {r#"
            [[entities]]
            name = "A"
            fields = [{ name = "b_id", type = "int" }]
            relationships = [{ local_fields = ["b_id"], referenced_entity = "B", referenced_fields = ["id"] }]

            [[entities]]
            name = "B"
            fields = [{ name = "a_id", type = "int" }]
            relationships = [{ local_fields = ["a_id"], referenced_entity = "A", referenced_fields = ["id"] }]
        "#},
    );

    let err = plan_statements(&load_entities(&path).unwrap(), &MigratorConfig::default())
        .unwrap_err();
    assert!(format!("{err:#}").contains("failed to plan schema"));
}

#[test]
fn test_normalize_identifiers() {
    let tables = normalize_identifiers(&["UserProfile".into(), "Company".into()], false);
    assert_eq!(tables, vec!["USER_PROFILES", "COMPANIES"]);

    let columns = normalize_identifiers(&["EmailAddress".into(), "order".into()], true);
    assert_eq!(columns, vec!["EMAIL_ADDRESS", "\"ORDER\""]);
}

#[test]
fn test_config_file_sections() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "snowsync.toml",
        indoc! {r#"
            [connection]
            account = "xy12345"
            user = "loader"
            database = "ANALYTICS"
            private_key_path = "keys/loader.p8"

            [migrator]
            schema = "PUBLIC"
            change_tracking = false
        "#},
    );

    let config = CliConfig::load(&path).unwrap();

    assert_eq!(
        config.migrator,
        MigratorConfig::new().with_schema("PUBLIC").without_change_tracking()
    );
    assert_eq!(
        config.connection.private_key_path,
        Some(dir.path().join("keys/loader.p8"))
    );
}

#[test]
fn test_empty_config_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "snowsync.toml", "");

    let config = CliConfig::load(&path).unwrap();
    assert_eq!(config, CliConfig::default());
    assert!(config.connection.is_empty());
    assert!(config.migrator.change_tracking);
}

#[test]
fn test_unknown_config_key_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "snowsync.toml", "[connection]\npasword = \"x\"\n");

    assert!(CliConfig::load(&path).is_err());
}

#[test]
fn test_check_key_pair_connection() {
    let settings = ConnectionSettings {
        account: Some("xy12345.us-east-1".into()),
        user: Some("loader".into()),
        database: Some("ANALYTICS".into()),
        private_key_path: Some(PathBuf::from(RSA_2048)),
        ..Default::default()
    };

    let summary = describe_connection(&settings.check().unwrap());
    assert_eq!(
        summary,
        "key-pair authentication for XY12345.LOADER (2048-bit key, public key fingerprint \
         SHA256:GjiMcGcLk4vhsYYXWnMzhaAQw2S99zCsfyJ61+7O1jY=)"
    );
}

#[test]
fn test_check_key_pair_reports_missing_database() {
    let settings = ConnectionSettings {
        account: Some("xy12345".into()),
        user: Some("loader".into()),
        private_key_path: Some(PathBuf::from(RSA_2048)),
        ..Default::default()
    };

    let err = settings.check().unwrap_err();
    assert!(format!("{err:#}").contains("database is required"), "{err:#}");
}

#[test]
fn test_check_dsn_is_redacted() {
    let settings = ConnectionSettings {
        dsn: Some("loader:s3cret@xy12345/ANALYTICS".into()),
        ..Default::default()
    };

    let summary = describe_connection(&settings.check().unwrap());
    assert!(summary.starts_with("dsn "));
    assert!(!summary.contains("s3cret"));
    assert!(!format!("{:?}", settings).contains("s3cret"));
}

#[test]
fn test_check_password_requires_account() {
    let settings = ConnectionSettings {
        user: Some("loader".into()),
        password: Some("s3cret".into()),
        ..Default::default()
    };
    let err = settings.check().unwrap_err();
    assert_eq!(err.to_string(), "account is required");
}

#[test]
fn test_check_without_settings_fails() {
    assert!(ConnectionSettings::default().check().is_err());
}
