//! Tests for entity descriptors

use super::*;
use crate::SchemaError;

fn users() -> EntityDescriptor {
    EntityDescriptor::new("User")
        .with_field(FieldDescriptor::new("ID", LogicalType::Uint).primary_key())
        .with_field(FieldDescriptor::new("Name", LogicalType::String))
}

#[test]
fn test_validate_accepts_well_formed_entity() {
    let entity = users()
        .with_relationship(RelationshipDescriptor::new(["ID"], "Account", ["UserID"]).owned_by("Account"))
        .with_check(CheckConstraintDescriptor::on_field("Name", "NAME <> ''"));

    assert!(entity.validate().is_ok());
}

#[test]
fn test_validate_rejects_case_folded_duplicates() {
    let entity = users().with_field(FieldDescriptor::new("name", LogicalType::String));

    match entity.validate() {
        Err(SchemaError::DuplicateField { entity, column }) => {
            assert_eq!(entity, "User");
            assert_eq!(column, "name");
        }
        other => panic!("expected duplicate field, got {:?}", other),
    }
}

#[test]
fn test_validate_rejects_unbalanced_relationship() {
    let entity = users().with_relationship(RelationshipDescriptor::new(
        ["ID"],
        "Account",
        ["OwnerID", "Region"],
    ));

    assert!(matches!(
        entity.validate(),
        Err(SchemaError::InvalidRelationship { .. })
    ));
}

#[test]
fn test_validate_rejects_empty_relationship() {
    let entity = users().with_relationship(RelationshipDescriptor::new(
        Vec::<String>::new(),
        "Account",
        Vec::<String>::new(),
    ));

    assert!(matches!(
        entity.validate(),
        Err(SchemaError::InvalidRelationship { .. })
    ));
}

#[test]
fn test_validate_rejects_unknown_local_field() {
    let entity = users().with_relationship(RelationshipDescriptor::new(["CompanyID"], "Company", ["ID"]));

    assert!(matches!(
        entity.validate(),
        Err(SchemaError::UnknownField { field, .. }) if field == "CompanyID"
    ));
}

#[test]
fn test_validate_rejects_entity_without_fields() {
    assert!(matches!(
        EntityDescriptor::new("Empty").validate(),
        Err(SchemaError::InvalidEntity { .. })
    ));
}

#[test]
fn test_field_lookup_by_column_name() {
    let entity = EntityDescriptor::new("Order")
        .with_field(FieldDescriptor::new("Total", LogicalType::Float).with_column_name("ORDER_TOTAL"));

    assert!(entity.field("Total").is_some());
    assert!(entity.field("order_total").is_some());
    assert!(entity.field("Missing").is_none());
}

#[test]
fn test_has_default_ignores_sentinel() {
    let none = FieldDescriptor::new("Status", LogicalType::String).with_default_literal("(-)");
    let some = FieldDescriptor::new("Status", LogicalType::String).with_default_literal("active");

    assert!(!none.has_default());
    assert!(some.has_default());
    assert!(!FieldDescriptor::new("Status", LogicalType::String).has_default());
}

#[test]
fn test_logical_type_from_string() {
    assert_eq!(LogicalType::from("boolean".to_string()), LogicalType::Bool);
    assert_eq!(LogicalType::from("Uint".to_string()), LogicalType::Uint);
    assert_eq!(
        LogicalType::from("NUMBER(10,2)".to_string()),
        LogicalType::Other("NUMBER(10,2)".to_string())
    );
}

#[test]
fn test_entity_deserializes_from_toml() {
    let source = r#"
        name = "Agent"

        [[fields]]
        name = "ID"
        type = "uint"
        primary_key = true
        auto_increment = true
        nullable = false

        [[fields]]
        name = "Payload"
        type = "VARIANT"

        [[fields]]
        name = "CreatedAt"
        type = "time"
        default = { expression = "CURRENT_TIMESTAMP()" }

        [[relationships]]
        local_fields = ["ID"]
        referenced_entity = "Team"
        referenced_fields = ["AgentID"]
        owner = "Team"
        on_delete = "cascade"
    "#;

    let entity: EntityDescriptor = toml::from_str(source).unwrap();

    assert_eq!(entity.fields.len(), 3);
    assert!(entity.fields[0].auto_increment);
    assert_eq!(entity.fields[1].logical_type, LogicalType::Other("VARIANT".into()));
    assert!(entity.fields[1].nullable);
    assert_eq!(
        entity.fields[2].default,
        Some(DefaultValue::Expression("CURRENT_TIMESTAMP()".into()))
    );
    assert_eq!(entity.relationships[0].on_delete, Some(ForeignKeyAction::Cascade));
    assert_eq!(entity.relationships[0].owner_or("Agent"), "Team");
}
