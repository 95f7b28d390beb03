use classmap_core::schema::app::{self, *};
use classmap_core::schema::db::{self, SchemaDiff};
use classmap_core::schema::persist::Records;
use classmap_core::schema::{Builder, Schema};
use classmap_sql::MigrationStatement;
use pretty_assertions::assert_eq;

fn foo(extra: &[&str]) -> Class {
    let mut class = Class::new(ClassId(1), "Foo")
        .with_property(Property::primitive("Name", PrimitiveType::String));
    for name in extra {
        class = class.with_property(Property::primitive(*name, PrimitiveType::Integer));
    }
    class
}

fn ddl(previous: &db::Schema, next: &db::Schema) -> Vec<String> {
    let diff = SchemaDiff::from(previous, next);
    MigrationStatement::from_diff(&diff)
        .iter()
        .map(MigrationStatement::to_sql)
        .collect()
}

fn persisted(app: app::Schema) -> Schema {
    let schema = Builder::new().build(app.clone()).unwrap();
    Records::from_schema(&schema, |_| true)
        .unwrap()
        .into_schema(app)
        .unwrap()
}

#[test]
fn create_own_table() {
    let schema = Builder::new()
        .build(app::Schema::from_classes([foo(&[])]))
        .unwrap();

    assert_eq!(
        ddl(&db::Schema::default(), &schema.db),
        ["CREATE TABLE [Foo] (\n    [ECInstanceId] INTEGER PRIMARY KEY NOT NULL,\n    [Name] TEXT\n);"]
    );
}

#[test]
fn hierarchy_table_stores_class_ids() {
    let app = app::Schema::from_classes([
        Class::new(ClassId(1), "Element")
            .with_property(Property::primitive("Code", PrimitiveType::String))
            .with_map_hint(MapHint::TablePerHierarchy(TphHint {
                joined_table_per_direct_subclass: false,
                share_columns: None,
            })),
        Class::new(ClassId(2), "Sub")
            .with_base(ClassId(1))
            .with_property(Property::primitive("Rank", PrimitiveType::Integer)),
    ]);
    let schema = Builder::new().build(app).unwrap();

    assert_eq!(
        ddl(&db::Schema::default(), &schema.db),
        [
            "CREATE TABLE [Element] (\n    [ECInstanceId] INTEGER PRIMARY KEY NOT NULL,\n    [ECClassId] INTEGER NOT NULL,\n    [Code] TEXT,\n    [Rank] INTEGER\n);",
            "CREATE INDEX [ix_Element_ecclassid] ON [Element] ([ECClassId]);",
        ]
    );
}

#[test]
fn new_property_adds_a_column() {
    let previous = persisted(app::Schema::from_classes([foo(&[])]));
    let next = Builder::new()
        .update(app::Schema::from_classes([foo(&["Age"])]), previous.clone())
        .unwrap();

    assert_eq!(
        ddl(&previous.db, &next.db),
        ["ALTER TABLE [Foo] ADD COLUMN [Age] INTEGER;"]
    );
}

#[test]
fn unchanged_schema_has_no_ddl() {
    let app = app::Schema::from_classes([foo(&["Age"])]);
    let previous = persisted(app.clone());
    let next = Builder::new().update(app, previous.clone()).unwrap();

    assert!(ddl(&previous.db, &next.db).is_empty());
}
