use classmap_core::schema::app::{self, *};
use classmap_core::schema::Builder;
use classmap_core::stmt::{
    ClassRef, Cte, Delete, Expr, FromItem, Insert, Options, Select, Statement, Update, Value,
};
use classmap_core::{Error, Schema};
use classmap_sql::prepare::StatementKind;
use classmap_sql::{prepare, Accessor, ParamSlot, PreparedStatement};
use pretty_assertions::assert_eq;

const FOO: ClassId = ClassId(1);

const ELEMENT: ClassId = ClassId(1);
const SUB: ClassId = ClassId(2);
const SUB_SUB: ClassId = ClassId(3);

const PARENT: ClassId = ClassId(1);
const CHILD: ClassId = ClassId(2);
const REL: ClassId = ClassId(3);

fn tph(joined: bool) -> MapHint {
    MapHint::TablePerHierarchy(TphHint {
        joined_table_per_direct_subclass: joined,
        share_columns: None,
    })
}

fn own_table() -> Schema {
    let app = app::Schema::from_classes([Class::new(FOO, "Foo")
        .with_property(Property::primitive("Name", PrimitiveType::String))
        .with_property(Property::primitive("Code", PrimitiveType::Integer).readonly())
        .with_property(Property::primitive("Loc", PrimitiveType::Point2d))]);
    Builder::new().build(app).unwrap()
}

fn hierarchy() -> Schema {
    let app = app::Schema::from_classes([
        Class::new(ELEMENT, "Element")
            .with_property(Property::primitive("Code", PrimitiveType::String))
            .with_map_hint(tph(false)),
        Class::new(SUB, "Sub")
            .with_base(ELEMENT)
            .with_property(Property::primitive("Name", PrimitiveType::String)),
        Class::new(SUB_SUB, "SubSub").with_base(SUB),
    ]);
    Builder::new().build(app).unwrap()
}

fn joined() -> Schema {
    let app = app::Schema::from_classes([
        Class::new(ELEMENT, "Element")
            .with_property(Property::primitive("Code", PrimitiveType::String))
            .with_map_hint(tph(true)),
        Class::new(SUB, "Sub")
            .with_base(ELEMENT)
            .with_property(Property::primitive("Extra", PrimitiveType::String)),
    ]);
    Builder::new().build(app).unwrap()
}

fn parent_child(parent_hint: MapHint) -> Schema {
    let app = app::Schema::from_classes([
        Class::new(PARENT, "Parent")
            .with_property(Property::primitive("Name", PrimitiveType::String))
            .with_map_hint(parent_hint),
        Class::new(CHILD, "Child")
            .with_property(Property::primitive("Name", PrimitiveType::String))
            .with_property(Property::navigation("Parent", REL, Direction::Forward)),
        Class::new_relationship(REL, "ChildRefersToParent", Relationship::new(CHILD, PARENT)),
    ]);
    Builder::new().build(app).unwrap()
}

fn prepare_ok(schema: &Schema, statement: impl Into<Statement>) -> PreparedStatement {
    prepare(schema, &statement.into()).unwrap()
}

fn prepare_err(schema: &Schema, statement: impl Into<Statement>) -> Error {
    prepare(schema, &statement.into()).unwrap_err()
}

fn sql(prepared: &PreparedStatement) -> Vec<&str> {
    prepared
        .statements
        .iter()
        .map(|statement| statement.sql.as_str())
        .collect()
}

fn slot(param: usize, path: Vec<Accessor>) -> ParamSlot {
    ParamSlot::new(param, path)
}

#[test]
fn insert_into_own_table() {
    let schema = own_table();
    let prepared = prepare_ok(
        &schema,
        Insert::new("Foo").value("Name", Expr::param()).value("Loc", Expr::param()),
    );

    assert_eq!(prepared.kind, StatementKind::Insert);
    assert_eq!(
        sql(&prepared),
        ["INSERT INTO [Foo] ([Name], [Loc_X], [Loc_Y]) VALUES (?1, ?2, ?3);"]
    );
    assert_eq!(
        prepared.statements[0].params,
        [
            slot(1, vec![]),
            slot(2, vec![Accessor::X]),
            slot(2, vec![Accessor::Y]),
        ]
    );
    assert_eq!(prepared.params.len(), 2);
}

#[test]
fn insert_literal_point_is_decomposed() {
    let schema = own_table();
    let prepared = prepare_ok(
        &schema,
        Insert::new("Foo").value(
            "Loc",
            Expr::Value(Value::Point2d { x: 1.5, y: -2.0 }),
        ),
    );

    assert_eq!(
        sql(&prepared),
        ["INSERT INTO [Foo] ([Loc_X], [Loc_Y]) VALUES (1.5, -2.0);"]
    );
}

#[test]
fn insert_into_hierarchy_sets_class_id() {
    let schema = hierarchy();
    let prepared = prepare_ok(
        &schema,
        Insert::new("Sub").value("Code", "a").value("Name", Expr::param()),
    );

    assert_eq!(
        sql(&prepared),
        ["INSERT INTO [Element] ([Code], [Name], [ECClassId]) VALUES ('a', ?1, 2);"]
    );
}

#[test]
fn insert_into_joined_table_reuses_the_id() {
    let schema = joined();
    let prepared = prepare_ok(
        &schema,
        Insert::new("Sub").value("Code", Expr::param()).value("Extra", Expr::param()),
    );

    assert_eq!(
        sql(&prepared),
        [
            "INSERT INTO [Element] ([Code], [ECClassId]) VALUES (?1, 2);",
            "INSERT INTO [Sub] ([ECInstanceId], [Extra], [ECClassId]) VALUES (last_insert_rowid(), ?1, 2);",
        ]
    );
    assert_eq!(prepared.statements[1].params, [slot(2, vec![])]);
}

#[test]
fn insert_errors() {
    let schema = own_table();

    let err = prepare_err(&schema, Insert::new("Foo").value("ECClassId", 1i64));
    assert!(err.is_invalid_ecsql());

    let err = prepare_err(&schema, Insert::new("Foo").value("Missing", 1i64));
    assert!(err.is_invalid_ecsql());

    let err = prepare_err(&schema, Insert::new("Nope").value("Name", "x"));
    assert!(err.is_invalid_ecsql());

    let mut mismatched = Insert::new("Foo").value("Name", "x");
    mismatched.values.push(Expr::param());
    assert!(prepare_err(&schema, mismatched).is_invalid_ecsql());

    // A literal must decompose like the property does
    let err = prepare_err(&schema, Insert::new("Foo").value("Loc", "not a point"));
    assert!(err.is_invalid_ecsql());
}

#[test]
fn insert_into_abstract_class() {
    let app = app::Schema::from_classes([Class::new(FOO, "Foo")
        .with_modifier(ClassModifier::Abstract)
        .with_property(Property::primitive("Name", PrimitiveType::String))]);
    let schema = Builder::new().build(app).unwrap();

    let err = prepare_err(&schema, Insert::new("Foo").value("Name", "x"));
    assert!(err.is_invalid_ecsql());
}

#[test]
fn insert_skips_virtual_navigation_class_id() {
    let app = app::Schema::from_classes([
        Class::new(PARENT, "Parent"),
        Class::new(CHILD, "Child")
            .with_property(Property::primitive("Name", PrimitiveType::String))
            .with_property(Property::navigation("Parent", REL, Direction::Forward)),
        Class::new_relationship(REL, "ChildRefersToParent", Relationship::new(CHILD, PARENT))
            .with_modifier(ClassModifier::Sealed),
    ]);
    let schema = Builder::new().build(app).unwrap();

    let prepared = prepare_ok(
        &schema,
        Insert::new("Child")
            .value("Name", Expr::param())
            .value("Parent", Expr::param()),
    );

    assert_eq!(
        sql(&prepared),
        ["INSERT INTO [Child] ([Name], [ParentId]) VALUES (?1, ?2);"]
    );
    assert_eq!(
        prepared.statements[0].params,
        [slot(1, vec![]), slot(2, vec![Accessor::NavigationId])]
    );

    let classmap_sql::Statement::Insert(insert) = &prepared.statements[0].statement else {
        panic!("expected an INSERT");
    };
    assert_eq!(insert.columns.len(), insert.values.len());
    assert!(!insert.columns.iter().any(|column| column == "ParentRelECClassId"));
}

#[test]
fn insert_into_foreign_key_relationship() {
    let schema = parent_child(MapHint::default());

    let err = prepare_err(
        &schema,
        Insert::new("ChildRefersToParent")
            .value("SourceECInstanceId", 1i64)
            .value("TargetECInstanceId", 2i64),
    );
    assert!(err.is_invalid_ecsql());
}

#[test]
fn update_filters_on_class() {
    let schema = hierarchy();
    let prepared = prepare_ok(&schema, Update::new("Sub").set("Name", Expr::param()));
    assert_eq!(
        sql(&prepared),
        ["UPDATE [Element] SET [Name] = ?1 WHERE [ECClassId] IN (2, 3);"]
    );

    let prepared = prepare_ok(
        &schema,
        Update::new(ClassRef::only("Sub")).set("Name", Expr::param()),
    );
    assert_eq!(
        sql(&prepared),
        ["UPDATE [Element] SET [Name] = ?1 WHERE [ECClassId] = 2;"]
    );
}

#[test]
fn update_of_whole_hierarchy_needs_no_class_filter() {
    let schema = hierarchy();
    let prepared = prepare_ok(
        &schema,
        Update::new("Element")
            .set("Code", Expr::param())
            .filter(Expr::eq(Expr::property("Code"), Expr::param())),
    );

    assert_eq!(
        sql(&prepared),
        ["UPDATE [Element] SET [Code] = ?1 WHERE [Code] = ?2;"]
    );
}

#[test]
fn update_without_class_filter() {
    let schema = hierarchy();
    let prepared = prepare_ok(
        &schema,
        Update::new("Sub")
            .set("Name", Expr::param())
            .options(Options {
                no_class_id_filter: true,
                ..Options::default()
            }),
    );

    assert_eq!(sql(&prepared), ["UPDATE [Element] SET [Name] = ?1;"]);
}

#[test]
fn update_spanning_joined_table() {
    let schema = joined();
    let prepared = prepare_ok(
        &schema,
        Update::new("Sub")
            .set("Code", Expr::param())
            .set("Extra", Expr::param())
            .filter(Expr::eq(Expr::property("Extra"), Expr::param())),
    );

    let view = "SELECT [Element].[ECInstanceId] FROM [Element] \
                LEFT JOIN [Sub] ON [Sub].[ECInstanceId] = [Element].[ECInstanceId] \
                WHERE [Sub].[Extra] = ?1 AND [Element].[ECClassId] IN (2)";
    let targets = "SELECT [ECInstanceId] FROM [classmap_targets]";

    assert_eq!(
        sql(&prepared),
        [
            "CREATE TEMP TABLE IF NOT EXISTS [classmap_targets] (\n    \
             [ECInstanceId] INTEGER PRIMARY KEY NOT NULL\n);"
                .to_string(),
            format!("INSERT INTO [classmap_targets] ([ECInstanceId]) {view};"),
            format!("UPDATE [Element] SET [Code] = ?1 WHERE [ECInstanceId] IN ({targets});"),
            format!("UPDATE [Sub] SET [Extra] = ?1 WHERE [ECInstanceId] IN ({targets});"),
            "DELETE FROM [classmap_targets];".to_string(),
        ]
    );
    assert_eq!(prepared.statements[1].params, [slot(3, vec![])]);
    assert_eq!(prepared.statements[2].params, [slot(1, vec![])]);
    assert_eq!(prepared.statements[3].params, [slot(2, vec![])]);
    assert!(prepared.statements[0].params.is_empty());
}

#[test]
fn update_of_one_table_filters_directly() {
    let schema = joined();
    let prepared = prepare_ok(
        &schema,
        Update::new("Sub")
            .set("Extra", Expr::param())
            .filter(Expr::eq(Expr::property("Code"), "c")),
    );

    assert_eq!(
        sql(&prepared),
        ["UPDATE [Sub] SET [Extra] = ?1 WHERE [ECInstanceId] IN (\
          SELECT [Element].[ECInstanceId] FROM [Element] \
          LEFT JOIN [Sub] ON [Sub].[ECInstanceId] = [Element].[ECInstanceId] \
          WHERE [Element].[Code] = 'c' AND [Element].[ECClassId] IN (2));"]
    );
}

#[test]
fn update_errors() {
    let schema = own_table();

    let err = prepare_err(&schema, Update::new("Foo").set("ECInstanceId", 1i64));
    assert!(err.is_invalid_ecsql());

    let err = prepare_err(&schema, Update::new("Foo").set("Code", 1i64));
    assert!(err.is_invalid_ecsql());

    let prepared = prepare_ok(
        &schema,
        Update::new("Foo").set("Code", 1i64).options(Options {
            readonly_properties_are_updatable: true,
            ..Options::default()
        }),
    );
    assert_eq!(sql(&prepared), ["UPDATE [Foo] SET [Code] = 1;"]);

    // `<` has no meaning for a point
    let err = prepare_err(
        &schema,
        Update::new("Foo")
            .set("Name", "x")
            .filter(Expr::lt(Expr::property("Loc"), Expr::param())),
    );
    assert!(err.is_invalid_ecsql());
}

#[test]
fn update_navigation_property() {
    let schema = parent_child(MapHint::default());
    let prepared = prepare_ok(
        &schema,
        Update::new("Child")
            .set("Parent", Expr::param())
            .filter(Expr::eq(Expr::property("Parent"), Expr::param())),
    );

    assert_eq!(
        sql(&prepared),
        ["UPDATE [Child] SET [ParentId] = ?1, [ParentRelECClassId] = ?2 WHERE [ParentId] = ?3;"]
    );
    assert_eq!(
        prepared.statements[0].params,
        [
            slot(1, vec![Accessor::NavigationId]),
            slot(1, vec![Accessor::NavigationRelClassId]),
            slot(2, vec![Accessor::NavigationId]),
        ]
    );
}

#[test]
fn named_parameters_are_bound_once() {
    let schema = own_table();
    let prepared = prepare_ok(
        &schema,
        Update::new("Foo")
            .set("Name", Expr::named_param("name"))
            .filter(Expr::ne(Expr::property("Name"), Expr::named_param("NAME"))),
    );

    assert_eq!(
        sql(&prepared),
        ["UPDATE [Foo] SET [Name] = ?1 WHERE [Name] <> ?2;"]
    );
    assert_eq!(prepared.params.len(), 1);
    assert_eq!(prepared.param_index("Name"), Some(1));
    assert_eq!(prepared.statements[0].params, [slot(1, vec![]), slot(1, vec![])]);
}

#[test]
fn delete_from_hierarchy() {
    let schema = hierarchy();

    let prepared = prepare_ok(&schema, Delete::new("Sub"));
    assert_eq!(
        sql(&prepared),
        ["DELETE FROM [Element] WHERE [ECClassId] IN (2, 3);"]
    );

    let prepared = prepare_ok(
        &schema,
        Delete::new("Element").filter(Expr::is_null(Expr::property("Code"))),
    );
    assert_eq!(sql(&prepared), ["DELETE FROM [Element] WHERE [Code] IS NULL;"]);
}

#[test]
fn delete_relationship_clears_navigation() {
    let schema = parent_child(MapHint::default());

    let prepared = prepare_ok(
        &schema,
        Delete::new("ChildRefersToParent")
            .filter(Expr::eq(Expr::property("TargetECInstanceId"), Expr::param())),
    );
    assert_eq!(prepared.kind, StatementKind::Delete);
    assert_eq!(
        sql(&prepared),
        ["UPDATE [Child] SET [ParentId] = NULL, [ParentRelECClassId] = NULL \
          WHERE [ParentId] IS NOT NULL AND [ParentId] = ?1;"]
    );

    let prepared = prepare_ok(
        &schema,
        Delete::new(ClassRef::only("ChildRefersToParent")),
    );
    assert_eq!(
        sql(&prepared),
        ["UPDATE [Child] SET [ParentId] = NULL, [ParentRelECClassId] = NULL \
          WHERE [ParentId] IS NOT NULL AND [ParentRelECClassId] = 3;"]
    );
}

#[test]
fn delete_from_existing_table() {
    let app = app::Schema::from_classes([Class::new(FOO, "Foo").with_map_hint(
        MapHint::ExistingTable {
            table: "legacy".to_string(),
        },
    )]);
    let schema = Builder::new().build(app).unwrap();

    assert!(prepare_err(&schema, Delete::new("Foo")).is_invalid_ecsql());
}

#[test]
fn select_properties() {
    let schema = own_table();
    let prepared = prepare_ok(
        &schema,
        Select::from_class("Foo")
            .column(Expr::property("ECClassId"))
            .column(Expr::property("Loc"))
            .column_as(Expr::property("Name"), "n")
            .filter(Expr::eq(Expr::property("Loc"), Expr::param())),
    );

    assert_eq!(prepared.kind, StatementKind::Select);
    assert_eq!(
        sql(&prepared),
        ["SELECT 1 AS [ECClassId], [Foo].[Loc_X] AS [Loc.X], [Foo].[Loc_Y] AS [Loc.Y], \
          [Foo].[Name] AS [n] FROM [Foo] WHERE [Foo].[Loc_X] = ?1 AND [Foo].[Loc_Y] = ?2;"]
    );

    let names: Vec<_> = prepared.columns.iter().map(|c| c.name.as_deref()).collect();
    assert_eq!(names, [Some("ECClassId"), Some("Loc"), Some("n")]);
    assert_eq!(
        prepared.columns[1].leaves,
        [vec![Accessor::X], vec![Accessor::Y]]
    );
    assert_eq!(prepared.native_width(), 4);
}

#[test]
fn array_literal_outside_an_array_property_is_rejected() {
    let schema = own_table();
    let err = prepare_err(
        &schema,
        Select::from_class("Foo").filter(Expr::eq(
            Expr::property("Name"),
            Expr::Value(Value::Array(vec![Value::from("a")])),
        )),
    );
    assert!(err.is_invalid_ecsql());
}

#[test]
fn select_coordinate_of_point() {
    let schema = own_table();
    let prepared = prepare_ok(&schema, Select::from_class("Foo").column(Expr::property("Loc.Y")));

    assert_eq!(sql(&prepared), ["SELECT [Foo].[Loc_Y] AS [Loc.Y] FROM [Foo];"]);
    assert_eq!(prepared.columns[0].leaves, [Vec::<Accessor>::new()]);
}

#[test]
fn select_all_properties() {
    let schema = own_table();
    let prepared = prepare_ok(&schema, Select::from_class("Foo"));

    let names: Vec<_> = prepared.columns.iter().map(|c| c.name.as_deref()).collect();
    assert_eq!(
        names,
        [Some("ECInstanceId"), Some("ECClassId"), Some("Name"), Some("Code"), Some("Loc")]
    );
}

#[test]
fn select_from_hierarchy_with_alias() {
    let schema = hierarchy();

    let prepared = prepare_ok(
        &schema,
        Select::from_class(ClassRef::only("Sub").alias("s"))
            .column(Expr::qualified_property("s", "Name")),
    );
    assert_eq!(
        sql(&prepared),
        ["SELECT [s].[Name] AS [Name] FROM [Element] [s] WHERE [s].[ECClassId] = 2;"]
    );

    let prepared = prepare_ok(
        &schema,
        Select::from_class("Sub")
            .column(Expr::property("ECClassId"))
            .filter(Expr::in_list(
                Expr::property("Name"),
                vec![Expr::from("a"), Expr::param()],
            )),
    );
    assert_eq!(
        sql(&prepared),
        ["SELECT [Element].[ECClassId] AS [ECClassId] FROM [Element] \
          WHERE [Element].[Name] IN ('a', ?1) AND [Element].[ECClassId] IN (2, 3);"]
    );

    let err = prepare_err(
        &schema,
        Select::from_class(ClassRef::new("Sub").alias("s"))
            .column(Expr::qualified_property("x", "Name")),
    );
    assert!(err.is_invalid_ecsql());
}

#[test]
fn select_joined_table() {
    let schema = joined();
    let prepared = prepare_ok(&schema, Select::from_class("Sub").column(Expr::property("Extra")));

    assert_eq!(
        sql(&prepared),
        ["SELECT [Sub].[Extra] AS [Extra] FROM [Element] \
          LEFT JOIN [Sub] ON [Sub].[ECInstanceId] = [Element].[ECInstanceId] \
          WHERE [Element].[ECClassId] IN (2);"]
    );
}

#[test]
fn select_relationship_reads_constraint_class() {
    let schema = parent_child(tph(false));
    let prepared = prepare_ok(
        &schema,
        Select::from_class("ChildRefersToParent")
            .column(Expr::property("SourceECClassId"))
            .column(Expr::property("TargetECClassId")),
    );

    assert_eq!(
        sql(&prepared),
        ["SELECT 2 AS [SourceECClassId], \
          (SELECT [Parent].[ECClassId] FROM [Parent] WHERE [Parent].[ECInstanceId] = [Child].[ParentId] LIMIT 1) \
          AS [TargetECClassId] FROM [Child] WHERE [Child].[ParentId] IS NOT NULL;"]
    );
}

#[test]
fn select_relationship_of_own_table_target() {
    let schema = parent_child(MapHint::default());
    let prepared = prepare_ok(
        &schema,
        Select::from_class("ChildRefersToParent")
            .column(Expr::property("SourceECInstanceId"))
            .column(Expr::property("TargetECInstanceId"))
            .column(Expr::property("TargetECClassId")),
    );

    assert_eq!(
        sql(&prepared),
        ["SELECT [Child].[ECInstanceId] AS [SourceECInstanceId], \
          [Child].[ParentId] AS [TargetECInstanceId], 1 AS [TargetECClassId] \
          FROM [Child] WHERE [Child].[ParentId] IS NOT NULL;"]
    );
}

#[test]
fn select_from_subquery() {
    let schema = own_table();
    let inner = Select::from_class("Foo")
        .column(Expr::property("Name"))
        .column(Expr::property("Loc"));
    let prepared = prepare_ok(
        &schema,
        Select::new(FromItem::Subquery {
            query: Box::new(inner),
            alias: "f".to_string(),
        })
        .column(Expr::qualified_property("f", "Loc.X"))
        .filter(Expr::eq(Expr::property("Name"), "x")),
    );

    assert_eq!(
        sql(&prepared),
        ["SELECT [f].[Loc.X] AS [Loc.X] FROM \
          (SELECT [Foo].[Name] AS [Name], [Foo].[Loc_X] AS [Loc.X], [Foo].[Loc_Y] AS [Loc.Y] FROM [Foo]) [f] \
          WHERE [f].[Name] = 'x';"]
    );
    assert_eq!(prepared.columns[0].leaves, [Vec::<Accessor>::new()]);
}

#[test]
fn select_from_cte() {
    let schema = own_table();
    let prepared = prepare_ok(
        &schema,
        Select::new(FromItem::Cte {
            name: "names".to_string(),
            alias: None,
        })
        .with(Cte::new(
            "names",
            vec!["n".to_string()],
            Select::from_class("Foo").column(Expr::property("Name")),
        ))
        .column(Expr::property("n")),
    );

    assert_eq!(
        sql(&prepared),
        ["WITH [names]([n]) AS (SELECT [Foo].[Name] AS [Name] FROM [Foo]) \
          SELECT [names].[n] AS [n] FROM [names];"]
    );
}

#[test]
fn cte_errors() {
    let schema = own_table();

    let err = prepare_err(
        &schema,
        Select::new(FromItem::Cte {
            name: "names".to_string(),
            alias: None,
        })
        .with(Cte::new(
            "names",
            vec!["a".to_string(), "b".to_string()],
            Select::from_class("Foo").column(Expr::property("Name")),
        )),
    );
    assert!(err.is_invalid_ecsql());

    let err = prepare_err(
        &schema,
        Select::new(FromItem::Cte {
            name: "missing".to_string(),
            alias: None,
        }),
    );
    assert!(err.is_invalid_ecsql());
}
