use classmap::{
    app::{self, *},
    stmt::{ClassRef, Delete, Expr, Insert, Select, Update},
    Db, Value,
};
use pretty_assertions::assert_eq;

const PARENT: ClassId = ClassId(1);
const CHILD: ClassId = ClassId(2);
const REL: ClassId = ClassId(3);
const ADDRESS: ClassId = ClassId(4);

const ELEMENT: ClassId = ClassId(1);
const SUB: ClassId = ClassId(2);
const SUB_SUB: ClassId = ClassId(3);

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn tph(joined: bool) -> MapHint {
    MapHint::TablePerHierarchy(TphHint {
        joined_table_per_direct_subclass: joined,
        share_columns: None,
    })
}

fn family() -> app::Schema {
    app::Schema::from_classes([
        Class::new(PARENT, "Parent").with_property(Property::primitive("Name", PrimitiveType::String)),
        Class::new(CHILD, "Child")
            .with_property(Property::primitive("Name", PrimitiveType::String))
            .with_property(Property::primitive("Loc", PrimitiveType::Point2d))
            .with_property(Property::structure("Addr", ADDRESS))
            .with_property(Property::primitive_array("Tags", PrimitiveType::String))
            .with_property(Property::navigation("Parent", REL, Direction::Forward)),
        Class::new_relationship(REL, "ChildRefersToParent", Relationship::new(CHILD, PARENT)),
        Class::new_struct(ADDRESS, "Address")
            .with_property(Property::primitive("Street", PrimitiveType::String))
            .with_property(Property::primitive("Number", PrimitiveType::Integer)),
    ])
}

fn elements(joined: bool) -> app::Schema {
    app::Schema::from_classes([
        Class::new(ELEMENT, "Element")
            .with_property(Property::primitive("Code", PrimitiveType::String))
            .with_map_hint(tph(joined)),
        Class::new(SUB, "Sub")
            .with_base(ELEMENT)
            .with_property(Property::primitive("Name", PrimitiveType::String)),
        Class::new(SUB_SUB, "SubSub").with_base(SUB),
    ])
}

fn connect(app: app::Schema) -> Db {
    init_logging();
    Db::builder().connect("sqlite::memory:", app).unwrap()
}

fn insert_parent(db: &mut Db, name: &str) -> i64 {
    db.execute(Insert::new("Parent").value("Name", name))
        .unwrap()
        .instance_id
        .unwrap()
}

#[test]
fn insert_then_select_every_kind_of_property() {
    let mut db = connect(family());
    let parent = insert_parent(&mut db, "mother");

    let mut stmt = db
        .prepare(
            Insert::new("Child")
                .value("Name", Expr::param())
                .value("Loc", Expr::param())
                .value("Addr", Expr::param())
                .value("Tags", Expr::param())
                .value("Parent", Expr::param()),
        )
        .unwrap();

    stmt.bind_text(1, "kid")
        .unwrap()
        .bind_point2d(2, 1.5, -2.0)
        .unwrap()
        .bind_struct(
            3,
            [
                ("Street".to_string(), Value::from("Main")),
                ("Number".to_string(), Value::I64(12)),
            ]
            .into_iter()
            .collect(),
        )
        .unwrap()
        .bind_array(4, vec![Value::from("a"), Value::from("b")])
        .unwrap()
        .bind_navigation(5, parent, Some(REL))
        .unwrap();

    let result = stmt.execute().unwrap();
    assert_eq!(result.rows_affected, 1);
    let child = result.instance_id.unwrap();

    let rows = db
        .prepare(Select::from_class("Child"))
        .unwrap()
        .query_all()
        .unwrap();
    assert_eq!(rows.len(), 1);

    let row = &rows[0];
    assert_eq!(row.get_named("ECInstanceId"), Some(&Value::I64(child)));
    assert_eq!(row.get_named("ECClassId"), Some(&Value::I64(2)));
    assert_eq!(row.get_named("Name"), Some(&Value::from("kid")));
    assert_eq!(
        row.get_named("Loc"),
        Some(&Value::Point2d { x: 1.5, y: -2.0 })
    );
    assert_eq!(
        row.get_named("Addr"),
        Some(&Value::structure([
            ("Street", Value::from("Main")),
            ("Number", Value::I64(12)),
        ]))
    );
    assert_eq!(
        row.get_named("Tags"),
        Some(&Value::Array(vec![Value::from("a"), Value::from("b")]))
    );
    assert_eq!(
        row.get_named("Parent"),
        Some(&Value::Navigation {
            id: parent,
            rel_class_id: Some(3),
        })
    );
}

#[test]
fn scalar_binders() {
    let app = app::Schema::from_classes([Class::new(ClassId(1), "Sample")
        .with_property(Property::primitive("Flag", PrimitiveType::Boolean))
        .with_property(Property::primitive("Score", PrimitiveType::Double))
        .with_property(Property::primitive("Data", PrimitiveType::Binary))
        .with_property(Property::primitive("Pos", PrimitiveType::Point3d))
        .with_property(Property::primitive("Note", PrimitiveType::String))]);
    let mut db = connect(app);

    let mut insert = db
        .prepare(
            Insert::new("Sample")
                .value("Flag", Expr::param())
                .value("Score", Expr::param())
                .value("Data", Expr::param())
                .value("Pos", Expr::param())
                .value("Note", Expr::param()),
        )
        .unwrap();
    insert
        .bind_bool(1, true)
        .unwrap()
        .bind_f64(2, 0.5)
        .unwrap()
        .bind_blob(3, vec![0xca, 0xfe])
        .unwrap()
        .bind_point3d(4, 1.0, 2.0, 3.0)
        .unwrap()
        .bind_null(5)
        .unwrap();
    insert.execute().unwrap();

    let rows = db
        .prepare(
            Select::from_class("Sample")
                .column(Expr::property("Flag"))
                .column(Expr::property("Score"))
                .column(Expr::property("Data"))
                .column(Expr::property("Pos"))
                .column(Expr::property("Note")),
        )
        .unwrap()
        .query_all()
        .unwrap();
    assert_eq!(
        rows[0].values(),
        [
            Value::I64(1),
            Value::F64(0.5),
            Value::Bytes(vec![0xca, 0xfe]),
            Value::Point3d {
                x: 1.0,
                y: 2.0,
                z: 3.0,
            },
            Value::Null,
        ]
    );
}

#[test]
fn step_reads_rows_one_at_a_time() {
    let mut db = connect(family());
    insert_parent(&mut db, "a");
    insert_parent(&mut db, "b");

    let mut stmt = db
        .prepare(
            Select::from_class("Parent")
                .column(Expr::property("Name"))
                .filter(Expr::ne(Expr::property("Name"), Expr::named_param("skip"))),
        )
        .unwrap();
    stmt.bind_named("skip", "a").unwrap();

    let row = stmt.step().unwrap().unwrap();
    assert_eq!(row.values(), [Value::from("b")]);
    assert_eq!(row.names(), [Some("Name".to_string())]);
    assert!(stmt.step().unwrap().is_none());

    // Bindings survive a reset
    stmt.reset();
    assert!(stmt.step().unwrap().is_some());

    stmt.clear_bindings();
    assert!(stmt.query_all().unwrap().is_empty());
}

#[test]
fn update_only_versus_polymorphic() {
    let mut db = connect(elements(false));
    db.execute(Insert::new("Sub").value("Name", "sub")).unwrap();
    db.execute(Insert::new("SubSub").value("Name", "subsub")).unwrap();
    db.execute(Insert::new("Element").value("Code", "base")).unwrap();

    let only = db
        .execute(Update::new(ClassRef::only("Sub")).set("Code", "only"))
        .unwrap();
    assert_eq!(only.rows_affected, 1);

    let polymorphic = db.execute(Update::new("Sub").set("Code", "poly")).unwrap();
    assert_eq!(polymorphic.rows_affected, 2);

    let rows = db
        .prepare(
            Select::from_class("Element")
                .column(Expr::property("ECClassId"))
                .column(Expr::property("Code")),
        )
        .unwrap()
        .query_all()
        .unwrap();
    let values: Vec<_> = rows.into_iter().map(|row| row.into_values()).collect();
    assert_eq!(
        values,
        [
            vec![Value::I64(2), Value::from("poly")],
            vec![Value::I64(3), Value::from("poly")],
            vec![Value::I64(1), Value::from("base")],
        ]
    );
}

#[test]
fn joined_table_rows_follow_their_base_row() {
    let mut db = connect(elements(true));
    let id = db
        .execute(Insert::new("Sub").value("Code", "c").value("Name", "n"))
        .unwrap()
        .instance_id
        .unwrap();

    let rows = db
        .prepare(
            Select::from_class("Sub")
                .column(Expr::property("ECInstanceId"))
                .column(Expr::property("Code"))
                .column(Expr::property("Name")),
        )
        .unwrap()
        .query_all()
        .unwrap();
    assert_eq!(
        rows[0].values(),
        [Value::I64(id), Value::from("c"), Value::from("n")]
    );

    let updated = db
        .execute(
            Update::new("Sub")
                .set("Name", "renamed")
                .filter(Expr::eq(Expr::property("Code"), "c")),
        )
        .unwrap();
    assert_eq!(updated.rows_affected, 1);

    let deleted = db.execute(Delete::new("Element")).unwrap();
    assert_eq!(deleted.rows_affected, 1);

    let remaining = db
        .connection()
        .query("SELECT COUNT(*) FROM [Sub]", &[])
        .unwrap();
    assert_eq!(remaining, [vec![Value::I64(0)]]);
}

fn last_mod(db: &mut Db) -> Value {
    let rows = db
        .prepare(Select::from_class("Doc").column(Expr::property("LastMod")))
        .unwrap()
        .query_all()
        .unwrap();
    rows[0].values()[0].clone()
}

#[test]
fn current_timestamp_is_refreshed_on_update() {
    let app = app::Schema::from_classes([Class::new(ClassId(1), "Doc")
        .with_property(Property::primitive("Title", PrimitiveType::String))
        .with_property(Property::primitive("LastMod", PrimitiveType::DateTime))
        .with_current_timestamp_property("LastMod")]);
    let mut db = connect(app);

    let mut insert = db
        .prepare(
            Insert::new("Doc")
                .value("Title", "draft")
                .value("LastMod", Expr::param()),
        )
        .unwrap();
    insert.bind_datetime(1, 2451545.0).unwrap();
    insert.execute().unwrap();

    // Whole julian days come back as doubles
    assert_eq!(last_mod(&mut db), Value::F64(2451545.0));

    db.execute(Update::new("Doc").set("Title", "final")).unwrap();
    let bumped = last_mod(&mut db).as_f64().unwrap();
    assert!(bumped > 2451545.0, "{bumped}");

    // An explicit write is kept
    let mut update = db
        .prepare(
            Update::new("Doc")
                .set("Title", "dated")
                .set("LastMod", Expr::param()),
        )
        .unwrap();
    update.bind_datetime(1, 2451000.5).unwrap();
    assert_eq!(update.execute().unwrap().rows_affected, 1);

    assert_eq!(last_mod(&mut db), Value::F64(2451000.5));
}

#[test]
fn update_of_joined_table_changes_every_table_of_the_matched_rows() {
    let mut db = connect(elements(true));
    db.execute(Insert::new("Sub").value("Code", "old").value("Name", "n"))
        .unwrap();
    db.execute(Insert::new("Sub").value("Code", "other").value("Name", "o"))
        .unwrap();

    let read = |db: &mut Db| -> Vec<Vec<Value>> {
        db.prepare(
            Select::from_class("Sub")
                .column(Expr::property("Code"))
                .column(Expr::property("Name")),
        )
        .unwrap()
        .query_all()
        .unwrap()
        .into_iter()
        .map(|row| row.into_values())
        .collect()
    };

    // The filter reads a column the statement assigns
    let updated = db
        .execute(
            Update::new("Sub")
                .set("Code", "new")
                .set("Name", "renamed")
                .filter(Expr::eq(Expr::property("Code"), "old")),
        )
        .unwrap();
    assert_eq!(updated.rows_affected, 1);
    assert_eq!(
        read(&mut db),
        [
            vec![Value::from("new"), Value::from("renamed")],
            vec![Value::from("other"), Value::from("o")],
        ]
    );

    // Both sides of the filter change
    let updated = db
        .execute(
            Update::new("Sub")
                .set("Code", "newer")
                .set("Name", "again")
                .filter(Expr::and(
                    Expr::eq(Expr::property("Code"), "new"),
                    Expr::eq(Expr::property("Name"), "renamed"),
                )),
        )
        .unwrap();
    assert_eq!(updated.rows_affected, 1);

    let missed = db
        .execute(
            Update::new("Sub")
                .set("Code", "x")
                .set("Name", "x")
                .filter(Expr::eq(Expr::property("Code"), "missing")),
        )
        .unwrap();
    assert_eq!(missed.rows_affected, 0);

    assert_eq!(
        read(&mut db),
        [
            vec![Value::from("newer"), Value::from("again")],
            vec![Value::from("other"), Value::from("o")],
        ]
    );
}

#[test]
fn delete_relationship_clears_the_navigation() {
    let mut db = connect(family());
    let parent = insert_parent(&mut db, "p");

    let mut insert = db
        .prepare(
            Insert::new("Child")
                .value("Name", "c")
                .value("Parent", Expr::param()),
        )
        .unwrap();
    insert.bind_navigation(1, parent, Some(REL)).unwrap();
    insert.execute().unwrap();

    let links = db
        .prepare(
            Select::from_class("ChildRefersToParent")
                .column(Expr::property("TargetECInstanceId"))
                .column(Expr::property("TargetECClassId")),
        )
        .unwrap()
        .query_all()
        .unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].values(), [Value::I64(parent), Value::I64(1)]);

    let deleted = db.execute(Delete::new("ChildRefersToParent")).unwrap();
    assert_eq!(deleted.rows_affected, 1);

    let rows = db
        .prepare(Select::from_class("Child").column(Expr::property("Parent")))
        .unwrap()
        .query_all()
        .unwrap();
    assert_eq!(rows[0].values(), [Value::Null]);
}

#[test]
fn binding_errors() {
    let mut db = connect(family());

    let mut stmt = db
        .prepare(Insert::new("Child").value("Loc", Expr::param()))
        .unwrap();
    assert_eq!(stmt.param_count(), 1);

    assert!(stmt.bind_i64(2, 1).unwrap_err().is_invalid_binding());
    assert!(stmt.bind_i64(0, 1).unwrap_err().is_invalid_binding());
    assert!(stmt.param_index("missing").unwrap_err().is_invalid_binding());
    assert!(stmt.step().unwrap_err().is_invalid_binding());

    // A string cannot be split into coordinates
    stmt.bind_text(1, "nowhere").unwrap();
    assert!(stmt.execute().unwrap_err().is_invalid_binding());

    // Struct members must all be known
    let mut insert = db
        .prepare(Insert::new("Child").value("Addr", Expr::param()))
        .unwrap();
    insert
        .bind_struct(1, [("Stret".to_string(), Value::from("Main"))].into_iter().collect())
        .unwrap();
    assert!(insert.execute().unwrap_err().is_invalid_binding());

    insert
        .bind_struct(1, [("street".to_string(), Value::from("Main"))].into_iter().collect())
        .unwrap();
    assert_eq!(insert.execute().unwrap().rows_affected, 1);

    let mut select = db
        .prepare(Select::from_class("Child").column(Expr::property("Addr")))
        .unwrap();
    assert!(select.execute().unwrap_err().is_invalid_binding());
    assert_eq!(
        select.query_all().unwrap()[0].values(),
        [Value::structure([("Street", Value::from("Main")), ("Number", Value::Null)])]
    );
}

#[test]
fn invalid_statements_are_rejected_before_execution() {
    let mut db = connect(family());

    let err = db
        .prepare(Insert::new("Missing").value("Name", "x"))
        .unwrap_err();
    assert!(err.is_invalid_ecsql());

    let err = db
        .prepare(Update::new("Parent").set("ECInstanceId", 1i64))
        .unwrap_err();
    assert!(err.is_invalid_ecsql());
}

#[test]
fn update_schema_adds_columns_and_keeps_data() {
    let mut db = connect(family());
    insert_parent(&mut db, "p");

    let mut next = family();
    next.classes.insert(
        PARENT,
        Class::new(PARENT, "Parent")
            .with_property(Property::primitive("Name", PrimitiveType::String))
            .with_property(Property::primitive("Age", PrimitiveType::Integer)),
    );
    db.update_schema(next).unwrap();

    db.execute(Update::new("Parent").set("Age", 40i64)).unwrap();

    let rows = db
        .prepare(
            Select::from_class("Parent")
                .column(Expr::property("Name"))
                .column(Expr::property("Age")),
        )
        .unwrap()
        .query_all()
        .unwrap();
    assert_eq!(rows[0].values(), [Value::from("p"), Value::I64(40)]);
}

#[test]
fn reopen_loads_the_persisted_mapping() {
    init_logging();

    let path = std::env::temp_dir().join(format!("classmap-reopen-{}.db", std::process::id()));
    let _ = std::fs::remove_file(&path);
    let url = format!("sqlite:{}", path.display());

    {
        let mut db = Db::builder().connect(&url, elements(false)).unwrap();
        db.execute(Insert::new("SubSub").value("Name", "kept")).unwrap();
    }

    let mut db = Db::builder().connect(&url, elements(false)).unwrap();
    let sub_sub = db.schema().mapping.class_map(SUB_SUB).clone();

    let rows = db
        .prepare(Select::from_class("Sub").column(Expr::property("Name")))
        .unwrap()
        .query_all()
        .unwrap();
    assert_eq!(rows[0].values(), [Value::from("kept")]);

    drop(db);
    let db = Db::builder().connect(&url, elements(false)).unwrap();
    assert_eq!(db.schema().mapping.class_map(SUB_SUB), &sub_sub);

    drop(db);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn unsupported_connection_urls() {
    let err = Db::builder()
        .connect("mysql://localhost/db", family())
        .unwrap_err();
    assert!(err.is_invalid_connection_url());

    let err = Db::builder().connect("not a url", family()).unwrap_err();
    assert!(err.is_invalid_connection_url());
}
