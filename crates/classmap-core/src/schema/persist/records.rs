use crate::{
    schema::{
        app::{self, ClassId, PropertyKind},
        builder::struct_binding,
        db::{self, ColumnId, Table},
        mapping::{
            ArrayElement, ArrayPropertyMap, ClassMap, ClassMapState, MapStrategy,
            NavigationPropertyMap, PrimitivePropertyMap, PropertyMap, StructPropertyMap,
            SystemProperty, SystemPropertyMap,
        },
        Mapping, Schema,
    },
    Error, Result,
};
use indexmap::IndexMap;

/// The rows of the metadata tables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Records {
    pub tables: Vec<TableRecord>,
    pub class_maps: Vec<ClassMapRecord>,
    pub property_maps: Vec<PropertyMapRecord>,
}

/// A row of `ec_Table`
#[derive(Debug, Clone, PartialEq)]
pub struct TableRecord {
    pub id: usize,
    pub name: String,
    /// JSON encoded [`Table`]
    pub definition: String,
}

/// A row of `ec_ClassMap`
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMapRecord {
    pub class: ClassId,
    /// JSON encoded [`MapStrategy`]
    pub strategy: String,
}

/// A row of `ec_PropertyMap`
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyMapRecord {
    pub class: ClassId,
    pub ordinal: usize,
    pub access_string: String,
    pub table: String,
    pub column: String,
}

impl Records {
    /// Records for every table and for the class maps `include` accepts.
    pub fn from_schema(schema: &Schema, include: impl Fn(&ClassMap) -> bool) -> Result<Records> {
        let mut records = Records::default();

        for table in &schema.db.tables {
            records.tables.push(TableRecord {
                id: table.id.0,
                name: table.name.clone(),
                definition: serde_json::to_string(table)?,
            });
        }

        for class_map in schema.mapping.classes.values().filter(|m| include(m)) {
            records.class_maps.push(ClassMapRecord {
                class: class_map.class,
                strategy: serde_json::to_string(&class_map.strategy)?,
            });

            let leaves = class_map.property_maps.iter().flat_map(PropertyMap::leaves);
            for (ordinal, (access_string, column)) in leaves.enumerate() {
                let table = schema.db.table(column.table);
                records.property_maps.push(PropertyMapRecord {
                    class: class_map.class,
                    ordinal,
                    access_string,
                    table: table.name.clone(),
                    column: table.column(column).name.clone(),
                });
            }
        }

        Ok(records)
    }

    /// Rebuilds the mapping of `app` from persisted rows.
    ///
    /// Properties of the class graph without rows are listed in
    /// [`ClassMap::failed_to_load_properties`]; a schema update maps them.
    pub fn into_schema(self, app: app::Schema) -> Result<Schema> {
        let mut tables: Vec<Table> = self
            .tables
            .iter()
            .map(|record| serde_json::from_str(&record.definition).map_err(Error::from))
            .collect::<Result<_>>()?;
        tables.sort_by_key(|table| table.id);

        for (index, table) in tables.iter().enumerate() {
            if table.id.0 != index {
                return Err(Error::invalid_schema(format!(
                    "persisted table `{}` has id {} but {index} was expected",
                    table.name, table.id.0
                )));
            }
        }

        let db = db::Schema { tables };

        let mut rows: IndexMap<ClassId, Vec<&PropertyMapRecord>> = IndexMap::new();
        for record in &self.property_maps {
            rows.entry(record.class).or_default().push(record);
        }

        let mut mapping = Mapping::default();

        for record in &self.class_maps {
            let Some(class) = app.get(record.class) else {
                log::warn!("ignoring persisted class map of unknown class {}", record.class);
                continue;
            };

            let strategy: MapStrategy = serde_json::from_str(&record.strategy)?;
            let columns = ColumnRows::resolve(&db, rows.get(&record.class).map(Vec::as_slice))?;

            let class_map = load_class_map(&app, &db, class, strategy, &columns)?;
            mapping.classes.insert(class.id, class_map);
        }

        Ok(Schema { app, db, mapping })
    }
}

/// Persisted columns of one class, by lower-cased access string
struct ColumnRows {
    rows: IndexMap<String, Vec<ColumnId>>,
}

impl ColumnRows {
    fn resolve(db: &db::Schema, records: Option<&[&PropertyMapRecord]>) -> Result<ColumnRows> {
        let mut records = records.unwrap_or_default().to_vec();
        records.sort_by_key(|record| record.ordinal);

        let mut rows: IndexMap<String, Vec<ColumnId>> = IndexMap::new();
        for record in records {
            let column = db
                .table_by_name(&record.table)
                .and_then(|table| table.find_column(&record.column))
                .ok_or_else(|| {
                    Error::invalid_schema(format!(
                        "persisted property `{}` references unknown column `{}.{}`",
                        record.access_string, record.table, record.column
                    ))
                })?;

            rows.entry(record.access_string.to_ascii_lowercase())
                .or_default()
                .push(column.id);
        }

        Ok(ColumnRows { rows })
    }

    fn get(&self, access_string: &str) -> Option<&[ColumnId]> {
        self.rows
            .get(&access_string.to_ascii_lowercase())
            .map(Vec::as_slice)
    }

    fn single(&self, access_string: &str) -> Option<ColumnId> {
        match self.get(access_string)? {
            [column] => Some(*column),
            _ => None,
        }
    }
}

fn load_class_map(
    app: &app::Schema,
    db: &db::Schema,
    class: &app::Class,
    strategy: MapStrategy,
    columns: &ColumnRows,
) -> Result<ClassMap> {
    let mut class_map = ClassMap::new(class.id, strategy);
    class_map.state = ClassMapState::Persisted;

    if class_map.strategy.is_not_mapped() {
        return Ok(class_map);
    }

    let system: &[SystemProperty] = if class_map.strategy.is_end_table_relationship()
        || class.relationship().is_some()
    {
        &SystemProperty::ALL
    } else {
        &SystemProperty::ALL[..2]
    };

    for property in system {
        let columns = columns.get(property.as_str()).unwrap_or_default().to_vec();
        class_map.property_maps.insert(SystemPropertyMap {
            property: *property,
            columns,
        })?;
    }

    if let Some(instance_id) = class_map.system(SystemProperty::ECInstanceId) {
        let tables: Vec<_> = instance_id.columns.iter().map(|column| column.table).collect();
        for table in tables {
            class_map.add_table(db, table);
        }
    }

    if class_map.strategy.is_end_table_relationship() {
        return Ok(class_map);
    }

    for property in app.properties(class.id)? {
        match load_property(app, property, &property.name, columns)? {
            Some(map) => class_map.property_maps.insert(map)?,
            None => class_map.failed_to_load_properties.push(property.name.clone()),
        }
    }

    if !class_map.failed_to_load_properties.is_empty() {
        log::debug!(
            "class `{}` has unmapped properties: {:?}",
            class.name,
            class_map.failed_to_load_properties
        );
    }

    Ok(class_map)
}

fn load_property(
    app: &app::Schema,
    property: &app::Property,
    access_string: &str,
    columns: &ColumnRows,
) -> Result<Option<PropertyMap>> {
    Ok(match &property.kind {
        PropertyKind::Primitive(ty) if ty.is_point() => {
            let coordinates = ["X", "Y", "Z"][..ty.width()]
                .iter()
                .map(|coordinate| columns.single(&format!("{access_string}.{coordinate}")))
                .collect::<Option<Vec<_>>>();

            coordinates.map(|columns| {
                PrimitivePropertyMap {
                    access_string: access_string.to_string(),
                    ty: *ty,
                    columns,
                }
                .into()
            })
        }
        PropertyKind::Primitive(ty) => columns.single(access_string).map(|column| {
            PrimitivePropertyMap {
                access_string: access_string.to_string(),
                ty: *ty,
                columns: vec![column],
            }
            .into()
        }),
        PropertyKind::Struct(struct_class) => {
            let mut members = vec![];
            for member in app.properties(*struct_class)? {
                let access_string = format!("{access_string}.{}", member.name);
                match load_property(app, member, &access_string, columns)? {
                    Some(map) => members.push(map),
                    None => return Ok(None),
                }
            }

            Some(
                StructPropertyMap {
                    access_string: access_string.to_string(),
                    struct_class: *struct_class,
                    members,
                }
                .into(),
            )
        }
        PropertyKind::PrimitiveArray(ty) => columns.single(access_string).map(|column| {
            ArrayPropertyMap {
                access_string: access_string.to_string(),
                element: ArrayElement::Primitive(*ty),
                column,
            }
            .into()
        }),
        PropertyKind::StructArray(struct_class) => match columns.single(access_string) {
            Some(column) => Some(
                ArrayPropertyMap {
                    access_string: access_string.to_string(),
                    element: ArrayElement::Struct(struct_binding(app, *struct_class)?),
                    column,
                }
                .into(),
            ),
            None => None,
        },
        PropertyKind::Navigation(nav) => {
            let id = columns.single(&format!("{access_string}.Id"));
            let rel_class_id = columns.single(&format!("{access_string}.RelECClassId"));

            match (id, rel_class_id) {
                (Some(id), Some(rel_class_id)) => Some(
                    NavigationPropertyMap {
                        access_string: access_string.to_string(),
                        relationship: nav.relationship,
                        direction: nav.direction,
                        id: Some(id),
                        rel_class_id: Some(rel_class_id),
                    }
                    .into(),
                ),
                (None, None) => None,
                _ => {
                    return Err(Error::invalid_schema(format!(
                        "navigation property `{access_string}` is only partially persisted"
                    )))
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::app::*;
    use crate::schema::Builder;
    use pretty_assertions::assert_eq;

    fn app() -> app::Schema {
        app::Schema::from_classes([
            Class::new_struct(ClassId(10), "Address")
                .with_property(Property::primitive("Street", PrimitiveType::String)),
            Class::new(ClassId(1), "Parent")
                .with_map_hint(MapHint::TablePerHierarchy(TphHint {
                    joined_table_per_direct_subclass: false,
                    share_columns: Some(ShareColumns {
                        max_before_overflow: Some(1),
                    }),
                }))
                .with_property(Property::primitive("Name", PrimitiveType::String))
                .with_property(Property::primitive("Loc", PrimitiveType::Point2d)),
            Class::new(ClassId(2), "Child")
                .with_property(Property::structure("Addr", ClassId(10)))
                .with_property(Property::struct_array("Previous", ClassId(10)))
                .with_property(Property::navigation("Parent", ClassId(3), Direction::Forward)),
            Class::new_relationship(ClassId(3), "ChildRefersToParent", Relationship::new(ClassId(2), ClassId(1))),
            Class::new_relationship(ClassId(4), "ParentHasChild", Relationship::new(ClassId(1), ClassId(2))),
        ])
    }

    #[test]
    fn round_trip() {
        let schema = Builder::new().build(app()).unwrap();
        let records = Records::from_schema(&schema, |_| true).unwrap();

        // One row per column binding
        let child: Vec<&str> = records
            .property_maps
            .iter()
            .filter(|record| record.class == ClassId(2))
            .map(|record| record.access_string.as_str())
            .collect();
        assert_eq!(
            child,
            [
                "ECInstanceId",
                "ECClassId",
                "Addr.Street",
                "Previous",
                "Parent.Id",
                "Parent.RelECClassId"
            ]
        );

        let loaded = records.into_schema(app()).unwrap();
        assert_eq!(loaded.db, schema.db);

        for (id, expected) in &schema.mapping.classes {
            let actual = loaded.mapping.class_map(*id);
            assert_eq!(actual.strategy, expected.strategy);
            assert_eq!(actual.tables, expected.tables);
            assert_eq!(actual.property_maps, expected.property_maps);
            assert_eq!(actual.state, ClassMapState::Persisted);
            assert!(actual.failed_to_load_properties.is_empty());
        }
    }

    #[test]
    fn unknown_properties_fail_to_load() {
        let schema = Builder::new().build(app()).unwrap();
        let records = Records::from_schema(&schema, |_| true).unwrap();

        let mut classes: Vec<Class> = app().classes().cloned().collect();
        for class in &mut classes {
            if class.id == ClassId(1) {
                class
                    .properties
                    .push(Property::primitive("Added", PrimitiveType::Integer));
            }
        }

        let loaded = records.into_schema(app::Schema::from_classes(classes)).unwrap();
        assert_eq!(
            loaded.mapping.class_map(ClassId(1)).failed_to_load_properties,
            ["Added"]
        );
    }

    #[test]
    fn missing_column_is_an_error() {
        let schema = Builder::new().build(app()).unwrap();
        let mut records = Records::from_schema(&schema, |_| true).unwrap();
        records.property_maps[2].column = "Nope".to_string();

        let err = records.into_schema(app()).unwrap_err();
        assert!(err.is_invalid_schema());
    }
}
