use super::MappingContext;
use crate::{
    schema::{
        app::{self, ClassId, Property, PropertyKind},
        db::ColumnType,
        mapping::{
            ArrayElement, ArrayPropertyMap, MemberBinding, MemberKind, NavigationPropertyMap,
            PrimitivePropertyMap, PropertyMap, StructBinding, StructPropertyMap,
        },
    },
    Error, Result,
};

impl MappingContext<'_> {
    /// Maps a property of `class` onto newly allocated (or reusable)
    /// columns. Navigation maps are returned incomplete.
    pub(super) fn map_property(
        &mut self,
        class: ClassId,
        property: &Property,
        access_string: &str,
    ) -> Result<PropertyMap> {
        self.map_property_nested(class, property, access_string, &mut vec![])
    }

    fn map_property_nested(
        &mut self,
        class: ClassId,
        property: &Property,
        access_string: &str,
        structs: &mut Vec<ClassId>,
    ) -> Result<PropertyMap> {
        let app = self.app;

        Ok(match &property.kind {
            PropertyKind::Primitive(ty) if ty.is_point() => {
                let columns = ["X", "Y", "Z"][..ty.width()]
                    .iter()
                    .map(|coordinate| {
                        let name = column_name(&format!("{access_string}.{coordinate}"));
                        self.allocate_column(class, &name, ColumnType::Double)
                    })
                    .collect::<Result<Vec<_>>>()?;

                PrimitivePropertyMap {
                    access_string: access_string.to_string(),
                    ty: *ty,
                    columns,
                }
                .into()
            }
            PropertyKind::Primitive(ty) => {
                let column = self.allocate_column(
                    class,
                    &column_name(access_string),
                    ColumnType::from_primitive(*ty),
                )?;

                PrimitivePropertyMap {
                    access_string: access_string.to_string(),
                    ty: *ty,
                    columns: vec![column],
                }
                .into()
            }
            PropertyKind::Struct(struct_class) => {
                enter_struct(app, structs, *struct_class)?;

                let mut members = vec![];
                for member in app.properties(*struct_class)? {
                    if member.as_navigation().is_some() {
                        return Err(Error::invalid_schema(format!(
                            "struct `{}` cannot have navigation property `{}`",
                            app.class(*struct_class).name,
                            member.name
                        )));
                    }

                    let access_string = format!("{access_string}.{}", member.name);
                    members.push(self.map_property_nested(class, member, &access_string, structs)?);
                }

                structs.pop();

                StructPropertyMap {
                    access_string: access_string.to_string(),
                    struct_class: *struct_class,
                    members,
                }
                .into()
            }
            PropertyKind::PrimitiveArray(ty) => ArrayPropertyMap {
                access_string: access_string.to_string(),
                element: ArrayElement::Primitive(*ty),
                column: self.allocate_column(class, &column_name(access_string), ColumnType::Text)?,
            }
            .into(),
            PropertyKind::StructArray(struct_class) => {
                let binding = struct_binding_nested(app, *struct_class, structs)?;

                ArrayPropertyMap {
                    access_string: access_string.to_string(),
                    element: ArrayElement::Struct(binding),
                    column: self.allocate_column(class, &column_name(access_string), ColumnType::Text)?,
                }
                .into()
            }
            PropertyKind::Navigation(nav) => NavigationPropertyMap {
                access_string: access_string.to_string(),
                relationship: nav.relationship,
                direction: nav.direction,
                id: None,
                rel_class_id: None,
            }
            .into(),
        })
    }
}

/// Describes the JSON shape of struct values stored in an array column.
pub(in crate::schema) fn struct_binding(app: &app::Schema, struct_class: ClassId) -> Result<StructBinding> {
    struct_binding_nested(app, struct_class, &mut vec![])
}

fn struct_binding_nested(
    app: &app::Schema,
    struct_class: ClassId,
    structs: &mut Vec<ClassId>,
) -> Result<StructBinding> {
    enter_struct(app, structs, struct_class)?;

    let mut members = vec![];
    for member in app.properties(struct_class)? {
        let kind = match &member.kind {
            PropertyKind::Primitive(ty) => MemberKind::Primitive(*ty),
            PropertyKind::Struct(nested) => {
                MemberKind::Struct(struct_binding_nested(app, *nested, structs)?)
            }
            PropertyKind::PrimitiveArray(ty) => MemberKind::PrimitiveArray(*ty),
            PropertyKind::StructArray(nested) => {
                MemberKind::StructArray(struct_binding_nested(app, *nested, structs)?)
            }
            PropertyKind::Navigation(_) => {
                return Err(Error::invalid_schema(format!(
                    "struct `{}` cannot have navigation property `{}`",
                    app.class(struct_class).name,
                    member.name
                )))
            }
        };

        members.push(MemberBinding {
            name: member.name.clone(),
            kind,
        });
    }

    structs.pop();

    Ok(StructBinding {
        struct_class,
        members,
    })
}

/// Columns are named after the access string of the value they hold.
pub(super) fn column_name(access_string: &str) -> String {
    access_string.replace('.', "_")
}

fn enter_struct(
    app: &app::Schema,
    structs: &mut Vec<ClassId>,
    struct_class: ClassId,
) -> Result<()> {
    let Some(class) = app.get(struct_class) else {
        return Err(Error::invalid_schema(format!(
            "unknown struct class {struct_class}"
        )));
    };

    if !class.is_struct() {
        return Err(Error::invalid_schema(format!(
            "`{}` is not a struct class",
            class.name
        )));
    }

    if structs.contains(&struct_class) {
        return Err(Error::invalid_schema(format!(
            "struct `{}` contains itself",
            class.name
        )));
    }

    structs.push(struct_class);
    Ok(())
}
