use crate::schema::{
    app::{ClassId, Direction, PrimitiveType, RelationshipEnd},
    db::ColumnId,
};

/// Maps one property, identified by its access string, onto columns.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyMap {
    System(SystemPropertyMap),
    Primitive(PrimitivePropertyMap),
    Struct(StructPropertyMap),
    Array(ArrayPropertyMap),
    Navigation(NavigationPropertyMap),
}

/// `ECInstanceId`, `ECClassId` and the relationship constraint properties.
///
/// A class spanning several tables has one column per table, primary table
/// first.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemPropertyMap {
    pub property: SystemProperty,
    pub columns: Vec<ColumnId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemProperty {
    ECInstanceId,
    ECClassId,
    SourceECInstanceId,
    SourceECClassId,
    TargetECInstanceId,
    TargetECClassId,
}

/// A primitive property. Points use one column per coordinate, every other
/// type uses exactly one column.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitivePropertyMap {
    pub access_string: String,
    pub ty: PrimitiveType,
    pub columns: Vec<ColumnId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructPropertyMap {
    pub access_string: String,
    pub struct_class: ClassId,
    /// One map per struct member, access strings prefixed with this map's
    pub members: Vec<PropertyMap>,
}

/// Arrays are stored as JSON in a single column.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayPropertyMap {
    pub access_string: String,
    pub element: ArrayElement,
    pub column: ColumnId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrayElement {
    Primitive(PrimitiveType),
    Struct(StructBinding),
}

/// Describes how struct values nested in an array are encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct StructBinding {
    pub struct_class: ClassId,
    pub members: Vec<MemberBinding>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberBinding {
    pub name: String,
    pub kind: MemberKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberKind {
    Primitive(PrimitiveType),
    Struct(StructBinding),
    PrimitiveArray(PrimitiveType),
    StructArray(StructBinding),
}

/// A navigation property. The columns are unset until the relationship the
/// property goes through has been mapped.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationPropertyMap {
    pub access_string: String,
    pub relationship: ClassId,
    pub direction: Direction,
    /// `<Nav>Id`, the id of the referenced instance
    pub id: Option<ColumnId>,
    /// `<Nav>RelECClassId`, the class of the relationship instance
    pub rel_class_id: Option<ColumnId>,
}

impl PropertyMap {
    pub fn access_string(&self) -> &str {
        match self {
            PropertyMap::System(map) => map.property.as_str(),
            PropertyMap::Primitive(map) => &map.access_string,
            PropertyMap::Struct(map) => &map.access_string,
            PropertyMap::Array(map) => &map.access_string,
            PropertyMap::Navigation(map) => &map.access_string,
        }
    }

    pub fn is_system(&self) -> bool {
        matches!(self, PropertyMap::System(_))
    }

    pub fn as_system(&self) -> Option<&SystemPropertyMap> {
        match self {
            PropertyMap::System(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructPropertyMap> {
        match self {
            PropertyMap::Struct(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_navigation(&self) -> Option<&NavigationPropertyMap> {
        match self {
            PropertyMap::Navigation(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_navigation_mut(&mut self) -> Option<&mut NavigationPropertyMap> {
        match self {
            PropertyMap::Navigation(map) => Some(map),
            _ => None,
        }
    }

    /// False only for navigation maps still waiting for their relationship
    pub fn is_complete(&self) -> bool {
        match self {
            PropertyMap::Navigation(map) => map.is_complete(),
            PropertyMap::Struct(map) => map.members.iter().all(PropertyMap::is_complete),
            _ => true,
        }
    }

    /// Every column the map touches paired with the access string that
    /// identifies it, in column order.
    ///
    /// System maps repeat their access string once per table.
    pub fn leaves(&self) -> Vec<(String, ColumnId)> {
        let mut leaves = vec![];
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves(&self, leaves: &mut Vec<(String, ColumnId)>) {
        match self {
            PropertyMap::System(map) => {
                for column in &map.columns {
                    leaves.push((map.property.as_str().to_string(), *column));
                }
            }
            PropertyMap::Primitive(map) => {
                if map.ty.is_point() {
                    for (column, coordinate) in map.columns.iter().zip(["X", "Y", "Z"]) {
                        leaves.push((format!("{}.{coordinate}", map.access_string), *column));
                    }
                } else {
                    for column in &map.columns {
                        leaves.push((map.access_string.clone(), *column));
                    }
                }
            }
            PropertyMap::Struct(map) => {
                for member in &map.members {
                    member.collect_leaves(leaves);
                }
            }
            PropertyMap::Array(map) => leaves.push((map.access_string.clone(), map.column)),
            PropertyMap::Navigation(map) => {
                if let Some(id) = map.id {
                    leaves.push((format!("{}.Id", map.access_string), id));
                }
                if let Some(rel_class_id) = map.rel_class_id {
                    leaves.push((format!("{}.RelECClassId", map.access_string), rel_class_id));
                }
            }
        }
    }
}

impl SystemPropertyMap {
    pub fn column_in(&self, table: crate::schema::db::TableId) -> Option<ColumnId> {
        self.columns.iter().copied().find(|column| column.table == table)
    }
}

impl SystemProperty {
    pub const ALL: [SystemProperty; 6] = [
        SystemProperty::ECInstanceId,
        SystemProperty::ECClassId,
        SystemProperty::SourceECInstanceId,
        SystemProperty::SourceECClassId,
        SystemProperty::TargetECInstanceId,
        SystemProperty::TargetECClassId,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SystemProperty::ECInstanceId => "ECInstanceId",
            SystemProperty::ECClassId => "ECClassId",
            SystemProperty::SourceECInstanceId => "SourceECInstanceId",
            SystemProperty::SourceECClassId => "SourceECClassId",
            SystemProperty::TargetECInstanceId => "TargetECInstanceId",
            SystemProperty::TargetECClassId => "TargetECClassId",
        }
    }

    pub fn from_name(name: &str) -> Option<SystemProperty> {
        SystemProperty::ALL
            .into_iter()
            .find(|property| property.as_str().eq_ignore_ascii_case(name))
    }

    pub fn instance_id(end: RelationshipEnd) -> SystemProperty {
        match end {
            RelationshipEnd::Source => SystemProperty::SourceECInstanceId,
            RelationshipEnd::Target => SystemProperty::TargetECInstanceId,
        }
    }

    pub fn class_id(end: RelationshipEnd) -> SystemProperty {
        match end {
            RelationshipEnd::Source => SystemProperty::SourceECClassId,
            RelationshipEnd::Target => SystemProperty::TargetECClassId,
        }
    }

    /// The relationship end a constraint property belongs to
    pub fn constraint_end(self) -> Option<RelationshipEnd> {
        match self {
            SystemProperty::SourceECInstanceId | SystemProperty::SourceECClassId => {
                Some(RelationshipEnd::Source)
            }
            SystemProperty::TargetECInstanceId | SystemProperty::TargetECClassId => {
                Some(RelationshipEnd::Target)
            }
            _ => None,
        }
    }

    pub fn is_class_id(self) -> bool {
        matches!(
            self,
            SystemProperty::ECClassId
                | SystemProperty::SourceECClassId
                | SystemProperty::TargetECClassId
        )
    }
}

impl NavigationPropertyMap {
    pub fn is_complete(&self) -> bool {
        self.id.is_some() && self.rel_class_id.is_some()
    }
}

impl From<SystemPropertyMap> for PropertyMap {
    fn from(value: SystemPropertyMap) -> Self {
        PropertyMap::System(value)
    }
}

impl From<PrimitivePropertyMap> for PropertyMap {
    fn from(value: PrimitivePropertyMap) -> Self {
        PropertyMap::Primitive(value)
    }
}

impl From<StructPropertyMap> for PropertyMap {
    fn from(value: StructPropertyMap) -> Self {
        PropertyMap::Struct(value)
    }
}

impl From<ArrayPropertyMap> for PropertyMap {
    fn from(value: ArrayPropertyMap) -> Self {
        PropertyMap::Array(value)
    }
}

impl From<NavigationPropertyMap> for PropertyMap {
    fn from(value: NavigationPropertyMap) -> Self {
        PropertyMap::Navigation(value)
    }
}
