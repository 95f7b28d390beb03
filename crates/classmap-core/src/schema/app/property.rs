use super::ClassId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,

    pub kind: PropertyKind,

    /// Readonly properties may be set on INSERT only
    pub readonly: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKind {
    Primitive(PrimitiveType),

    /// Embedded struct, flattened member by member
    Struct(ClassId),

    PrimitiveArray(PrimitiveType),

    StructArray(ClassId),

    Navigation(Navigation),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Binary,
    Boolean,
    /// Stored as a julian day number
    DateTime,
    Double,
    Integer,
    Long,
    String,
    Point2d,
    Point3d,
}

/// A property referencing an instance of another class through a
/// relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigation {
    pub relationship: ClassId,

    /// `Forward` when the class holding the property is the relationship's
    /// source, `Backward` when it is the target.
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Backward,
}

impl Property {
    pub fn primitive(name: impl Into<String>, ty: PrimitiveType) -> Property {
        Property {
            name: name.into(),
            kind: PropertyKind::Primitive(ty),
            readonly: false,
        }
    }

    pub fn structure(name: impl Into<String>, struct_class: ClassId) -> Property {
        Property {
            name: name.into(),
            kind: PropertyKind::Struct(struct_class),
            readonly: false,
        }
    }

    pub fn primitive_array(name: impl Into<String>, ty: PrimitiveType) -> Property {
        Property {
            name: name.into(),
            kind: PropertyKind::PrimitiveArray(ty),
            readonly: false,
        }
    }

    pub fn struct_array(name: impl Into<String>, struct_class: ClassId) -> Property {
        Property {
            name: name.into(),
            kind: PropertyKind::StructArray(struct_class),
            readonly: false,
        }
    }

    pub fn navigation(name: impl Into<String>, relationship: ClassId, direction: Direction) -> Property {
        Property {
            name: name.into(),
            kind: PropertyKind::Navigation(Navigation {
                relationship,
                direction,
            }),
            readonly: false,
        }
    }

    pub fn readonly(mut self) -> Property {
        self.readonly = true;
        self
    }

    pub fn as_navigation(&self) -> Option<&Navigation> {
        match &self.kind {
            PropertyKind::Navigation(nav) => Some(nav),
            _ => None,
        }
    }

    /// True if both properties store the same shape of data. Overrides must
    /// be compatible with the property they override.
    pub fn is_compatible_with(&self, other: &Property) -> bool {
        self.kind == other.kind
    }
}

impl PrimitiveType {
    pub fn is_point(self) -> bool {
        matches!(self, PrimitiveType::Point2d | PrimitiveType::Point3d)
    }

    /// Number of coordinates for point types, 1 otherwise
    pub fn width(self) -> usize {
        match self {
            PrimitiveType::Point2d => 2,
            PrimitiveType::Point3d => 3,
            _ => 1,
        }
    }
}
