use super::{Property, Relationship};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A class in the class graph.
#[derive(Debug, Clone)]
pub struct Class {
    /// Uniquely identifies the class. This is also the value stored in
    /// `ECClassId` columns.
    pub id: ClassId,

    /// Name of the class, unique within the schema
    pub name: String,

    pub kind: ClassKind,

    pub modifier: ClassModifier,

    /// Direct base classes. Only the first one contributes a table layout;
    /// additional ones act as mixins and only contribute properties.
    pub base_classes: Vec<ClassId>,

    /// Properties declared by this class (inherited ones are not repeated).
    pub properties: Vec<Property>,

    /// Mapping customization. Only honored on hierarchy roots, derived
    /// classes inherit the layout of their base.
    pub map_hint: MapHint,

    /// Name of a DateTime property whose column is bumped to the current time
    /// whenever the row is updated.
    pub current_timestamp_property: Option<String>,
}

/// Uniquely identifies a class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(pub u64);

#[derive(Debug, Clone)]
pub enum ClassKind {
    Entity,

    /// Struct classes are never mapped on their own. Their properties are
    /// flattened into the class holding the struct property.
    Struct,

    Relationship(Relationship),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassModifier {
    #[default]
    None,
    Abstract,
    Sealed,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum MapHint {
    /// Use the builder's default strategy
    #[default]
    Default,

    /// Do not map the class (and its subclasses)
    NotMapped,

    /// The class gets its own table which it shares with nobody
    OwnTable,

    /// The class and all of its subclasses share one table
    TablePerHierarchy(TphHint),

    /// Map onto a table that is owned by somebody else. The table is never
    /// created or altered.
    ExistingTable { table: String },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TphHint {
    /// Each direct subclass gets a joined table for the properties it (and
    /// its subclasses) add.
    pub joined_table_per_direct_subclass: bool,

    /// Store data properties in generic shared columns
    pub share_columns: Option<ShareColumns>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShareColumns {
    /// Maximum number of shared columns in the primary (or joined) table.
    /// Additional shared columns spill over into an overflow table.
    pub max_before_overflow: Option<usize>,
}

impl Class {
    pub fn new(id: ClassId, name: impl Into<String>) -> Class {
        Class {
            id,
            name: name.into(),
            kind: ClassKind::Entity,
            modifier: ClassModifier::None,
            base_classes: vec![],
            properties: vec![],
            map_hint: MapHint::Default,
            current_timestamp_property: None,
        }
    }

    pub fn new_struct(id: ClassId, name: impl Into<String>) -> Class {
        Class {
            kind: ClassKind::Struct,
            ..Class::new(id, name)
        }
    }

    pub fn new_relationship(id: ClassId, name: impl Into<String>, rel: Relationship) -> Class {
        Class {
            kind: ClassKind::Relationship(rel),
            ..Class::new(id, name)
        }
    }

    pub fn with_base(mut self, base: ClassId) -> Class {
        self.base_classes.push(base);
        self
    }

    pub fn with_property(mut self, property: Property) -> Class {
        self.properties.push(property);
        self
    }

    pub fn with_map_hint(mut self, hint: MapHint) -> Class {
        self.map_hint = hint;
        self
    }

    pub fn with_modifier(mut self, modifier: ClassModifier) -> Class {
        self.modifier = modifier;
        self
    }

    pub fn with_current_timestamp_property(mut self, name: impl Into<String>) -> Class {
        self.current_timestamp_property = Some(name.into());
        self
    }

    pub fn is_struct(&self) -> bool {
        matches!(self.kind, ClassKind::Struct)
    }

    pub fn is_abstract(&self) -> bool {
        self.modifier == ClassModifier::Abstract
    }

    pub fn is_sealed(&self) -> bool {
        self.modifier == ClassModifier::Sealed
    }

    pub fn relationship(&self) -> Option<&Relationship> {
        match &self.kind {
            ClassKind::Relationship(rel) => Some(rel),
            _ => None,
        }
    }

    pub fn declared_property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|property| property.name == name)
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&Class> for ClassId {
    fn from(value: &Class) -> Self {
        value.id
    }
}
