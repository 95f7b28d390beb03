//! The class graph: classes, their properties and relationships.
//!
//! This is the read-only input to the mapper. Nothing in this module knows
//! about tables or columns.

mod class;
pub use class::{Class, ClassId, ClassKind, ClassModifier, MapHint, ShareColumns, TphHint};

mod property;
pub use property::{Direction, Navigation, PrimitiveType, Property, PropertyKind};

mod relationship;
pub use relationship::{
    ForeignKeyAction, ForeignKeyHint, Multiplicity, Relationship, RelationshipConstraint,
    RelationshipEnd, Strength,
};

mod schema;
pub use schema::Schema;
