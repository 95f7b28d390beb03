//! Correspondence between classes and the tables and columns storing them.

mod class_map;
pub use class_map::{ClassMap, ClassMapState};

mod property_map;
pub use property_map::{
    ArrayElement, ArrayPropertyMap, MemberBinding, MemberKind, NavigationPropertyMap,
    PrimitivePropertyMap, PropertyMap, StructBinding, StructPropertyMap, SystemProperty,
    SystemPropertyMap,
};

mod property_maps;
pub use property_maps::PropertyMaps;

mod strategy;
pub use strategy::{JoinedTableInfo, MapStrategy, TphInfo};

pub mod visit;
pub use visit::{GetColumnsVisitor, Visit};

use super::app::ClassId;
use crate::{Error, Result};
use indexmap::IndexMap;

/// All class maps of a schema, keyed by class.
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    pub classes: IndexMap<ClassId, ClassMap>,
}

impl Mapping {
    /// Returns the class map for the specified class.
    ///
    /// # Panics
    ///
    /// Panics if the class has no class map.
    pub fn class_map(&self, id: impl Into<ClassId>) -> &ClassMap {
        self.classes.get(&id.into()).expect("invalid class ID")
    }

    pub fn get(&self, id: ClassId) -> Option<&ClassMap> {
        self.classes.get(&id)
    }

    pub fn get_mut(&mut self, id: ClassId) -> Option<&mut ClassMap> {
        self.classes.get_mut(&id)
    }

    pub fn try_class_map(&self, id: ClassId) -> Result<&ClassMap> {
        self.get(id)
            .ok_or_else(|| Error::invalid_schema(format!("class {id} is not mapped")))
    }
}
