use super::{PropertyMap, SystemProperty, SystemPropertyMap};
use crate::{Error, Result};
use indexmap::IndexMap;

/// The property maps of a class, keyed by access string.
///
/// Insertion order is significant: `ECInstanceId` is always at index 0 and
/// `ECClassId` at index 1, followed by the class's properties in their
/// natural order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyMaps {
    maps: IndexMap<String, PropertyMap>,
}

impl PropertyMaps {
    pub fn new() -> PropertyMaps {
        PropertyMaps::default()
    }

    pub fn insert(&mut self, map: impl Into<PropertyMap>) -> Result<()> {
        let map = map.into();
        let key = map.access_string().to_ascii_lowercase();

        if self.maps.contains_key(&key) {
            return Err(Error::internal(format!(
                "property `{}` mapped twice",
                map.access_string()
            )));
        }

        self.maps.insert(key, map);
        Ok(())
    }

    /// Replaces the map with the same access string, keeping its position.
    pub fn replace(&mut self, map: PropertyMap) -> Result<()> {
        let key = map.access_string().to_ascii_lowercase();
        match self.maps.get_mut(&key) {
            Some(slot) => {
                *slot = map;
                Ok(())
            }
            None => Err(Error::internal(format!(
                "property `{}` is not mapped",
                map.access_string()
            ))),
        }
    }

    /// Looks up a map by access string. Dotted access strings descend into
    /// struct members.
    pub fn find(&self, access_string: &str) -> Option<&PropertyMap> {
        let mut parts = access_string.split('.');
        let first = parts.next()?;
        let mut map = self.maps.get(&first.to_ascii_lowercase())?;
        let mut prefix = map.access_string().to_string();

        for part in parts {
            let PropertyMap::Struct(structure) = map else {
                return None;
            };
            prefix = format!("{prefix}.{part}");
            map = structure
                .members
                .iter()
                .find(|member| member.access_string().eq_ignore_ascii_case(&prefix))?;
        }

        Some(map)
    }

    pub fn find_mut(&mut self, access_string: &str) -> Option<&mut PropertyMap> {
        self.maps.get_mut(&access_string.to_ascii_lowercase())
    }

    /// Position of a top-level map in insertion order
    pub fn index_of(&self, access_string: &str) -> Option<usize> {
        self.maps.get_index_of(&access_string.to_ascii_lowercase())
    }

    pub fn system(&self, property: SystemProperty) -> Option<&SystemPropertyMap> {
        self.find(property.as_str()).and_then(PropertyMap::as_system)
    }

    pub fn system_mut(&mut self, property: SystemProperty) -> Option<&mut SystemPropertyMap> {
        match self.find_mut(property.as_str()) {
            Some(PropertyMap::System(map)) => Some(map),
            _ => None,
        }
    }

    pub fn contains(&self, access_string: &str) -> bool {
        self.find(access_string).is_some()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &PropertyMap> {
        self.maps.values()
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}

impl<'a> IntoIterator for &'a PropertyMaps {
    type Item = &'a PropertyMap;
    type IntoIter = indexmap::map::Values<'a, String, PropertyMap>;

    fn into_iter(self) -> Self::IntoIter {
        self.maps.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{
        app::{ClassId, PrimitiveType},
        db::{ColumnId, TableId},
        mapping::{PrimitivePropertyMap, StructPropertyMap},
    };

    fn col(index: usize) -> ColumnId {
        ColumnId {
            table: TableId(0),
            index,
        }
    }

    fn primitive(access_string: &str, column: usize) -> PropertyMap {
        PrimitivePropertyMap {
            access_string: access_string.to_string(),
            ty: PrimitiveType::String,
            columns: vec![col(column)],
        }
        .into()
    }

    #[test]
    fn find_descends_into_structs() {
        let mut maps = PropertyMaps::new();
        maps.insert(StructPropertyMap {
            access_string: "Address".to_string(),
            struct_class: ClassId(7),
            members: vec![primitive("Address.Street", 1), primitive("Address.City", 2)],
        })
        .unwrap();

        let city = maps.find("address.city").unwrap();
        assert_eq!(city.access_string(), "Address.City");
        assert!(maps.find("Address.Zip").is_none());
        assert!(maps.find("Address.City.Foo").is_none());
    }

    #[test]
    fn duplicate_access_string_is_internal_error() {
        let mut maps = PropertyMaps::new();
        maps.insert(primitive("Name", 1)).unwrap();
        assert!(maps.insert(primitive("name", 2)).unwrap_err().is_internal());
    }

    #[test]
    fn replace_keeps_position() {
        let mut maps = PropertyMaps::new();
        maps.insert(primitive("A", 1)).unwrap();
        maps.insert(primitive("B", 2)).unwrap();
        maps.replace(primitive("A", 3)).unwrap();

        assert_eq!(maps.index_of("A"), Some(0));
        assert_eq!(maps.find("A").unwrap().leaves()[0].1, col(3));
    }
}
