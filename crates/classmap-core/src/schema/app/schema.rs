use super::{Class, ClassId, Property, PropertyKind};
use crate::{Error, Result};
use indexmap::{IndexMap, IndexSet};

/// The class graph handed to the mapper.
#[derive(Debug, Default, Clone)]
pub struct Schema {
    pub classes: IndexMap<ClassId, Class>,
}

impl Schema {
    pub fn new() -> Schema {
        Schema::default()
    }

    pub fn from_classes(classes: impl IntoIterator<Item = Class>) -> Schema {
        Schema {
            classes: classes.into_iter().map(|class| (class.id, class)).collect(),
        }
    }

    /// Returns the class with the given identifier.
    ///
    /// # Panics
    ///
    /// Panics if the class does not exist.
    pub fn class(&self, id: impl Into<ClassId>) -> &Class {
        self.classes.get(&id.into()).expect("invalid class ID")
    }

    pub fn get(&self, id: ClassId) -> Option<&Class> {
        self.classes.get(&id)
    }

    pub fn class_by_name(&self, name: &str) -> Option<&Class> {
        self.classes.values().find(|class| class.name == name)
    }

    pub fn classes(&self) -> impl ExactSizeIterator<Item = &Class> {
        self.classes.values()
    }

    /// Direct subclasses of `id`, in declaration order
    pub fn derived_classes(&self, id: ClassId) -> impl Iterator<Item = &Class> + '_ {
        self.classes
            .values()
            .filter(move |class| class.base_classes.contains(&id))
    }

    /// `id` followed by all of its transitive subclasses
    pub fn class_and_derived(&self, id: ClassId) -> Vec<ClassId> {
        let mut found = IndexSet::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if found.insert(next) {
                stack.extend(self.derived_classes(next).map(|class| class.id));
            }
        }
        found.into_iter().collect()
    }

    /// True if `class` is `base` or inherits from it, directly or not.
    pub fn is_same_or_derived(&self, class: ClassId, base: ClassId) -> bool {
        if class == base {
            return true;
        }

        self.get(class).is_some_and(|c| {
            c.base_classes
                .iter()
                .any(|b| self.is_same_or_derived(*b, base))
        })
    }

    /// The base class contributing the table layout, if any
    pub fn primary_base(&self, id: ClassId) -> Option<&Class> {
        let class = self.get(id)?;
        class.base_classes.first().and_then(|base| self.get(*base))
    }

    /// The topmost class along the primary base chain.
    pub fn hierarchy_root(&self, id: ClassId) -> ClassId {
        let mut current = id;
        while let Some(base) = self.primary_base(current) {
            current = base.id;
        }
        current
    }

    /// Orders all classes so that every class comes after its base classes.
    ///
    /// Classes keep their declaration order when they do not depend on each
    /// other. A base class that does not exist, or an inheritance cycle, is
    /// an error.
    pub fn topological_order(&self) -> Result<Vec<ClassId>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        fn visit(
            schema: &Schema,
            id: ClassId,
            marks: &mut IndexMap<ClassId, Mark>,
            order: &mut Vec<ClassId>,
        ) -> Result<()> {
            match marks.get(&id) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => {
                    return Err(Error::invalid_schema(format!(
                        "class `{}` is part of an inheritance cycle",
                        schema.class(id).name
                    )))
                }
                None => {}
            }

            marks.insert(id, Mark::Visiting);

            let class = schema.class(id);
            for base in &class.base_classes {
                if schema.get(*base).is_none() {
                    return Err(Error::invalid_schema(format!(
                        "base class {base} of `{}` does not exist",
                        class.name
                    )));
                }
                visit(schema, *base, marks, order)?;
            }

            marks.insert(id, Mark::Done);
            order.push(id);
            Ok(())
        }

        let mut marks = IndexMap::new();
        let mut order = Vec::with_capacity(self.classes.len());

        for id in self.classes.keys() {
            visit(self, *id, &mut marks, &mut order)?;
        }

        Ok(order)
    }

    /// All properties of a class in their natural enumeration order.
    ///
    /// Inherited properties come first, in the order of the base class.
    /// Properties declared by the class follow. An override keeps the
    /// position of the property it overrides but uses the overriding
    /// declaration.
    pub fn properties(&self, id: ClassId) -> Result<Vec<&Property>> {
        let Some(class) = self.get(id) else {
            return Err(Error::invalid_schema(format!("class {id} does not exist")));
        };

        let mut properties: IndexMap<&str, &Property> = IndexMap::new();

        for base in &class.base_classes {
            for property in self.properties(*base)? {
                properties.entry(property.name.as_str()).or_insert(property);
            }
        }

        for property in &class.properties {
            if let Some(overridden) = properties.get_mut(property.name.as_str()) {
                if !property.is_compatible_with(overridden) {
                    return Err(Error::invalid_schema(format!(
                        "property `{}.{}` overrides a property of a different kind",
                        class.name, property.name
                    )));
                }
                *overridden = property;
            } else {
                properties.insert(property.name.as_str(), property);
            }
        }

        Ok(properties.into_values().collect())
    }

    /// Finds a property, inherited or declared, by name.
    pub fn property(&self, id: ClassId, name: &str) -> Option<&Property> {
        let class = self.get(id)?;
        class.declared_property(name).or_else(|| {
            class
                .base_classes
                .iter()
                .find_map(|base| self.property(*base, name))
        })
    }

    /// Classes declaring a navigation property that goes through the given
    /// relationship, together with that property.
    pub fn navigation_properties_for(&self, relationship: ClassId) -> Vec<(ClassId, &Property)> {
        self.classes
            .values()
            .flat_map(|class| {
                class
                    .properties
                    .iter()
                    .filter(move |property| match &property.kind {
                        PropertyKind::Navigation(nav) => nav.relationship == relationship,
                        _ => false,
                    })
                    .map(move |property| (class.id, property))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::app::{PrimitiveType, Property};

    fn class(id: u64, name: &str) -> Class {
        Class::new(ClassId(id), name)
    }

    #[test]
    fn topological_order_puts_bases_first() {
        let schema = Schema::from_classes([
            class(3, "Leaf").with_base(ClassId(2)),
            class(2, "Middle").with_base(ClassId(1)),
            class(1, "Root"),
        ]);

        assert_eq!(
            schema.topological_order().unwrap(),
            vec![ClassId(1), ClassId(2), ClassId(3)]
        );
    }

    #[test]
    fn inheritance_cycle_is_invalid_schema() {
        let schema = Schema::from_classes([
            class(1, "A").with_base(ClassId(2)),
            class(2, "B").with_base(ClassId(1)),
        ]);

        let err = schema.topological_order().unwrap_err();
        assert!(err.is_invalid_schema());
    }

    #[test]
    fn missing_base_is_invalid_schema() {
        let schema = Schema::from_classes([class(1, "A").with_base(ClassId(9))]);
        assert!(schema.topological_order().unwrap_err().is_invalid_schema());
    }

    #[test]
    fn overrides_keep_base_position() {
        let schema = Schema::from_classes([
            class(1, "Base")
                .with_property(Property::primitive("A", PrimitiveType::String))
                .with_property(Property::primitive("B", PrimitiveType::Long)),
            class(2, "Derived")
                .with_base(ClassId(1))
                .with_property(Property::primitive("C", PrimitiveType::Double))
                .with_property(Property::primitive("A", PrimitiveType::String).readonly()),
        ]);

        let properties = schema.properties(ClassId(2)).unwrap();
        let names: Vec<_> = properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["A", "B", "C"]);
        assert!(properties[0].readonly);
    }

    #[test]
    fn incompatible_override_is_rejected() {
        let schema = Schema::from_classes([
            class(1, "Base").with_property(Property::primitive("A", PrimitiveType::String)),
            class(2, "Derived")
                .with_base(ClassId(1))
                .with_property(Property::primitive("A", PrimitiveType::Long)),
        ]);

        assert!(schema.properties(ClassId(2)).unwrap_err().is_invalid_schema());
    }

    #[test]
    fn class_and_derived_is_transitive() {
        let schema = Schema::from_classes([
            class(1, "Root"),
            class(2, "A").with_base(ClassId(1)),
            class(3, "B").with_base(ClassId(1)),
            class(4, "AA").with_base(ClassId(2)),
        ]);

        let mut ids = schema.class_and_derived(ClassId(1));
        ids.sort();
        assert_eq!(ids, [ClassId(1), ClassId(2), ClassId(3), ClassId(4)]);
        assert!(schema.is_same_or_derived(ClassId(4), ClassId(1)));
        assert!(!schema.is_same_or_derived(ClassId(3), ClassId(2)));
        assert_eq!(schema.hierarchy_root(ClassId(4)), ClassId(1));
    }
}
