mod class_map;
mod column_factory;
mod navigation;
mod property;
mod relationship;
mod timestamp;

use super::{
    app::{self, ClassId, ClassKind, MapHint},
    db,
    mapping::{ClassMapState, Mapping},
    Schema,
};
use crate::{err, Error, Result};
use navigation::{PendingForeignKey, PendingNavigation};
pub(super) use property::struct_binding;

/// Configures how classes are mapped onto tables.
#[derive(Debug, Clone)]
pub struct Builder {
    /// If set, prefix all table names with this string
    table_name_prefix: Option<String>,

    /// Maximum number of physical columns per table. TPH hierarchies spill
    /// over into an overflow table when the limit is reached, other
    /// strategies fail to map.
    max_columns_per_table: usize,

    /// Used for `ShareColumns` hierarchies that do not set their own limit
    max_shared_columns_before_overflow: Option<usize>,

    /// Strategy for hierarchy roots that do not ask for one
    default_map_hint: MapHint,
}

/// State of one mapping run.
///
/// The context owns everything the run mutates. Class maps are produced in
/// topological order, so any base class map a class needs is already in
/// `mapping` when the class is mapped.
struct MappingContext<'a> {
    builder: &'a Builder,

    app: &'a app::Schema,

    db: db::Schema,

    mapping: Mapping,

    /// Navigation properties waiting for their relationship to be mapped
    pending_navigations: Vec<PendingNavigation>,

    /// Foreign keys to add once every class is mapped
    pending_foreign_keys: Vec<PendingForeignKey>,
}

impl Builder {
    /// SQLite's default column limit
    pub const DEFAULT_MAX_COLUMNS_PER_TABLE: usize = 2000;

    pub fn new() -> Self {
        Self {
            table_name_prefix: None,
            max_columns_per_table: Self::DEFAULT_MAX_COLUMNS_PER_TABLE,
            max_shared_columns_before_overflow: None,
            default_map_hint: MapHint::OwnTable,
        }
    }

    pub fn table_name_prefix(&mut self, prefix: &str) -> &mut Self {
        self.table_name_prefix = Some(prefix.to_string());
        self
    }

    pub fn max_columns_per_table(&mut self, max: usize) -> &mut Self {
        self.max_columns_per_table = max;
        self
    }

    pub fn max_shared_columns_before_overflow(&mut self, max: usize) -> &mut Self {
        self.max_shared_columns_before_overflow = Some(max);
        self
    }

    pub fn default_map_hint(&mut self, hint: MapHint) -> &mut Self {
        self.default_map_hint = hint;
        self
    }

    /// Maps a class graph from scratch.
    pub fn build(&self, app: app::Schema) -> Result<Schema> {
        let cx = MappingContext::new(self, &app, db::Schema::default(), Mapping::default());
        let (db, mapping) = cx.run()?;

        Ok(Schema { app, db, mapping })
    }

    /// Maps a new version of the class graph on top of a persisted schema.
    ///
    /// Classes and properties that are already mapped keep their columns.
    /// New ones are mapped the same way `build` would map them, and
    /// persisted class maps that change are marked
    /// [`Modified`](ClassMapState::Modified).
    pub fn update(&self, app: app::Schema, previous: Schema) -> Result<Schema> {
        let cx = MappingContext::new(self, &app, previous.db, previous.mapping);
        let (db, mapping) = cx.run()?;

        Ok(Schema { app, db, mapping })
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> MappingContext<'a> {
    fn new(
        builder: &'a Builder,
        app: &'a app::Schema,
        db: db::Schema,
        mapping: Mapping,
    ) -> MappingContext<'a> {
        MappingContext {
            builder,
            app,
            db,
            mapping,
            pending_navigations: vec![],
            pending_foreign_keys: vec![],
        }
    }

    fn run(mut self) -> Result<(db::Schema, Mapping)> {
        let app = self.app;
        let order = app.topological_order()?;

        // Relationships are mapped after the classes they connect. Both
        // groups stay in topological order.
        let (relationships, classes): (Vec<ClassId>, Vec<ClassId>) = order
            .into_iter()
            .filter(|id| !app.class(*id).is_struct())
            .partition(|id| matches!(app.class(*id).kind, ClassKind::Relationship(_)));

        for id in classes.into_iter().chain(relationships) {
            let class = app.class(id);

            if self.mapping.get(id).is_some() {
                self.update_class(class)
                    .map_err(|e| e.context(err!("failed to update mapping of `{}`", class.name)))?;
            } else {
                self.map_class(class)
                    .map_err(|e| e.context(err!("failed to map `{}`", class.name)))?;
            }

            self.retry_pending_navigations()?;
        }

        if let Some(pending) = self.pending_navigations.first() {
            return Err(Error::invalid_schema(format!(
                "navigation property `{}.{}` references relationship {} which cannot be mapped",
                app.class(pending.class).name,
                pending.access_string,
                pending.relationship
            )));
        }

        self.finish_end_table_relationships()?;
        self.finish_foreign_keys()?;

        for class_map in self.mapping.classes.values() {
            debug_assert!(
                class_map.strategy.is_not_mapped()
                    || class_map.property_maps.index_of("ECInstanceId") == Some(0),
                "ECInstanceId must be the first property map"
            );
            log::trace!(
                "class {} mapped with {} ({:?}); {} tables, {} property maps",
                class_map.class,
                class_map.strategy.name(),
                class_map.state,
                class_map.tables.len(),
                class_map.property_maps.len()
            );
        }

        Ok((self.db, self.mapping))
    }

    fn prefix_table_name(&self, name: &str) -> String {
        if let Some(prefix) = &self.builder.table_name_prefix {
            format!("{prefix}{name}")
        } else {
            name.to_string()
        }
    }

    fn mark_modified(&mut self, class: ClassId) {
        if let Some(class_map) = self.mapping.get_mut(class) {
            if class_map.state == ClassMapState::Persisted {
                log::debug!("class map {class} modified by schema update");
            }
            class_map.mark_modified();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{
        app::{Class, PrimitiveType, Property, TphHint},
        db::{TableId, TableType},
        mapping::SystemProperty,
    };
    use pretty_assertions::assert_eq;

    const ELEMENT: ClassId = ClassId(1);
    const SUB: ClassId = ClassId(2);

    fn hierarchy() -> app::Schema {
        app::Schema::from_classes([
            Class::new(ELEMENT, "Element")
                .with_property(Property::primitive("A", PrimitiveType::String))
                .with_map_hint(MapHint::TablePerHierarchy(TphHint {
                    joined_table_per_direct_subclass: false,
                    share_columns: None,
                })),
            Class::new(SUB, "Sub")
                .with_base(ELEMENT)
                .with_property(Property::primitive("C", PrimitiveType::String)),
        ])
    }

    fn system_columns(cx: &MappingContext<'_>, class: ClassId, property: SystemProperty) -> usize {
        cx.mapping
            .class_map(class)
            .system(property)
            .map(|map| map.columns.len())
            .unwrap_or_default()
    }

    #[test]
    fn set_overflow_table_is_idempotent() {
        let builder = Builder::new();
        let app = hierarchy();
        let schema = builder.build(app.clone()).unwrap();
        let element: TableId = schema.db.table_by_name("Element").unwrap().id;

        let mut cx = MappingContext::new(&builder, &app, schema.db, schema.mapping);

        let overflow = cx.set_overflow_table(ELEMENT, element).unwrap();
        assert_eq!(cx.db.table(overflow).ty, TableType::Overflow);
        assert_eq!(cx.db.table(overflow).parent, Some(element));

        let tables = cx.db.tables.clone();
        let instance_ids = system_columns(&cx, ELEMENT, SystemProperty::ECInstanceId);
        let class_ids = system_columns(&cx, ELEMENT, SystemProperty::ECClassId);
        assert_eq!(instance_ids, 2);

        assert_eq!(cx.set_overflow_table(ELEMENT, element).unwrap(), overflow);
        assert_eq!(cx.db.tables, tables);
        assert_eq!(system_columns(&cx, ELEMENT, SystemProperty::ECInstanceId), instance_ids);
        assert_eq!(system_columns(&cx, ELEMENT, SystemProperty::ECClassId), class_ids);

        // The subclass was extended by the first call and is left alone too
        for class in [ELEMENT, SUB] {
            assert_eq!(cx.mapping.class_map(class).tables, [element, overflow]);
        }
        assert_eq!(cx.set_overflow_table(SUB, element).unwrap(), overflow);
        assert_eq!(cx.db.tables, tables);
    }
}
