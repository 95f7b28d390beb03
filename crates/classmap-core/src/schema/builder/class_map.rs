use super::MappingContext;
use crate::{
    schema::{
        app::{Class, ClassId, ClassKind, Direction, MapHint, Property},
        db::{ColumnKind, ColumnType, PersistenceType, TableId, TableType},
        mapping::{
            ClassMap, JoinedTableInfo, MapStrategy, PropertyMap, SystemProperty,
            SystemPropertyMap, TphInfo,
        },
    },
    Error, Result,
};

/// Whether a class reuses the property maps of its base class
#[derive(Debug, Clone, Copy)]
pub(super) enum InheritanceMode {
    NotInherited,
    Clone(ClassId),
}

impl<'a> MappingContext<'a> {
    /// Determines the strategy of a class from its hint and its base class
    /// map.
    pub(super) fn strategy_for(&self, class: &Class) -> Result<MapStrategy> {
        if let ClassKind::Relationship(_) = class.kind {
            if let Some(strategy) = self.end_table_strategy_for(class)? {
                return Ok(strategy);
            }
        }

        if let Some(base) = self.app.primary_base(class.id) {
            let Some(base_map) = self.mapping.get(base.id) else {
                return Err(Error::invalid_schema(format!(
                    "base class `{}` of `{}` must be mapped first",
                    base.name, class.name
                )));
            };

            match &base_map.strategy {
                MapStrategy::NotMapped => return Ok(MapStrategy::NotMapped),
                MapStrategy::TablePerHierarchy(tph) => {
                    let joined_table = match tph.joined_table {
                        JoinedTableInfo::None => JoinedTableInfo::None,
                        _ => JoinedTableInfo::JoinedTable,
                    };
                    return Ok(MapStrategy::TablePerHierarchy(TphInfo {
                        joined_table,
                        ..tph.clone()
                    }));
                }
                strategy if strategy.is_end_table_relationship() => {
                    return Ok(strategy.clone());
                }
                _ => {}
            }
        }

        let hint = match &class.map_hint {
            MapHint::Default => &self.builder.default_map_hint,
            hint => hint,
        };

        Ok(match hint {
            MapHint::Default | MapHint::OwnTable => MapStrategy::OwnTable,
            MapHint::NotMapped => MapStrategy::NotMapped,
            MapHint::ExistingTable { .. } => MapStrategy::ExistingTable,
            MapHint::TablePerHierarchy(tph) => MapStrategy::TablePerHierarchy(TphInfo {
                root: class.id,
                joined_table: if tph.joined_table_per_direct_subclass {
                    JoinedTableInfo::ParentOfJoinedTable
                } else {
                    JoinedTableInfo::None
                },
                share_columns: tph.share_columns.is_some(),
                max_shared_columns_before_overflow: tph
                    .share_columns
                    .and_then(|share| share.max_before_overflow)
                    .or(self.builder.max_shared_columns_before_overflow),
            }),
        })
    }

    /// Relationships with a navigation property are stored as a foreign key
    /// in the table of the class declaring the property.
    fn end_table_strategy_for(&self, class: &Class) -> Result<Option<MapStrategy>> {
        let navigations = self.app.navigation_properties_for(class.id);

        let mut directions = navigations
            .iter()
            .filter_map(|(_, property)| property.as_navigation())
            .map(|nav| nav.direction);

        let Some(first) = directions.next() else {
            return Ok(None);
        };

        if directions.any(|direction| direction != first) {
            return Err(Error::invalid_schema(format!(
                "relationship `{}` has navigation properties on both of its ends",
                class.name
            )));
        }

        Ok(Some(match first {
            Direction::Forward => MapStrategy::ForeignKeyRelationshipInSourceTable,
            Direction::Backward => MapStrategy::ForeignKeyRelationshipInTargetTable,
        }))
    }

    pub(super) fn map_class(&mut self, class: &'a Class) -> Result<()> {
        let strategy = self.strategy_for(class)?;
        log::debug!("mapping class `{}` with {}", class.name, strategy.name());

        self.mapping
            .classes
            .insert(class.id, ClassMap::new(class.id, strategy.clone()));

        // End-table relationships are laid out once all navigation
        // properties are complete.
        if strategy.is_not_mapped() || strategy.is_end_table_relationship() {
            return Ok(());
        }

        self.map_part1(class, &strategy)?;
        self.map_part2(class)
    }

    /// Remaps a class that already has a persisted class map.
    pub(super) fn update_class(&mut self, class: &'a Class) -> Result<()> {
        let strategy = self.strategy_for(class)?;
        let persisted = &self.mapping.class_map(class.id).strategy;

        if *persisted != strategy {
            return Err(Error::invalid_schema(format!(
                "map strategy of `{}` cannot change from {} to {}",
                class.name,
                persisted.name(),
                strategy.name()
            )));
        }

        if strategy.is_not_mapped() || strategy.is_end_table_relationship() {
            return Ok(());
        }

        let app = self.app;
        let mode = self.inheritance_mode(class);
        let class_map = self.mapping.class_map(class.id);
        let missing: Vec<&Property> = app
            .properties(class.id)?
            .into_iter()
            .filter(|property| !class_map.property_maps.contains(&property.name))
            .collect();

        for property in missing {
            log::debug!("mapping new property `{}.{}`", class.name, property.name);
            self.map_class_property(class, property, mode)?;
            self.mark_modified(class.id);
        }

        if let Some(class_map) = self.mapping.get_mut(class.id) {
            class_map.failed_to_load_properties.clear();
        }

        self.create_current_timestamp_trigger(class)
    }

    /// Table assignment and system columns
    fn map_part1(&mut self, class: &'a Class, strategy: &MapStrategy) -> Result<()> {
        let tables = match strategy {
            MapStrategy::OwnTable => vec![self.create_primary_table(class, false)?],
            MapStrategy::ExistingTable => vec![self.existing_table(class)?],
            MapStrategy::TablePerHierarchy(tph) => match self.tph_base(class) {
                None => vec![self.create_primary_table(class, true)?],
                Some(base) => {
                    let base_map = self.mapping.class_map(base);
                    let mut tables = base_map.tables.clone();
                    let base_joined = base_map
                        .strategy
                        .tph()
                        .map(|base_tph| base_tph.joined_table);

                    if tph.joined_table == JoinedTableInfo::JoinedTable
                        && base_joined == Some(JoinedTableInfo::ParentOfJoinedTable)
                    {
                        let parent = base_map.primary_table().ok_or_else(|| {
                            Error::internal(format!("class map {base} has no tables"))
                        })?;
                        tables.push(self.create_joined_table(class, parent)?);
                    }

                    tables
                }
            },
            _ => {
                return Err(Error::internal(format!(
                    "{} classes have no tables of their own",
                    strategy.name()
                )))
            }
        };

        let db = &self.db;
        let class_map = self
            .mapping
            .get_mut(class.id)
            .ok_or_else(|| Error::internal("class map disappeared"))?;

        for table in tables {
            class_map.add_table(db, table);
        }

        for (property, kind) in [
            (SystemProperty::ECInstanceId, ColumnKind::ECInstanceId),
            (SystemProperty::ECClassId, ColumnKind::ECClassId),
        ] {
            let columns = class_map
                .tables
                .iter()
                .map(|table| {
                    db.find_first(*table, kind).map(|column| column.id).ok_or_else(|| {
                        Error::internal(format!(
                            "table `{}` has no {} column",
                            db.table(*table).name,
                            property.as_str()
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            class_map
                .property_maps
                .insert(SystemPropertyMap { property, columns })?;
        }

        if matches!(class.kind, ClassKind::Relationship(_)) {
            self.map_link_table_constraints(class)?;
        }

        Ok(())
    }

    /// Property maps and the current timestamp trigger
    fn map_part2(&mut self, class: &'a Class) -> Result<()> {
        let app = self.app;
        let mode = self.inheritance_mode(class);

        for property in app.properties(class.id)? {
            self.map_class_property(class, property, mode)?;
        }

        self.create_current_timestamp_trigger(class)
    }

    fn map_class_property(
        &mut self,
        class: &'a Class,
        property: &'a Property,
        mode: InheritanceMode,
    ) -> Result<()> {
        let inherited = match mode {
            InheritanceMode::Clone(base) => self.mapping.class_map(base).find(&property.name).cloned(),
            InheritanceMode::NotInherited => None,
        };

        let map = match inherited {
            Some(map) => {
                self.register_tables_of(class.id, &map)?;
                map
            }
            None => self.map_property(class.id, property, &property.name)?,
        };

        let incomplete = !map.is_complete();
        let access_string = map.access_string().to_string();

        self.mapping
            .get_mut(class.id)
            .ok_or_else(|| Error::internal("class map disappeared"))?
            .property_maps
            .insert(map)?;

        if incomplete {
            self.complete_navigation_or_defer(class.id, &access_string)?;
        }

        Ok(())
    }

    /// Makes sure a class spans every table an inherited property map
    /// touches.
    pub(super) fn register_tables_of(&mut self, class: ClassId, map: &PropertyMap) -> Result<()> {
        let tables: Vec<TableId> = map.leaves().into_iter().map(|(_, c)| c.table).collect();

        for table in tables {
            if self.mapping.class_map(class).tables.contains(&table) {
                continue;
            }

            let info = self.db.table(table);
            match (info.ty, info.parent) {
                (TableType::Overflow, Some(parent)) => {
                    self.set_overflow_table(class, parent)?;
                }
                _ => {
                    let db = &self.db;
                    if let Some(class_map) = self.mapping.get_mut(class) {
                        class_map.add_table(db, table);
                    }
                }
            }
        }

        Ok(())
    }

    pub(super) fn inheritance_mode(&self, class: &Class) -> InheritanceMode {
        match self.tph_base(class) {
            Some(base) => InheritanceMode::Clone(base),
            None => InheritanceMode::NotInherited,
        }
    }

    /// The primary base class, when both it and `class` share a TPH table
    fn tph_base(&self, class: &Class) -> Option<ClassId> {
        let base = self.app.primary_base(class.id)?;
        let base_map = self.mapping.get(base.id)?;
        let class_map = self.mapping.get(class.id)?;

        (base_map.strategy.is_tph() && class_map.strategy.is_tph()).then_some(base.id)
    }

    fn create_primary_table(&mut self, class: &Class, tph: bool) -> Result<TableId> {
        let name = self.prefix_table_name(&class.name);
        let table = self.db.create_table(&name, TableType::Primary)?;
        self.db.table_mut(table).exclusive_root_class = Some(class.id);

        self.add_system_columns(table, tph)?;

        if tph {
            let class_id = self.db.find_first(table, ColumnKind::ECClassId).map(|c| c.id);
            if let Some(class_id) = class_id {
                self.db
                    .add_index(table, format!("ix_{name}_ecclassid"), vec![class_id], false);
            }
        }

        Ok(table)
    }

    fn create_joined_table(&mut self, class: &Class, parent: TableId) -> Result<TableId> {
        let name = self.prefix_table_name(&class.name);
        let table = self.db.create_table(&name, TableType::Joined)?;
        self.db.table_mut(table).parent = Some(parent);
        self.db.table_mut(table).exclusive_root_class = Some(class.id);

        self.add_system_columns(table, true)?;
        self.link_to_parent(table, parent)?;

        Ok(table)
    }

    fn existing_table(&mut self, class: &Class) -> Result<TableId> {
        let MapHint::ExistingTable { table: name } = &class.map_hint else {
            return Err(Error::internal("existing table strategy without hint"));
        };

        if let Some(table) = self.db.table_by_name(name) {
            if table.ty != TableType::Existing {
                return Err(Error::invalid_schema(format!(
                    "`{}` cannot map onto table `{name}` which is owned by another class",
                    class.name
                )));
            }
            return Ok(table.id);
        }

        let table = self.db.create_table(name, TableType::Existing)?;
        self.db.table_mut(table).exclusive_root_class = Some(class.id);

        let id = self.db.add_column(
            table,
            "Id",
            ColumnKind::ECInstanceId,
            ColumnType::Integer,
            PersistenceType::Physical,
        )?;
        self.db.column_mut(id).primary_key = true;
        self.db.add_column(
            table,
            "ECClassId",
            ColumnKind::ECClassId,
            ColumnType::Integer,
            PersistenceType::Virtual,
        )?;

        Ok(table)
    }

    /// Adds `ECInstanceId` and `ECClassId`. The class id is only stored when
    /// the table can hold rows of more than one class.
    pub(super) fn add_system_columns(&mut self, table: TableId, physical_class_id: bool) -> Result<()> {
        let id = self.db.add_column(
            table,
            "ECInstanceId",
            ColumnKind::ECInstanceId,
            ColumnType::Integer,
            PersistenceType::Physical,
        )?;
        let column = self.db.column_mut(id);
        column.primary_key = true;
        column.not_null = true;

        let class_id = self.db.add_column(
            table,
            "ECClassId",
            ColumnKind::ECClassId,
            ColumnType::Integer,
            if physical_class_id {
                PersistenceType::Physical
            } else {
                PersistenceType::Virtual
            },
        )?;
        self.db.column_mut(class_id).not_null = physical_class_id;

        Ok(())
    }

    /// Joined and overflow rows are deleted together with their parent row.
    pub(super) fn link_to_parent(&mut self, table: TableId, parent: TableId) -> Result<()> {
        let child = self.db.find_first(table, ColumnKind::ECInstanceId).map(|c| c.id);
        let parent = self.db.find_first(parent, ColumnKind::ECInstanceId).map(|c| c.id);

        let (Some(child), Some(parent)) = (child, parent) else {
            return Err(Error::internal("joined table without ECInstanceId column"));
        };

        self.db.add_foreign_key_constraint(
            child,
            parent,
            Some(crate::schema::app::ForeignKeyAction::Cascade),
            None,
        )
    }
}
