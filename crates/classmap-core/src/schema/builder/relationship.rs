use super::{class_map::InheritanceMode, MappingContext};
use crate::{
    schema::{
        app::{Class, ClassId, ForeignKeyAction, RelationshipEnd},
        db::{ColumnId, ColumnKind, ColumnType, PersistenceType, TableId, TableType},
        mapping::{PropertyMap, PropertyMaps, SystemProperty, SystemPropertyMap},
    },
    Error, Result,
};

impl MappingContext<'_> {
    /// Adds the `Source*` and `Target*` columns of a relationship stored in
    /// its own link table.
    pub(super) fn map_link_table_constraints(&mut self, class: &Class) -> Result<()> {
        let Some(relationship) = class.relationship() else {
            return Err(Error::internal(format!("`{}` is not a relationship", class.name)));
        };

        if let InheritanceMode::Clone(base) = self.inheritance_mode(class) {
            let inherited: Vec<PropertyMap> = [RelationshipEnd::Source, RelationshipEnd::Target]
                .into_iter()
                .flat_map(|end| [SystemProperty::instance_id(end), SystemProperty::class_id(end)])
                .filter_map(|property| self.mapping.class_map(base).system(property).cloned())
                .map(PropertyMap::from)
                .collect();

            let class_map = self.class_map_mut(class.id)?;
            for map in inherited {
                class_map.property_maps.insert(map)?;
            }
            return Ok(());
        }

        let Some(table) = self.mapping.class_map(class.id).primary_table() else {
            return Err(Error::internal(format!("`{}` has no table", class.name)));
        };
        let table_name = self.db.table(table).name.clone();

        for end in [RelationshipEnd::Source, RelationshipEnd::Target] {
            let constraint = relationship.constraint(end);

            let instance_id = self.db.add_column(
                table,
                format!("{}ECInstanceId", end.as_str()),
                ColumnKind::Data,
                ColumnType::Integer,
                PersistenceType::Physical,
            )?;
            self.db.column_mut(instance_id).not_null = true;

            let class_id = self.db.add_column(
                table,
                format!("{}ECClassId", end.as_str()),
                ColumnKind::Data,
                ColumnType::Integer,
                PersistenceType::Virtual,
            )?;

            if let Some(referenced) = self.referenced_instance_id(constraint.class) {
                self.db.add_foreign_key_constraint(
                    instance_id,
                    referenced,
                    Some(ForeignKeyAction::Cascade),
                    None,
                )?;
            }

            self.db.add_index(
                table,
                format!("ix_{table_name}_{}", end.as_str().to_ascii_lowercase()),
                vec![instance_id],
                false,
            );

            let class_map = self.class_map_mut(class.id)?;
            class_map.property_maps.insert(SystemPropertyMap {
                property: SystemProperty::instance_id(end),
                columns: vec![instance_id],
            })?;
            class_map.property_maps.insert(SystemPropertyMap {
                property: SystemProperty::class_id(end),
                columns: vec![class_id],
            })?;
        }

        Ok(())
    }

    /// The `ECInstanceId` column of the primary table of `class`, if that
    /// table is one a foreign key can point at.
    fn referenced_instance_id(&self, class: ClassId) -> Option<ColumnId> {
        let table = self.mapping.get(class)?.primary_table()?;
        let table = self.db.table(table);

        if matches!(table.ty, TableType::Virtual | TableType::Existing) {
            return None;
        }

        table.find_first(ColumnKind::ECInstanceId).map(|column| column.id)
    }

    /// Lays out relationships stored as foreign keys.
    ///
    /// Each table holding a navigation property through the relationship
    /// contributes one column to every system property map: the row itself
    /// is the instance at the foreign key end, and the navigation columns
    /// identify the other end and the relationship class.
    pub(super) fn finish_end_table_relationships(&mut self) -> Result<()> {
        let app = self.app;

        let relationships: Vec<(ClassId, RelationshipEnd)> = self
            .mapping
            .classes
            .values()
            .filter_map(|class_map| {
                class_map
                    .strategy
                    .foreign_key_end()
                    .map(|end| (class_map.class, end))
            })
            .collect();

        for (relationship, fk_end) in relationships {
            // Navigation properties of base relationships store the instances
            // of derived relationships too
            let mut chain = vec![relationship];
            let mut current = relationship;
            while let Some(base) = app.primary_base(current) {
                if !self
                    .mapping
                    .get(base.id)
                    .is_some_and(|map| map.strategy.is_end_table_relationship())
                {
                    break;
                }
                chain.push(base.id);
                current = base.id;
            }

            let navigations: Vec<(String, ColumnId, ColumnId)> = self
                .mapping
                .classes
                .values()
                .flat_map(|class_map| class_map.property_maps.iter())
                .filter_map(PropertyMap::as_navigation)
                .filter(|nav| chain.contains(&nav.relationship))
                .filter_map(|nav| Some((nav.access_string.clone(), nav.id?, nav.rel_class_id?)))
                .collect();

            let mut tables: Vec<TableId> = vec![];
            let mut columns: [Vec<ColumnId>; 6] = Default::default();

            for (access_string, id, rel_class_id) in navigations {
                let table = id.table;
                if tables.contains(&table) {
                    continue;
                }

                let (Some(instance_id), Some(class_id)) = (
                    self.db.find_first(table, ColumnKind::ECInstanceId).map(|c| c.id),
                    self.db.find_first(table, ColumnKind::ECClassId).map(|c| c.id),
                ) else {
                    return Err(Error::internal(format!(
                        "table `{}` has no system columns",
                        self.db.table(table).name
                    )));
                };

                let other_end = fk_end.other();
                let other_class_id_name = format!("{access_string}{}ECClassId", other_end.as_str());
                let other_class_id = match self.db.find_column(table, &other_class_id_name) {
                    Some(column) if column.is_virtual() => column.id,
                    _ => self.add_virtual_column(table, &other_class_id_name)?,
                };

                for (property, column) in [
                    (SystemProperty::ECInstanceId, instance_id),
                    (SystemProperty::ECClassId, rel_class_id),
                    (SystemProperty::instance_id(fk_end), instance_id),
                    (SystemProperty::class_id(fk_end), class_id),
                    (SystemProperty::instance_id(other_end), id),
                    (SystemProperty::class_id(other_end), other_class_id),
                ] {
                    columns[slot(property)].push(column);
                }

                tables.push(table);
            }

            let mut property_maps = PropertyMaps::new();
            for (property, columns) in SystemProperty::ALL.into_iter().zip(columns) {
                property_maps.insert(SystemPropertyMap { property, columns })?;
            }

            let class_map = self.class_map_mut(relationship)?;
            if class_map.property_maps != property_maps || class_map.tables != tables {
                log::debug!(
                    "relationship {relationship} stored in {} table(s) as {}",
                    tables.len(),
                    class_map.strategy.name()
                );
                class_map.property_maps = property_maps;
                class_map.tables = tables;
                self.mark_modified(relationship);
            }
        }

        Ok(())
    }
}

fn slot(property: SystemProperty) -> usize {
    SystemProperty::ALL
        .iter()
        .position(|candidate| *candidate == property)
        .unwrap_or_default()
}
