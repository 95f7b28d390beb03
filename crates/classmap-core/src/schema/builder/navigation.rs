use super::{class_map::InheritanceMode, MappingContext};
use crate::{
    schema::{
        app::{ClassId, Direction, ForeignKeyAction, RelationshipEnd, Strength},
        db::{ColumnId, ColumnKind, ColumnType, TableType},
        mapping::PropertyMap,
    },
    Error, Result,
};

/// A navigation property whose relationship was not mapped yet
#[derive(Debug)]
pub(super) struct PendingNavigation {
    pub(super) class: ClassId,
    pub(super) access_string: String,
    pub(super) relationship: ClassId,
}

/// Foreign key constraint for a navigation id column. Added last, once the
/// referenced class has its tables.
#[derive(Debug)]
pub(super) struct PendingForeignKey {
    column: ColumnId,
    references: ClassId,
    on_delete: ForeignKeyAction,
    on_update: Option<ForeignKeyAction>,
}

#[derive(Debug, PartialEq, Eq)]
pub(super) enum NavigationMapping {
    Completed,
    Deferred,
}

impl MappingContext<'_> {
    pub(super) fn complete_navigation_or_defer(
        &mut self,
        class: ClassId,
        access_string: &str,
    ) -> Result<()> {
        if self.map_navigation_property(class, access_string)? == NavigationMapping::Deferred {
            let relationship = match self.mapping.class_map(class).find(access_string) {
                Some(PropertyMap::Navigation(nav)) => nav.relationship,
                _ => return Err(Error::internal("deferred property is not a navigation")),
            };

            log::trace!("deferring navigation property `{access_string}` of class {class}");
            self.pending_navigations.push(PendingNavigation {
                class,
                access_string: access_string.to_string(),
                relationship,
            });
        }

        Ok(())
    }

    /// Tries again to complete every deferred navigation property.
    ///
    /// Completing one property can unblock another (a subclass waiting on its
    /// base), so this keeps going until a pass makes no progress.
    pub(super) fn retry_pending_navigations(&mut self) -> Result<()> {
        loop {
            let pending = std::mem::take(&mut self.pending_navigations);
            let before = pending.len();

            for pending in pending {
                self.complete_navigation_or_defer(pending.class, &pending.access_string)?;
            }

            if self.pending_navigations.is_empty() || self.pending_navigations.len() == before {
                return Ok(());
            }
        }
    }

    /// Allocates the `Id` and `RelECClassId` columns of a navigation
    /// property.
    pub(super) fn map_navigation_property(
        &mut self,
        class: ClassId,
        access_string: &str,
    ) -> Result<NavigationMapping> {
        let app = self.app;

        let nav = match self.mapping.class_map(class).find(access_string) {
            Some(PropertyMap::Navigation(nav)) if nav.is_complete() => {
                return Ok(NavigationMapping::Completed)
            }
            Some(PropertyMap::Navigation(nav)) => nav.clone(),
            _ => {
                return Err(Error::internal(format!(
                    "`{access_string}` is not a navigation property"
                )))
            }
        };

        let Some(rel_class) = app.get(nav.relationship) else {
            return Err(Error::invalid_schema(format!(
                "navigation property `{access_string}` references unknown relationship {}",
                nav.relationship
            )));
        };

        let Some(relationship) = rel_class.relationship() else {
            return Err(Error::invalid_schema(format!(
                "navigation property `{access_string}` references `{}` which is not a relationship",
                rel_class.name
            )));
        };

        let end = match nav.direction {
            Direction::Forward => RelationshipEnd::Source,
            Direction::Backward => RelationshipEnd::Target,
        };
        let constraint = relationship.constraint(end);

        if !app.is_same_or_derived(class, constraint.class) {
            return Err(Error::invalid_schema(format!(
                "`{}` is not the {} constraint class of relationship `{}`",
                app.class(class).name,
                end.as_str().to_ascii_lowercase(),
                rel_class.name
            )));
        }

        let Some(rel_map) = self.mapping.get(nav.relationship) else {
            return Ok(NavigationMapping::Deferred);
        };

        if rel_map.strategy.foreign_key_end() != Some(end) {
            return Err(Error::invalid_schema(format!(
                "relationship `{}` is mapped as {}, which cannot back navigation property `{access_string}`",
                rel_class.name,
                rel_map.strategy.name()
            )));
        }

        // Classes sharing a table with their base reuse the base's columns
        if let InheritanceMode::Clone(base) = self.inheritance_mode(app.class(class)) {
            if let Some(inherited) = self.mapping.class_map(base).find(access_string) {
                if !inherited.is_complete() {
                    return Ok(NavigationMapping::Deferred);
                }

                let inherited = inherited.clone();
                self.register_tables_of(class, &inherited)?;
                self.class_map_mut(class)?.property_maps.replace(inherited)?;
                self.mark_modified(class);
                return Ok(NavigationMapping::Completed);
            }
        }

        let id = self.allocate_column(class, &format!("{access_string}Id"), ColumnType::Integer)?;

        let rel_class_id_name = format!("{access_string}RelECClassId");
        let table_ty = self.db.table(id.table).ty;
        let rel_class_id = if rel_class.is_sealed()
            || matches!(table_ty, TableType::Virtual | TableType::Existing)
        {
            self.add_virtual_column(id.table, &rel_class_id_name)?
        } else {
            self.allocate_column(class, &rel_class_id_name, ColumnType::Integer)?
        };

        if let Some(hint) = relationship.foreign_key {
            let on_delete = match hint.on_delete {
                Some(action) => action,
                None if relationship.strength == Strength::Embedding => ForeignKeyAction::Cascade,
                None => ForeignKeyAction::SetNull,
            };

            if on_delete == ForeignKeyAction::Cascade
                && relationship.strength != Strength::Embedding
            {
                return Err(Error::invalid_schema(format!(
                    "relationship `{}` must have embedding strength to cascade deletes",
                    rel_class.name
                )));
            }

            self.pending_foreign_keys.push(PendingForeignKey {
                column: id,
                references: relationship.constraint(end.other()).class,
                on_delete,
                on_update: hint.on_update,
            });
        }

        let class_map = self.class_map_mut(class)?;
        let Some(nav) = class_map
            .property_maps
            .find_mut(access_string)
            .and_then(PropertyMap::as_navigation_mut)
        else {
            return Err(Error::internal("navigation property map disappeared"));
        };
        nav.id = Some(id);
        nav.rel_class_id = Some(rel_class_id);

        self.mark_modified(class);
        Ok(NavigationMapping::Completed)
    }

    /// Adds the foreign keys collected while completing navigation
    /// properties.
    ///
    /// Constraints are only created on physical columns of owned tables that
    /// reference a table with storage.
    pub(super) fn finish_foreign_keys(&mut self) -> Result<()> {
        for pending in std::mem::take(&mut self.pending_foreign_keys) {
            let column = self.db.column(pending.column);
            let table = self.db.table(pending.column.table);

            if !table.is_owned() || column.is_virtual() || column.is_shared() {
                log::debug!(
                    "no foreign key constraint on `{}.{}`",
                    table.name,
                    column.name
                );
                continue;
            }

            let referenced = self
                .mapping
                .get(pending.references)
                .and_then(|class_map| class_map.primary_table())
                .filter(|table| self.db.table(*table).ty != TableType::Virtual)
                .and_then(|table| self.db.find_first(table, ColumnKind::ECInstanceId))
                .map(|column| column.id);

            let Some(referenced) = referenced else {
                continue;
            };

            self.db.add_foreign_key_constraint(
                pending.column,
                referenced,
                Some(pending.on_delete),
                pending.on_update,
            )?;
        }

        Ok(())
    }

    pub(super) fn class_map_mut(
        &mut self,
        class: ClassId,
    ) -> Result<&mut crate::schema::mapping::ClassMap> {
        self.mapping
            .get_mut(class)
            .ok_or_else(|| Error::internal(format!("class {class} is not mapped")))
    }
}
