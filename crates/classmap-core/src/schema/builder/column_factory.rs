use super::MappingContext;
use crate::{
    schema::{
        app::ClassId,
        db::{ColumnId, ColumnKind, ColumnType, PersistenceType, TableId, TableType},
        mapping::{GetColumnsVisitor, SystemProperty, Visit},
    },
    Error, Result,
};
use std::collections::HashSet;

impl MappingContext<'_> {
    /// Finds or creates the column a data value of `class` is stored in.
    ///
    /// `name` is the column name to use when the class does not share
    /// columns. Columns the class already uses are never handed out twice.
    pub(super) fn allocate_column(
        &mut self,
        class: ClassId,
        name: &str,
        ty: ColumnType,
    ) -> Result<ColumnId> {
        let class_map = self.mapping.class_map(class);
        let Some(table) = class_map.data_table(&self.db) else {
            return Err(Error::internal(format!("class {class} has no data table")));
        };

        let tph = class_map.strategy.tph().cloned();
        let used = self.columns_used_by(class);

        match tph {
            Some(tph) if tph.share_columns => {
                self.allocate_shared_column(class, table, &used, tph.max_shared_columns_before_overflow)
            }
            _ => self.allocate_named_column(class, table, &used, name, ty, tph.is_some()),
        }
    }

    fn allocate_shared_column(
        &mut self,
        class: ClassId,
        table: TableId,
        used: &HashSet<ColumnId>,
        max_before_overflow: Option<usize>,
    ) -> Result<ColumnId> {
        let overflow = self.find_overflow_table(table);

        for candidate in std::iter::once(table).chain(overflow) {
            let free = self
                .db
                .table(candidate)
                .shared_columns()
                .map(|column| column.id)
                .find(|column| !used.contains(column));

            if let Some(column) = free {
                if candidate != table {
                    self.set_overflow_table(class, table)?;
                }
                log::trace!("reusing shared column `{}`", self.db.column(column).name);
                return Ok(column);
            }
        }

        let shared = self.db.table(table).shared_columns().count();
        let below_limit = max_before_overflow.map_or(true, |max| shared < max);

        let target = if below_limit && !self.is_full(table) {
            table
        } else {
            self.set_overflow_table(class, table)?
        };

        if self.is_full(target) {
            return Err(Error::invalid_schema(format!(
                "table `{}` has no room for another column",
                self.db.table(target).name
            )));
        }

        let name = format!("ps{}", self.db.table(target).shared_columns().count() + 1);
        self.db.add_column(
            target,
            name,
            ColumnKind::SharedData,
            ColumnType::Any,
            PersistenceType::Physical,
        )
    }

    fn allocate_named_column(
        &mut self,
        class: ClassId,
        table: TableId,
        used: &HashSet<ColumnId>,
        name: &str,
        ty: ColumnType,
        tph: bool,
    ) -> Result<ColumnId> {
        let overflow = self.find_overflow_table(table);

        // Another class of the hierarchy may already have a matching column
        for candidate in std::iter::once(table).chain(overflow) {
            let reusable = self
                .db
                .find_column(candidate, name)
                .filter(|column| {
                    column.kind == ColumnKind::Data && column.ty == ty && !used.contains(&column.id)
                })
                .map(|column| column.id);

            if let Some(column) = reusable {
                if candidate != table {
                    self.set_overflow_table(class, table)?;
                }
                return Ok(column);
            }
        }

        let target = if !self.is_full(table) {
            table
        } else if tph {
            let overflow = self.set_overflow_table(class, table)?;
            if self.is_full(overflow) {
                return Err(Error::invalid_schema(format!(
                    "table `{}` has no room for another column",
                    self.db.table(overflow).name
                )));
            }
            overflow
        } else {
            return Err(Error::invalid_schema(format!(
                "table `{}` cannot hold more than {} columns",
                self.db.table(table).name,
                self.builder.max_columns_per_table
            )));
        };

        let name = self.unique_column_name(target, name);
        self.db
            .add_column(target, name, ColumnKind::Data, ty, PersistenceType::Physical)
    }

    /// Adds a column without storage, named after `name` and made unique
    /// within the table.
    pub(super) fn add_virtual_column(&mut self, table: TableId, name: &str) -> Result<ColumnId> {
        let name = self.unique_column_name(table, name);
        self.db.add_column(
            table,
            name,
            ColumnKind::Data,
            ColumnType::Integer,
            PersistenceType::Virtual,
        )
    }

    fn unique_column_name(&self, table: TableId, name: &str) -> String {
        let table = self.db.table(table);
        if table.find_column(name).is_none() {
            return name.to_string();
        }

        (1..)
            .map(|n| format!("{name}_{n}"))
            .find(|candidate| table.find_column(candidate).is_none())
            .unwrap_or_else(|| name.to_string())
    }

    fn is_full(&self, table: TableId) -> bool {
        self.db.table(table).physical_columns().count() >= self.builder.max_columns_per_table
    }

    fn find_overflow_table(&self, parent: TableId) -> Option<TableId> {
        self.db
            .tables
            .iter()
            .find(|table| table.ty == TableType::Overflow && table.parent == Some(parent))
            .map(|table| table.id)
    }

    /// Every column any property map of the class points at
    fn columns_used_by(&self, class: ClassId) -> HashSet<ColumnId> {
        let mut visitor = GetColumnsVisitor::new(&self.db);
        for map in self.mapping.class_map(class).property_maps.iter() {
            visitor.visit_property_map(map);
        }
        visitor.into_columns().into_iter().collect()
    }

    /// Makes `class` span the overflow table of `parent`, creating it if
    /// needed, and returns it.
    ///
    /// Mapped subclasses that share `parent` are extended too, so that every
    /// class of the hierarchy keeps inserting and deleting overflow rows.
    pub(super) fn set_overflow_table(&mut self, class: ClassId, parent: TableId) -> Result<TableId> {
        let class_map = self.mapping.class_map(class);
        if !class_map.strategy.is_tph() {
            return Err(Error::internal(format!(
                "class {class} is not mapped to a table per hierarchy"
            )));
        }

        if let Some(table) = class_map.overflow_table(&self.db, parent) {
            return Ok(table);
        }

        let table = match self.find_overflow_table(parent) {
            Some(table) => table,
            None => {
                let name = format!("{}_Overflow", self.db.table(parent).name);
                log::debug!("creating overflow table `{name}`");

                let table = self.db.create_table(name, TableType::Overflow)?;
                let exclusive_root = self.db.table(parent).exclusive_root_class;
                let overflow = self.db.table_mut(table);
                overflow.parent = Some(parent);
                overflow.exclusive_root_class = exclusive_root;

                self.add_system_columns(table, true)?;
                self.link_to_parent(table, parent)?;
                table
            }
        };

        let instance_id = self.db.find_first(table, ColumnKind::ECInstanceId).map(|c| c.id);
        let class_id = self.db.find_first(table, ColumnKind::ECClassId).map(|c| c.id);

        let db = &self.db;
        let class_map = self
            .mapping
            .get_mut(class)
            .ok_or_else(|| Error::internal("class map disappeared"))?;
        class_map.add_table(db, table);

        for (property, column) in [
            (SystemProperty::ECInstanceId, instance_id),
            (SystemProperty::ECClassId, class_id),
        ] {
            if let (Some(map), Some(column)) = (class_map.property_maps.system_mut(property), column) {
                if !map.columns.contains(&column) {
                    map.columns.push(column);
                }
            }
        }

        self.mark_modified(class);

        let app = self.app;
        let derived: Vec<ClassId> = app
            .derived_classes(class)
            .map(|derived| derived.id)
            .filter(|derived| {
                self.mapping
                    .get(*derived)
                    .is_some_and(|map| map.strategy.is_tph() && map.tables.contains(&parent))
            })
            .collect();

        for derived in derived {
            self.set_overflow_table(derived, parent)?;
        }

        Ok(table)
    }
}
