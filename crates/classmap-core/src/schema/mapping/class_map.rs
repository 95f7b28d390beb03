use super::{MapStrategy, PropertyMap, PropertyMaps, SystemProperty};
use crate::schema::{
    app::ClassId,
    db::{self, TableId, TableType},
};

/// How one class is laid out in the database.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMap {
    pub class: ClassId,

    pub strategy: MapStrategy,

    /// Tables the class spans. The primary table comes first, followed by the
    /// joined table and the overflow tables. End-table relationships list the
    /// tables holding their foreign key instead.
    pub tables: Vec<TableId>,

    pub property_maps: PropertyMaps,

    pub state: ClassMapState,

    /// Properties of the class that had no persisted mapping when the map was
    /// loaded. They are mapped on the next schema update.
    pub failed_to_load_properties: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassMapState {
    /// Mapped during the current import and never saved
    New,

    /// Identical to what is stored in the metadata tables
    Persisted,

    /// Persisted once, then changed by a schema update
    Modified,
}

impl ClassMap {
    pub fn new(class: ClassId, strategy: MapStrategy) -> ClassMap {
        ClassMap {
            class,
            strategy,
            tables: vec![],
            property_maps: PropertyMaps::new(),
            state: ClassMapState::New,
            failed_to_load_properties: vec![],
        }
    }

    pub fn property_maps(&self) -> &PropertyMaps {
        &self.property_maps
    }

    pub fn primary_table(&self) -> Option<TableId> {
        self.tables.first().copied()
    }

    /// The table holding the class's own properties: its joined table if it
    /// has one, the primary table otherwise.
    pub fn data_table(&self, db: &db::Schema) -> Option<TableId> {
        self.table_of_type(db, TableType::Joined)
            .or_else(|| self.primary_table())
    }

    pub fn joined_table(&self, db: &db::Schema) -> Option<TableId> {
        self.table_of_type(db, TableType::Joined)
    }

    /// The overflow table extending `parent`, if the class has one
    pub fn overflow_table(&self, db: &db::Schema, parent: TableId) -> Option<TableId> {
        self.tables.iter().copied().find(|id| {
            let table = db.table(*id);
            table.ty == TableType::Overflow && table.parent == Some(parent)
        })
    }

    fn table_of_type(&self, db: &db::Schema, ty: TableType) -> Option<TableId> {
        self.tables
            .iter()
            .copied()
            .find(|id| db.table(*id).ty == ty)
    }

    /// Adds a table, keeping primary, joined and overflow tables in that
    /// order.
    pub fn add_table(&mut self, db: &db::Schema, table: TableId) {
        if self.tables.contains(&table) {
            return;
        }

        fn rank(ty: TableType) -> u8 {
            match ty {
                TableType::Primary | TableType::Existing | TableType::Virtual => 0,
                TableType::Joined => 1,
                TableType::Overflow => 2,
            }
        }

        let new_rank = rank(db.table(table).ty);
        let position = self
            .tables
            .iter()
            .position(|id| rank(db.table(*id).ty) > new_rank)
            .unwrap_or(self.tables.len());
        self.tables.insert(position, table);
    }

    pub fn system(&self, property: SystemProperty) -> Option<&super::SystemPropertyMap> {
        self.property_maps.system(property)
    }

    pub fn find(&self, access_string: &str) -> Option<&PropertyMap> {
        self.property_maps.find(access_string)
    }

    pub fn is_persisted(&self) -> bool {
        self.state != ClassMapState::New
    }

    /// Records that a persisted map changed and must be saved again.
    pub fn mark_modified(&mut self) {
        if self.state == ClassMapState::Persisted {
            self.state = ClassMapState::Modified;
        }
    }
}
