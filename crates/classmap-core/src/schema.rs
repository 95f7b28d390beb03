pub mod app;

mod builder;
pub use builder::Builder;

pub mod db;

pub mod mapping;
use mapping::{ClassMap, Mapping};

pub mod persist;

use app::ClassId;
use db::{Table, TableId};

/// A class graph together with its table layout.
#[derive(Debug, Clone)]
pub struct Schema {
    /// The class graph
    pub app: app::Schema,

    /// Tables and columns
    pub db: db::Schema,

    /// Maps classes onto tables
    pub mapping: Mapping,
}

impl Schema {
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Returns the class map of a class.
    ///
    /// # Panics
    ///
    /// Panics if the class is not mapped.
    pub fn class_map(&self, id: impl Into<ClassId>) -> &ClassMap {
        self.mapping.class_map(id)
    }

    pub fn class_map_by_name(&self, name: &str) -> Option<&ClassMap> {
        let class = self.app.class_by_name(name)?;
        self.mapping.get(class.id)
    }

    pub fn table(&self, id: impl Into<TableId>) -> &Table {
        self.db.table(id)
    }

    /// Classes whose rows live in `table`
    pub fn classes_in_table(&self, table: TableId) -> impl Iterator<Item = ClassId> + '_ {
        self.mapping
            .classes
            .values()
            .filter(move |class_map| {
                !class_map.strategy.is_end_table_relationship()
                    && class_map.tables.contains(&table)
            })
            .map(|class_map| class_map.class)
    }
}
