use super::Db;
use crate::Result;

use classmap_core::{
    schema::{self, app, app::MapHint},
    Connection,
};

/// Mapping options and the entry point for opening a database.
#[derive(Debug, Default)]
pub struct Builder {
    /// Schema builder
    core: schema::Builder,
}

impl Builder {
    /// Set the table name prefix for all tables
    pub fn table_name_prefix(&mut self, prefix: &str) -> &mut Self {
        self.core.table_name_prefix(prefix);
        self
    }

    pub fn max_columns_per_table(&mut self, max: usize) -> &mut Self {
        self.core.max_columns_per_table(max);
        self
    }

    /// Shared columns a hierarchy may use before spilling into an overflow
    /// table, unless its map hint says otherwise
    pub fn max_shared_columns_before_overflow(&mut self, max: usize) -> &mut Self {
        self.core.max_shared_columns_before_overflow(max);
        self
    }

    /// Strategy for classes without a map hint of their own
    pub fn default_map_hint(&mut self, hint: MapHint) -> &mut Self {
        self.core.default_map_hint(hint);
        self
    }

    /// Connects to the database at `url` and maps `app` onto it.
    pub fn connect(&self, url: &str, app: app::Schema) -> Result<Db> {
        self.open(super::connect(url)?, app)
    }

    /// Maps `app` onto the database behind an open connection.
    pub fn open(&self, conn: Box<dyn Connection>, app: app::Schema) -> Result<Db> {
        super::open(self.core.clone(), conn, app)
    }
}
