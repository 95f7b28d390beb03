use super::{ColumnDef, Statement};
use classmap_core::schema::db::{ForeignKey, Table};

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    /// Name of the table
    pub name: String,

    /// Column definitions. Virtual columns are never part of this list.
    pub columns: Vec<ColumnDef>,

    /// Table level `FOREIGN KEY` clauses
    pub foreign_keys: Vec<ForeignKey>,

    /// `CREATE TEMP TABLE IF NOT EXISTS`, for scratch tables living as long
    /// as the connection
    pub temporary: bool,
}

impl Statement {
    pub fn create_table(table: &Table) -> Self {
        CreateTable {
            name: table.name.clone(),
            columns: table.physical_columns().map(ColumnDef::from_schema).collect(),
            foreign_keys: table.foreign_keys.clone(),
            temporary: false,
        }
        .into()
    }
}

impl From<CreateTable> for Statement {
    fn from(value: CreateTable) -> Self {
        Self::CreateTable(value)
    }
}
