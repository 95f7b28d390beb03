use super::Statement;
use classmap_core::schema::db::{ColumnId, Index, Table, TableId};

#[derive(Debug, Clone, PartialEq)]
pub struct CreateIndex {
    /// Name of the index
    pub name: String,

    /// Which table to index
    pub on: TableId,

    /// The columns to index
    pub columns: Vec<ColumnId>,

    /// When true, the index is unique
    pub unique: bool,
}

impl Statement {
    pub fn create_index(table: &Table, index: &Index) -> Self {
        CreateIndex {
            name: index.name.clone(),
            on: table.id,
            columns: index.columns.clone(),
            unique: index.unique,
        }
        .into()
    }
}

impl From<CreateIndex> for Statement {
    fn from(value: CreateIndex) -> Self {
        Self::CreateIndex(value)
    }
}
