use super::{ColumnDef, Statement};
use classmap_core::schema::db::{Column, ForeignKey, Table};

/// `ALTER TABLE ... ADD COLUMN`.
///
/// SQLite only accepts constant defaults and no `PRIMARY KEY`, `UNIQUE` or
/// `NOT NULL` constraints on added columns, so those are dropped from the
/// definition.
#[derive(Debug, Clone, PartialEq)]
pub struct AddColumn {
    pub table: String,
    pub column: ColumnDef,
    /// Inline `REFERENCES` clause
    pub references: Option<ForeignKey>,
}

impl Statement {
    pub fn add_column(table: &Table, column: &Column) -> Self {
        let mut def = ColumnDef::from_schema(column);
        def.primary_key = false;
        def.not_null = false;
        def.unique = false;
        def.default = None;

        AddColumn {
            table: table.name.clone(),
            column: def,
            references: table.foreign_key_for(column.id).cloned(),
        }
        .into()
    }
}

impl From<AddColumn> for Statement {
    fn from(value: AddColumn) -> Self {
        Self::AddColumn(value)
    }
}
