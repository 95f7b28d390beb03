use classmap_core::schema::db::{Collation, Column, ColumnType};

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub ty: ColumnType,
    pub primary_key: bool,
    pub not_null: bool,
    pub unique: bool,
    /// SQL expression, written as `DEFAULT (<expr>)`
    pub default: Option<String>,
    pub collation: Option<Collation>,
}

impl ColumnDef {
    pub(crate) fn from_schema(column: &Column) -> ColumnDef {
        ColumnDef {
            name: column.name.clone(),
            ty: column.ty,
            primary_key: column.primary_key,
            not_null: column.not_null,
            unique: column.unique,
            default: column.default_expr.clone(),
            collation: column.collation,
        }
    }
}
