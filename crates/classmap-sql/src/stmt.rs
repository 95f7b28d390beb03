//! Native SQL statement trees.
//!
//! Everything here is already resolved against the table layout: tables and
//! columns are referenced by name (or by id for DDL, resolved through the
//! serializer's schema). The [`Serializer`](crate::Serializer) turns a tree
//! into SQL text.

mod add_column;
pub use add_column::AddColumn;

mod column_def;
pub use column_def::ColumnDef;

mod create_index;
pub use create_index::CreateIndex;

mod create_table;
pub use create_table::CreateTable;

mod create_trigger;
pub use create_trigger::CreateTrigger;

mod delete;
pub use delete::Delete;

mod expr;
pub use expr::{ColumnRef, Expr};

mod insert;
pub use insert::{Insert, InsertSelect};

mod select;
pub use select::{Cte, Join, Select, SelectColumn, Source};

mod update;
pub use update::Update;

pub use classmap_core::stmt::{BinaryOp, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    AddColumn(AddColumn),
    CreateIndex(CreateIndex),
    CreateTable(CreateTable),
    CreateTrigger(CreateTrigger),
    Delete(Delete),
    Insert(Insert),
    InsertSelect(InsertSelect),
    Select(Box<Select>),
    Update(Update),
}

impl Statement {
    pub fn is_select(&self) -> bool {
        matches!(self, Statement::Select(_))
    }

    pub fn is_ddl(&self) -> bool {
        matches!(
            self,
            Statement::AddColumn(_)
                | Statement::CreateIndex(_)
                | Statement::CreateTable(_)
                | Statement::CreateTrigger(_)
        )
    }
}
