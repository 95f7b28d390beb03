use super::{Column, ColumnId, ColumnKind, ForeignKey, Index, Trigger};
use crate::schema::app::ClassId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A database table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Uniquely identifies a table
    pub id: TableId,

    /// Name of the table
    pub name: String,

    pub ty: TableType,

    /// Set when only one class (hierarchy) may ever use the table
    pub exclusive_root_class: Option<ClassId>,

    /// The table a joined or overflow table extends
    pub parent: Option<TableId>,

    /// The table's columns
    pub columns: Vec<Column>,

    pub foreign_keys: Vec<ForeignKey>,

    pub indexes: Vec<Index>,

    pub triggers: Vec<Trigger>,
}

/// Uniquely identifies a table
#[derive(PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableType {
    Primary,
    Joined,
    Overflow,
    /// Owned by someone else. Never created or altered.
    Existing,
    /// Has no storage at all
    Virtual,
}

impl Table {
    pub(crate) fn new(id: TableId, name: String, ty: TableType) -> Table {
        Table {
            id,
            name,
            ty,
            exclusive_root_class: None,
            parent: None,
            columns: vec![],
            foreign_keys: vec![],
            indexes: vec![],
            triggers: vec![],
        }
    }

    pub fn column(&self, id: impl Into<ColumnId>) -> &Column {
        let id = id.into();
        assert_eq!(id.table, self.id);
        &self.columns[id.index]
    }

    /// The first column of the given kind. Every mapped table has exactly one
    /// `ECInstanceId` and at most one `ECClassId` column.
    pub fn find_first(&self, kind: ColumnKind) -> Option<&Column> {
        self.columns.iter().find(|column| column.kind == kind)
    }

    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|column| column.name.eq_ignore_ascii_case(name))
    }

    pub fn physical_columns(&self) -> impl Iterator<Item = &Column> + '_ {
        self.columns.iter().filter(|column| !column.is_virtual())
    }

    pub fn shared_columns(&self) -> impl Iterator<Item = &Column> + '_ {
        self.columns.iter().filter(|column| column.is_shared())
    }

    /// True for tables this crate creates and alters
    pub fn is_owned(&self) -> bool {
        !matches!(self.ty, TableType::Existing | TableType::Virtual)
    }

    pub fn trigger(&self, name: &str) -> Option<&Trigger> {
        self.triggers.iter().find(|trigger| trigger.name == name)
    }

    pub fn foreign_key_for(&self, column: ColumnId) -> Option<&ForeignKey> {
        self.foreign_keys.iter().find(|fk| fk.column == column)
    }
}

impl fmt::Debug for TableId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "TableId({})", self.0)
    }
}

impl From<&Table> for TableId {
    fn from(value: &Table) -> Self {
        value.id
    }
}
