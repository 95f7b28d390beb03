use super::{ColumnType, TableId};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Uniquely identifies the column in the schema.
    pub id: ColumnId,

    /// The name of the column in the database.
    pub name: String,

    pub kind: ColumnKind,

    /// Virtual columns have no storage. They exist so that property maps
    /// can always point at a column.
    pub persistence: PersistenceType,

    pub ty: ColumnType,

    pub not_null: bool,

    pub unique: bool,

    /// True for the table's `ECInstanceId` column
    pub primary_key: bool,

    /// SQL expression used as the column default
    pub default_expr: Option<String>,

    pub collation: Option<Collation>,
}

#[derive(PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnId {
    pub table: TableId,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    ECInstanceId,
    ECClassId,
    Data,
    /// A generic column that different classes of a hierarchy use for
    /// different properties
    SharedData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PersistenceType {
    Physical,
    Virtual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Collation {
    Binary,
    NoCase,
    RTrim,
}

impl Column {
    pub fn is_virtual(&self) -> bool {
        self.persistence == PersistenceType::Virtual
    }

    pub fn is_shared(&self) -> bool {
        self.kind == ColumnKind::SharedData
    }
}

impl Collation {
    pub fn as_sql(self) -> &'static str {
        match self {
            Collation::Binary => "BINARY",
            Collation::NoCase => "NOCASE",
            Collation::RTrim => "RTRIM",
        }
    }
}

impl From<&Column> for ColumnId {
    fn from(value: &Column) -> Self {
        value.id
    }
}

impl fmt::Debug for ColumnId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "ColumnId({}/{})", self.table.0, self.index)
    }
}
