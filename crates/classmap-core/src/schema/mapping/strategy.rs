use crate::schema::app::{ClassId, RelationshipEnd};
use serde::{Deserialize, Serialize};

/// Physical layout chosen for a class.
///
/// The strategy is fixed once the class map has been persisted. Remapping a
/// class with a different strategy is a schema error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MapStrategy {
    NotMapped,
    OwnTable,
    TablePerHierarchy(TphInfo),
    ExistingTable,

    /// Relationship stored as a foreign key in the table of its source end
    ForeignKeyRelationshipInSourceTable,

    /// Relationship stored as a foreign key in the table of its target end
    ForeignKeyRelationshipInTargetTable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TphInfo {
    /// Class at the top of the hierarchy sharing the table
    pub root: ClassId,

    pub joined_table: JoinedTableInfo,

    /// Data properties go into generic shared columns
    pub share_columns: bool,

    pub max_shared_columns_before_overflow: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinedTableInfo {
    None,

    /// The class's direct subclasses each get a joined table
    ParentOfJoinedTable,

    /// The class stores its own properties in a joined table
    JoinedTable,
}

impl MapStrategy {
    pub fn is_not_mapped(&self) -> bool {
        matches!(self, MapStrategy::NotMapped)
    }

    pub fn is_tph(&self) -> bool {
        matches!(self, MapStrategy::TablePerHierarchy(_))
    }

    pub fn tph(&self) -> Option<&TphInfo> {
        match self {
            MapStrategy::TablePerHierarchy(tph) => Some(tph),
            _ => None,
        }
    }

    /// The relationship end whose table holds the foreign key, for
    /// relationships mapped as end-table relationships.
    pub fn foreign_key_end(&self) -> Option<RelationshipEnd> {
        match self {
            MapStrategy::ForeignKeyRelationshipInSourceTable => Some(RelationshipEnd::Source),
            MapStrategy::ForeignKeyRelationshipInTargetTable => Some(RelationshipEnd::Target),
            _ => None,
        }
    }

    pub fn is_end_table_relationship(&self) -> bool {
        self.foreign_key_end().is_some()
    }

    pub fn name(&self) -> &'static str {
        match self {
            MapStrategy::NotMapped => "NotMapped",
            MapStrategy::OwnTable => "OwnTable",
            MapStrategy::TablePerHierarchy(_) => "TablePerHierarchy",
            MapStrategy::ExistingTable => "ExistingTable",
            MapStrategy::ForeignKeyRelationshipInSourceTable => {
                "ForeignKeyRelationshipInSourceTable"
            }
            MapStrategy::ForeignKeyRelationshipInTargetTable => {
                "ForeignKeyRelationshipInTargetTable"
            }
        }
    }
}
