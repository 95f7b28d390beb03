use super::ColumnId;
use crate::schema::app::ForeignKeyAction;
use serde::{Deserialize, Serialize};

/// A single-column foreign key constraint. Stored on the table owning
/// `column`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub column: ColumnId,
    pub references: ColumnId,
    pub on_delete: Option<ForeignKeyAction>,
    pub on_update: Option<ForeignKeyAction>,
}
