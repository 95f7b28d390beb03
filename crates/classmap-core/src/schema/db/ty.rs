use crate::schema::app::PrimitiveType;
use serde::{Deserialize, Serialize};

/// Storage type of a column as it appears in `CREATE TABLE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    /// No declared type. Shared columns use this since they hold values of
    /// different properties.
    Any,
    Blob,
    Boolean,
    /// Julian day number
    DateTime,
    Double,
    Integer,
    Text,
}

impl ColumnType {
    /// Storage type for a single-valued primitive property. Points are
    /// stored as one `Double` column per coordinate.
    pub fn from_primitive(ty: PrimitiveType) -> ColumnType {
        match ty {
            PrimitiveType::Binary => ColumnType::Blob,
            PrimitiveType::Boolean => ColumnType::Boolean,
            PrimitiveType::DateTime => ColumnType::DateTime,
            PrimitiveType::Double | PrimitiveType::Point2d | PrimitiveType::Point3d => {
                ColumnType::Double
            }
            PrimitiveType::Integer | PrimitiveType::Long => ColumnType::Integer,
            PrimitiveType::String => ColumnType::Text,
        }
    }

    /// The declared type used in DDL. `None` for untyped columns.
    pub fn as_sql(self) -> Option<&'static str> {
        match self {
            ColumnType::Any => None,
            ColumnType::Blob => Some("BLOB"),
            ColumnType::Boolean => Some("BOOLEAN"),
            ColumnType::DateTime => Some("TIMESTAMP"),
            ColumnType::Double => Some("REAL"),
            ColumnType::Integer => Some("INTEGER"),
            ColumnType::Text => Some("TEXT"),
        }
    }
}
