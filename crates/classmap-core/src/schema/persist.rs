//! Mapping metadata stored next to the data.
//!
//! Three tables hold everything needed to reopen a database without
//! remapping it:
//!
//! * `ec_Table`: one row per table, the definition serialized as JSON
//! * `ec_ClassMap`: the map strategy of every mapped class
//! * `ec_PropertyMap`: one row per column binding, ordered per class
//!
//! Converting between a [`Schema`](super::Schema) and [`Records`] is pure;
//! [`save`] and [`load`] move the records through a
//! [`Connection`](crate::Connection).

mod load;
pub use load::load;

mod records;
pub use records::{ClassMapRecord, PropertyMapRecord, Records, TableRecord};

mod save;
pub use save::{ensure_metadata_tables, save};

/// DDL for the metadata tables
pub const METADATA_DDL: &str = "\
CREATE TABLE IF NOT EXISTS [ec_Table] ([Id] INTEGER PRIMARY KEY, [Name] TEXT NOT NULL UNIQUE COLLATE NOCASE, [Definition] TEXT NOT NULL);
CREATE TABLE IF NOT EXISTS [ec_ClassMap] ([ClassId] INTEGER PRIMARY KEY, [MapStrategy] TEXT NOT NULL);
CREATE TABLE IF NOT EXISTS [ec_PropertyMap] ([ClassId] INTEGER NOT NULL, [Ordinal] INTEGER NOT NULL, [AccessString] TEXT NOT NULL, [TableName] TEXT NOT NULL, [ColumnName] TEXT NOT NULL, PRIMARY KEY ([ClassId], [Ordinal]));";
