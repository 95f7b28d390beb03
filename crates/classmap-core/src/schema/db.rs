//! The Column/Table model: physical tables, columns and their constraints.
//!
//! Everything in here is structural. Tables and columns are created while
//! classes are mapped and only reach the engine once the enclosing import
//! diffs the schema and runs the generated DDL.

mod column;
pub use column::{Collation, Column, ColumnId, ColumnKind, PersistenceType};

mod diff;
pub use diff::{SchemaDiff, SchemaDiffItem};

mod foreign_key;
pub use foreign_key::ForeignKey;

mod index;
pub use index::Index;

mod schema;
pub use schema::Schema;

mod table;
pub use table::{Table, TableId, TableType};

mod trigger;
pub use trigger::{Trigger, TriggerTiming};

mod ty;
pub use ty::ColumnType;
