//! The boundary to the storage engine.

use crate::{stmt::Value, Result};
use std::fmt::Debug;

/// A row returned by [`Connection::query`]
pub type Row = Vec<Value>;

/// A connection to the storage engine.
///
/// Parameters and row values only ever use the scalar [`Value`] variants.
/// Statements are executed synchronously; implementations wrap every engine
/// failure in [`Error::storage`](crate::Error::storage).
pub trait Connection: Debug + Send {
    /// Executes a statement and returns the number of rows it changed.
    fn exec(&mut self, sql: &str, params: &[Value]) -> Result<u64>;

    /// Runs a query and collects its rows.
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;

    /// Runs several statements separated by `;`, without parameters.
    fn execute_batch(&mut self, sql: &str) -> Result<()>;

    /// Row id generated by the most recent successful INSERT
    fn last_insert_id(&self) -> i64;

    fn begin(&mut self) -> Result<()> {
        self.execute_batch("BEGIN")
    }

    fn commit(&mut self) -> Result<()> {
        self.execute_batch("COMMIT")
    }

    fn rollback(&mut self) -> Result<()> {
        self.execute_batch("ROLLBACK")
    }

    /// True if a table with the given name exists
    fn table_exists(&mut self, name: &str) -> Result<bool>;
}
