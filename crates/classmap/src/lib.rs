pub mod db;
pub use db::Db;

mod statement;
pub use statement::{ExecuteResult, Row, Statement};

pub use classmap_core::{
    bail, driver, err,
    schema::{self, app},
    stmt::{self, Value},
    Connection, Error, Result, Schema,
};
