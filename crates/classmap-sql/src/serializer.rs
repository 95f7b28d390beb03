#[macro_use]
mod fmt;
use fmt::ToSql;

mod delim;
use delim::{Comma, Delimited};

mod ident;
use ident::Ident;

mod params;
pub use params::{Params, Placeholder};

// Fragment serializers
mod column_def;
mod expr;
mod statement;
mod value;

use crate::stmt::Statement;

use classmap_core::schema::db;

/// Serialize a statement to a SQLite SQL string
#[derive(Debug)]
pub struct Serializer<'a> {
    /// Schema used to resolve the table and column ids DDL statements carry
    schema: &'a db::Schema,
}

struct Formatter<'a, T> {
    /// Handle to the serializer
    serializer: &'a Serializer<'a>,

    /// Where to write the serialized SQL
    dst: &'a mut String,

    /// Where to store parameters
    params: &'a mut T,
}

impl<'a> Serializer<'a> {
    pub fn sqlite(schema: &'a db::Schema) -> Self {
        Serializer { schema }
    }

    /// Serializes the statement, pushing a slot to `params` for each
    /// parameter placeholder written.
    pub fn serialize(&self, stmt: &Statement, params: &mut impl Params) -> String {
        let mut ret = String::new();

        let mut fmt = Formatter {
            serializer: self,
            dst: &mut ret,
            params,
        };

        stmt.to_sql(&mut fmt);

        ret.push(';');
        ret
    }

    fn table_name(&self, id: db::TableId) -> &str {
        &self.schema.table(id).name
    }

    fn column_name(&self, id: db::ColumnId) -> &str {
        &self.schema.column(id).name
    }
}
