//! Turns ECSQL statements into native SQL against the mapped tables.
//!
//! Preparation resolves every class and property name through the mapping,
//! expands properties spanning several columns, and produces one native
//! statement per table a write touches. Values bound later go through the
//! [`ParamSlot`]s recorded on each native statement.

mod delete;
mod expr;
mod filter;
mod insert;
mod leaf;
mod params;
mod scope;
mod select;
mod update;
mod zip;
pub use zip::zip_filter_flatten;

use crate::{param::Accessor, stmt, ParamSlot, Serializer};
use classmap_core::{
    schema::{
        app::{ClassId, ClassKind},
        db::{ColumnKind, ColumnType, TableId, TableType},
        mapping::ClassMap,
    },
    stmt as ecsql, Error, Result, Schema,
};
use params::ParamRegistry;
use scope::Output;

/// An ECSQL statement ready to be executed.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedStatement {
    pub kind: StatementKind,

    /// Native statements, executed in order
    pub statements: Vec<NativeStatement>,

    /// ECSQL parameters. Parameter `n` is `params[n - 1]`.
    pub params: Vec<ParamInfo>,

    /// Result columns of a SELECT. Each spans one or more native columns, in
    /// order.
    pub columns: Vec<ResultColumn>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Insert,
    Update,
    Delete,
    Select,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NativeStatement {
    pub statement: stmt::Statement,

    pub sql: String,

    /// One slot per `?N` placeholder in `sql`, in order
    pub params: Vec<ParamSlot>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamInfo {
    /// Set for `:name` parameters
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultColumn {
    /// Property access string or column alias. Unset for unaliased
    /// expressions.
    pub name: Option<String>,

    /// Accessor path of each native column making up the value
    pub leaves: Vec<Vec<Accessor>>,

    /// Declared type of each native column, unknown for computed ones
    pub types: Vec<Option<ColumnType>>,
}

impl PreparedStatement {
    /// 1-based index of a named parameter
    pub fn param_index(&self, name: &str) -> Option<usize> {
        self.params
            .iter()
            .position(|param| {
                param
                    .name
                    .as_deref()
                    .is_some_and(|n| n.eq_ignore_ascii_case(name))
            })
            .map(|index| index + 1)
    }

    /// Number of native result columns
    pub fn native_width(&self) -> usize {
        self.columns.iter().map(|column| column.leaves.len()).sum()
    }
}

impl ResultColumn {
    fn from_output(output: &Output) -> ResultColumn {
        ResultColumn {
            name: output.name.clone(),
            leaves: output.leaves.iter().map(|leaf| leaf.path.clone()).collect(),
            types: output.leaves.iter().map(|leaf| leaf.ty).collect(),
        }
    }
}

/// Prepares an ECSQL statement against a mapped schema.
pub fn prepare(schema: &Schema, statement: &ecsql::Statement) -> Result<PreparedStatement> {
    let mut preparer = Preparer {
        schema,
        params: ParamRegistry::collect(statement),
        ctes: vec![],
    };

    let mut columns = vec![];
    let (kind, native) = match statement {
        ecsql::Statement::Insert(insert) => {
            (StatementKind::Insert, preparer.prepare_insert(insert)?)
        }
        ecsql::Statement::Update(update) => {
            (StatementKind::Update, preparer.prepare_update(update)?)
        }
        ecsql::Statement::Delete(delete) => {
            (StatementKind::Delete, preparer.prepare_delete(delete)?)
        }
        ecsql::Statement::Select(select) => {
            let (query, outputs) = preparer.prepare_select(select)?;
            columns = outputs.iter().map(ResultColumn::from_output).collect();
            (StatementKind::Select, vec![query.into()])
        }
    };

    let serializer = Serializer::sqlite(&schema.db);
    let statements = native
        .into_iter()
        .map(|statement| {
            let mut params = Vec::<ParamSlot>::new();
            let sql = serializer.serialize(&statement, &mut params);
            log::debug!("{}: {sql}", statement_name(kind));
            NativeStatement {
                statement,
                sql,
                params,
            }
        })
        .collect();

    Ok(PreparedStatement {
        kind,
        statements,
        params: preparer.params.into_params(),
        columns,
    })
}

fn statement_name(kind: StatementKind) -> &'static str {
    match kind {
        StatementKind::Insert => "INSERT",
        StatementKind::Update => "UPDATE",
        StatementKind::Delete => "DELETE",
        StatementKind::Select => "SELECT",
    }
}

struct Preparer<'a> {
    schema: &'a Schema,

    /// Numbers the ECSQL parameters of the statement being prepared
    params: ParamRegistry<'a>,

    /// CTEs in scope, innermost last
    ctes: Vec<(String, Vec<Output>)>,
}

impl<'a> Preparer<'a> {
    /// Resolves the class a statement targets.
    fn class_map(&self, class: &ecsql::ClassRef) -> Result<&'a ClassMap> {
        let schema = self.schema;

        let Some(app_class) = schema.app.class_by_name(&class.name) else {
            return Err(Error::invalid_ecsql(format!(
                "class `{}` does not exist",
                class.name
            )));
        };

        if matches!(app_class.kind, ClassKind::Struct) {
            return Err(Error::invalid_ecsql(format!(
                "`{}` is a struct class and cannot be used as a statement target",
                app_class.name
            )));
        }

        match schema.mapping.get(app_class.id) {
            Some(class_map) if !class_map.strategy.is_not_mapped() => Ok(class_map),
            _ => Err(Error::invalid_ecsql(format!(
                "class `{}` is not mapped",
                app_class.name
            ))),
        }
    }

    fn class_name(&self, class: ClassId) -> &'a str {
        &self.schema.app.class(class).name
    }

    /// Tables of the class that have storage, primary table first
    fn storage_tables(&self, class_map: &ClassMap) -> Vec<TableId> {
        class_map
            .tables
            .iter()
            .copied()
            .filter(|table| self.schema.db.table(*table).ty != TableType::Virtual)
            .collect()
    }

    /// Appends the `ECClassId` column and value to an INSERT into `table`,
    /// unless the table does not store class ids.
    fn prepare_class_id(
        &self,
        class: ClassId,
        table: TableId,
        columns: &mut Vec<String>,
        values: &mut Vec<stmt::Expr>,
    ) {
        let Some(column) = self.schema.db.find_first(table, ColumnKind::ECClassId) else {
            return;
        };

        if column.is_virtual() || columns.iter().any(|name| *name == column.name) {
            return;
        }

        columns.push(column.name.clone());
        values.push(class_id_literal(class));
    }
}

fn class_id_literal(class: ClassId) -> stmt::Expr {
    stmt::Expr::Value(stmt::Value::I64(class.0 as i64))
}
