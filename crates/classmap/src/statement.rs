use crate::{Db, Error, Result, Value};

use classmap_core::{driver, schema::app::ClassId, Connection};
use classmap_sql::{param, prepare::StatementKind, NativeStatement, PreparedStatement};
use indexmap::IndexMap;

use std::sync::Arc;

/// A prepared ECSQL statement bound to a database.
///
/// Parameters are numbered from 1. Every parameter starts out null and
/// keeps its value across executions until it is bound again or
/// [`clear_bindings`](Statement::clear_bindings) is called.
pub struct Statement<'a> {
    db: &'a mut Db,

    prepared: PreparedStatement,

    /// Values bound to the ECSQL parameters
    bindings: Vec<Value>,

    /// Names of the result columns, shared by every row
    names: Arc<[Option<String>]>,

    /// Native rows of a SELECT being stepped through
    rows: Option<std::vec::IntoIter<driver::Row>>,
}

/// Outcome of a statement that does not return rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecuteResult {
    /// Instances inserted, updated or deleted
    pub rows_affected: u64,

    /// Id of the instance an INSERT created
    pub instance_id: Option<i64>,
}

/// A result row of a SELECT, one value per selected property or
/// expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    names: Arc<[Option<String>]>,
    values: Vec<Value>,
}

impl<'a> Statement<'a> {
    pub(crate) fn new(db: &'a mut Db, prepared: PreparedStatement) -> Statement<'a> {
        let bindings = vec![Value::Null; prepared.params.len()];
        let names = prepared
            .columns
            .iter()
            .map(|column| column.name.clone())
            .collect();

        Statement {
            db,
            prepared,
            bindings,
            names,
            rows: None,
        }
    }

    pub fn prepared(&self) -> &PreparedStatement {
        &self.prepared
    }

    /// Number of ECSQL parameters
    pub fn param_count(&self) -> usize {
        self.bindings.len()
    }

    /// 1-based index of a `:name` parameter
    pub fn param_index(&self, name: &str) -> Result<usize> {
        self.prepared
            .param_index(name)
            .ok_or_else(|| Error::invalid_binding(format!("no parameter named `:{name}`")))
    }

    /// Binds a value to the parameter at `index` (1-based).
    pub fn bind(&mut self, index: usize, value: impl Into<Value>) -> Result<&mut Self> {
        let count = self.bindings.len();
        let Some(slot) = index.checked_sub(1).and_then(|i| self.bindings.get_mut(i)) else {
            return Err(Error::invalid_binding(format!(
                "parameter index {index} is out of range; the statement has {count} parameters"
            )));
        };

        *slot = value.into();
        Ok(self)
    }

    /// Binds a value to a named parameter.
    pub fn bind_named(&mut self, name: &str, value: impl Into<Value>) -> Result<&mut Self> {
        let index = self.param_index(name)?;
        self.bind(index, value)
    }

    pub fn bind_null(&mut self, index: usize) -> Result<&mut Self> {
        self.bind(index, Value::Null)
    }

    pub fn bind_bool(&mut self, index: usize, value: bool) -> Result<&mut Self> {
        self.bind(index, value)
    }

    pub fn bind_i64(&mut self, index: usize, value: i64) -> Result<&mut Self> {
        self.bind(index, value)
    }

    pub fn bind_f64(&mut self, index: usize, value: f64) -> Result<&mut Self> {
        self.bind(index, value)
    }

    pub fn bind_text(&mut self, index: usize, value: impl Into<String>) -> Result<&mut Self> {
        self.bind(index, Value::String(value.into()))
    }

    pub fn bind_blob(&mut self, index: usize, value: impl Into<Vec<u8>>) -> Result<&mut Self> {
        self.bind(index, Value::Bytes(value.into()))
    }

    /// Binds a date time given as a julian day number.
    pub fn bind_datetime(&mut self, index: usize, julian_day: f64) -> Result<&mut Self> {
        self.bind(index, Value::DateTime(julian_day))
    }

    pub fn bind_point2d(&mut self, index: usize, x: f64, y: f64) -> Result<&mut Self> {
        self.bind(index, Value::Point2d { x, y })
    }

    pub fn bind_point3d(&mut self, index: usize, x: f64, y: f64, z: f64) -> Result<&mut Self> {
        self.bind(index, Value::Point3d { x, y, z })
    }

    /// Binds the instance a navigation property points at. Without a
    /// relationship class the navigation column's class id is left null.
    pub fn bind_navigation(
        &mut self,
        index: usize,
        id: i64,
        relationship: Option<ClassId>,
    ) -> Result<&mut Self> {
        self.bind(
            index,
            Value::Navigation {
                id,
                rel_class_id: relationship.map(|class| class.0 as i64),
            },
        )
    }

    /// Binds a struct value. Members that are not given are bound null.
    pub fn bind_struct(&mut self, index: usize, members: IndexMap<String, Value>) -> Result<&mut Self> {
        self.bind(index, Value::Struct(members))
    }

    pub fn bind_array(&mut self, index: usize, items: Vec<Value>) -> Result<&mut Self> {
        self.bind(index, Value::Array(items))
    }

    pub fn clear_bindings(&mut self) {
        for binding in &mut self.bindings {
            *binding = Value::Null;
        }
    }

    /// Discards the rows of a SELECT so the next [`step`](Statement::step)
    /// runs the query again.
    pub fn reset(&mut self) {
        self.rows = None;
    }

    /// Returns the next row of a SELECT. The query runs on the first step.
    pub fn step(&mut self) -> Result<Option<Row>> {
        if self.prepared.kind != StatementKind::Select {
            return Err(Error::invalid_binding(
                "only SELECT statements return rows; use `execute`",
            ));
        }

        if self.rows.is_none() {
            check_bindings(&self.prepared, &self.bindings)?;

            let [native] = &self.prepared.statements[..] else {
                return Err(Error::internal("SELECT must prepare to one native statement"));
            };

            let params = native_params(native, &self.bindings)?;
            let rows = self.db.connection().query(&native.sql, &params)?;
            self.rows = Some(rows.into_iter());
        }

        let Some(native) = self.rows.as_mut().and_then(Iterator::next) else {
            return Ok(None);
        };

        self.assemble(native).map(Some)
    }

    /// Runs the query and collects every row.
    pub fn query_all(&mut self) -> Result<Vec<Row>> {
        self.reset();

        let mut rows = vec![];
        while let Some(row) = self.step()? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Runs an INSERT, UPDATE or DELETE.
    ///
    /// The native statements run in one savepoint, so a write spanning
    /// several tables is applied completely or not at all.
    pub fn execute(&mut self) -> Result<ExecuteResult> {
        if self.prepared.kind == StatementKind::Select {
            return Err(Error::invalid_binding("SELECT statements are read with `step`"));
        }

        check_bindings(&self.prepared, &self.bindings)?;

        let kind = self.prepared.kind;
        let statements = &self.prepared.statements;
        let bindings = &self.bindings;

        let conn = self.db.connection();
        let result = savepoint(conn, |conn| {
            let mut rows_affected = 0;
            let mut instance_id = None;

            for (position, native) in statements.iter().enumerate() {
                let params = native_params(native, bindings)?;
                let count = conn.exec(&native.sql, &params)?;

                if kind == StatementKind::Insert && position == 0 {
                    instance_id = Some(conn.last_insert_id());
                }

                // Every native statement touches the same instances. The
                // engine reports a stale count for DDL.
                if !native.statement.is_ddl() {
                    rows_affected = rows_affected.max(count);
                }
            }

            Ok(ExecuteResult {
                rows_affected,
                instance_id,
            })
        })?;

        log::debug!(
            "{kind:?} affected {} rows over {} statements",
            result.rows_affected,
            statements.len()
        );
        Ok(result)
    }

    /// Rebuilds the property values of a native row.
    fn assemble(&self, native: driver::Row) -> Result<Row> {
        let width = self.prepared.native_width();
        if native.len() != width {
            return Err(Error::internal(format!(
                "query returned {} columns, expected {width}",
                native.len()
            )));
        }

        let mut native = native.into_iter();
        let mut values = Vec::with_capacity(self.prepared.columns.len());

        for column in &self.prepared.columns {
            let leaves = column
                .leaves
                .iter()
                .zip(&column.types)
                .map(|(path, ty)| (&path[..], param::coerce(native.next().unwrap_or_default(), *ty)))
                .collect();
            values.push(param::assemble(leaves)?);
        }

        Ok(Row {
            names: self.names.clone(),
            values,
        })
    }
}

impl std::fmt::Debug for Statement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Statement")
            .field("prepared", &self.prepared)
            .field("bindings", &self.bindings)
            .finish()
    }
}

/// Rejects struct values with members no native parameter reads.
fn check_bindings(prepared: &PreparedStatement, bindings: &[Value]) -> Result<()> {
    for (index, value) in bindings.iter().enumerate() {
        let param = index + 1;
        let paths: Vec<&[param::Accessor]> = prepared
            .statements
            .iter()
            .flat_map(|native| &native.params)
            .filter(|slot| slot.param == param)
            .map(|slot| &slot.path[..])
            .collect();

        param::check_members(value, &paths)
            .map_err(|err| err.context(Error::invalid_binding(format!("parameter {param}"))))?;
    }
    Ok(())
}

/// Native parameter values of one native statement
fn native_params(native: &NativeStatement, bindings: &[Value]) -> Result<Vec<Value>> {
    native
        .params
        .iter()
        .map(|slot| {
            let Some(value) = slot.param.checked_sub(1).and_then(|i| bindings.get(i)) else {
                return Err(Error::internal(format!(
                    "native parameter refers to missing parameter {}",
                    slot.param
                )));
            };

            slot.extract(value)
                .map_err(|err| err.context(Error::invalid_binding(format!("parameter {}", slot.param))))
        })
        .collect()
}

/// Runs `f` inside a savepoint, which nests within an open transaction.
fn savepoint<T>(
    conn: &mut dyn Connection,
    f: impl FnOnce(&mut dyn Connection) -> Result<T>,
) -> Result<T> {
    conn.execute_batch("SAVEPOINT [classmap_statement]")?;

    match f(conn) {
        Ok(value) => {
            conn.execute_batch("RELEASE [classmap_statement]")?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback) =
                conn.execute_batch("ROLLBACK TO [classmap_statement]; RELEASE [classmap_statement]")
            {
                log::warn!("rolling back statement failed: {rollback}");
            }
            Err(err)
        }
    }
}

impl Row {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of the column at `index` (0-based)
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Value of the column with the given property access string or alias
    pub fn get_named(&self, name: &str) -> Option<&Value> {
        let index = self.names.iter().position(|column| {
            column
                .as_deref()
                .is_some_and(|column| column.eq_ignore_ascii_case(name))
        })?;
        self.values.get(index)
    }

    pub fn names(&self) -> &[Option<String>] {
        &self.names
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}
