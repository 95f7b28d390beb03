mod builder;
mod connect;

pub use builder::Builder;
pub use connect::connect;

use crate::{stmt, Result, Statement};

use classmap_core::{
    schema::{self, app, db::SchemaDiff, persist},
    Connection, Schema,
};
use classmap_sql::MigrationStatement;

use std::sync::Arc;

/// A mapped database: the class graph, its table layout and the engine
/// connection holding both the data and the mapping metadata.
#[derive(Debug)]
pub struct Db {
    schema: Arc<Schema>,

    /// Mapping options, reused when the class graph is updated
    builder: schema::Builder,

    conn: Box<dyn Connection>,
}

impl Db {
    pub fn builder() -> Builder {
        Builder::default()
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn connection(&mut self) -> &mut dyn Connection {
        self.conn.as_mut()
    }

    /// Maps a new version of the class graph onto the database.
    ///
    /// Tables, columns, indexes and triggers the new version needs are
    /// created; nothing is ever dropped. Already mapped classes keep their
    /// layout. Either the whole update is applied or none of it.
    pub fn update_schema(&mut self, app: app::Schema) -> Result<()> {
        let previous = self.schema.clone();
        let builder = &self.builder;

        let next = transaction(self.conn.as_mut(), |conn| {
            let mut next = builder.update(app, (*previous).clone())?;
            migrate(conn, &previous.db, &mut next)?;
            Ok(next)
        })?;

        self.schema = Arc::new(next);
        Ok(())
    }

    /// Prepares an ECSQL statement against the current mapping.
    pub fn prepare(&mut self, statement: impl Into<stmt::Statement>) -> Result<Statement<'_>> {
        let prepared = classmap_sql::prepare(&self.schema, &statement.into())?;
        Ok(Statement::new(self, prepared))
    }

    /// Prepares and runs a statement without parameters.
    pub fn execute(
        &mut self,
        statement: impl Into<stmt::Statement>,
    ) -> Result<crate::ExecuteResult> {
        self.prepare(statement)?.execute()
    }
}

/// Opens a database over `conn`: loads the persisted mapping if there is
/// one, maps whatever the class graph adds, and writes the DDL and metadata.
pub(crate) fn open(
    builder: schema::Builder,
    mut conn: Box<dyn Connection>,
    app: app::Schema,
) -> Result<Db> {
    let schema = transaction(conn.as_mut(), |conn| {
        let (previous, mut next) = match persist::load(app.clone(), conn)? {
            Some(previous) => {
                log::debug!("reopening mapped database");
                let db = previous.db.clone();
                (db, builder.update(app, previous)?)
            }
            None => {
                log::debug!("mapping new database");
                (Default::default(), builder.build(app)?)
            }
        };

        migrate(conn, &previous, &mut next)?;
        Ok(next)
    })?;

    Ok(Db {
        schema: Arc::new(schema),
        builder,
        conn,
    })
}

/// Creates what `next` adds to `previous` and saves the mapping.
fn migrate(
    conn: &mut dyn Connection,
    previous: &schema::db::Schema,
    next: &mut Schema,
) -> Result<()> {
    let statements: Vec<String> = {
        let diff = SchemaDiff::from(previous, &next.db);
        MigrationStatement::from_diff(&diff)
            .iter()
            .map(MigrationStatement::to_sql)
            .collect()
    };

    for sql in &statements {
        log::debug!("migrate: {sql}");
        conn.execute_batch(sql)?;
    }

    persist::save(next, conn)
}

/// Runs `f` in a transaction, rolling back if it fails.
pub(crate) fn transaction<T>(
    conn: &mut dyn Connection,
    f: impl FnOnce(&mut dyn Connection) -> Result<T>,
) -> Result<T> {
    conn.begin()?;

    match f(conn) {
        Ok(value) => {
            conn.commit()?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback) = conn.rollback() {
                log::warn!("rollback failed: {rollback}");
            }
            Err(err)
        }
    }
}
