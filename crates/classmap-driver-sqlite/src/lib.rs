mod value;
pub(crate) use value::Value;

use classmap_core::{driver::Row, stmt, Error, Result};
use rusqlite::{Connection as RusqliteConnection, OptionalExtension};
use std::{
    borrow::Cow,
    path::{Path, PathBuf},
};
use url::Url;

/// Where a SQLite database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sqlite {
    File(PathBuf),
    InMemory,
}

impl Sqlite {
    /// Parses a connection URL: `sqlite::memory:` or `sqlite:<path>`
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url_str = url.into();
        let url = Url::parse(&url_str)
            .map_err(|e| Error::invalid_connection_url(format!("{e}; url={url_str}")))?;

        if url.scheme() != "sqlite" {
            return Err(Error::invalid_connection_url(format!(
                "connection URL does not have a `sqlite` scheme; url={url_str}"
            )));
        }

        if url.path().is_empty() {
            return Err(Error::invalid_connection_url(format!(
                "connection URL has no database path; url={url_str}"
            )));
        }

        if url.path() == ":memory:" {
            Ok(Self::InMemory)
        } else {
            Ok(Self::File(PathBuf::from(url.path())))
        }
    }

    pub fn in_memory() -> Self {
        Self::InMemory
    }

    /// A database file at the given path, created on first connect
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self::File(path.as_ref().to_path_buf())
    }

    pub fn url(&self) -> Cow<'_, str> {
        match self {
            Sqlite::InMemory => Cow::Borrowed("sqlite::memory:"),
            Sqlite::File(path) => Cow::Owned(format!("sqlite:{}", path.display())),
        }
    }

    pub fn connect(&self) -> Result<Connection> {
        match self {
            Sqlite::File(path) => Connection::open(path),
            Sqlite::InMemory => Connection::in_memory(),
        }
    }
}

#[derive(Debug)]
pub struct Connection {
    connection: RusqliteConnection,
}

impl Connection {
    pub fn in_memory() -> Result<Self> {
        let connection = RusqliteConnection::open_in_memory().map_err(Error::storage)?;
        Self::init(connection)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let connection = RusqliteConnection::open(path).map_err(Error::storage)?;
        Self::init(connection)
    }

    /// Joined and overflow rows rely on cascading foreign keys, which SQLite
    /// only enforces when asked to.
    fn init(connection: RusqliteConnection) -> Result<Self> {
        connection
            .execute_batch("PRAGMA foreign_keys = ON")
            .map_err(Error::storage)?;
        Ok(Self { connection })
    }
}

impl classmap_core::Connection for Connection {
    fn exec(&mut self, sql: &str, params: &[stmt::Value]) -> Result<u64> {
        log::trace!("exec: {sql}; params={params:?}");

        let mut stmt = self.connection.prepare_cached(sql).map_err(Error::storage)?;
        let params = params.iter().cloned().map(Value::from).collect::<Vec<_>>();

        let count = stmt
            .execute(rusqlite::params_from_iter(params.iter()))
            .map_err(Error::storage)?;

        Ok(count as u64)
    }

    fn query(&mut self, sql: &str, params: &[stmt::Value]) -> Result<Vec<Row>> {
        log::trace!("query: {sql}; params={params:?}");

        let mut stmt = self.connection.prepare_cached(sql).map_err(Error::storage)?;
        let width = stmt.column_count();
        let params = params.iter().cloned().map(Value::from).collect::<Vec<_>>();

        let mut rows = stmt
            .query(rusqlite::params_from_iter(params.iter()))
            .map_err(Error::storage)?;

        let mut ret = vec![];
        while let Some(row) = rows.next().map_err(Error::storage)? {
            let mut items = Vec::with_capacity(width);
            for index in 0..width {
                items.push(Value::from_sql(row, index)?.into_inner());
            }
            ret.push(items);
        }

        Ok(ret)
    }

    fn execute_batch(&mut self, sql: &str) -> Result<()> {
        log::trace!("batch: {sql}");
        self.connection.execute_batch(sql).map_err(Error::storage)
    }

    fn last_insert_id(&self) -> i64 {
        self.connection.last_insert_rowid()
    }

    fn table_exists(&mut self, name: &str) -> Result<bool> {
        let found: Option<i64> = self
            .connection
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
                [name],
                |row| row.get(0),
            )
            .optional()
            .map_err(Error::storage)?;

        Ok(found.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classmap_core::Connection as _;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_urls() {
        assert_eq!(Sqlite::new("sqlite::memory:").unwrap(), Sqlite::InMemory);
        assert_eq!(
            Sqlite::new("sqlite:/tmp/db.sqlite").unwrap(),
            Sqlite::File(PathBuf::from("/tmp/db.sqlite"))
        );
        assert_eq!(Sqlite::InMemory.url(), "sqlite::memory:");

        assert!(Sqlite::new("postgres://localhost/db")
            .unwrap_err()
            .is_invalid_connection_url());
        assert!(Sqlite::new("not a url").unwrap_err().is_invalid_connection_url());
    }

    #[test]
    fn exec_and_query() {
        let mut conn = Sqlite::in_memory().connect().unwrap();
        conn.execute_batch("CREATE TABLE [T] ([Id] INTEGER PRIMARY KEY, [Name] TEXT, [Score] REAL, [Data] BLOB)")
            .unwrap();

        let count = conn
            .exec(
                "INSERT INTO [T] ([Name], [Score], [Data]) VALUES (?1, ?2, ?3)",
                &[
                    stmt::Value::from("a"),
                    stmt::Value::F64(1.5),
                    stmt::Value::Bytes(vec![1, 2]),
                ],
            )
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(conn.last_insert_id(), 1);

        let rows = conn
            .query("SELECT [Id], [Name], [Score], [Data], NULL FROM [T]", &[])
            .unwrap();
        assert_eq!(
            rows,
            [vec![
                stmt::Value::I64(1),
                stmt::Value::from("a"),
                stmt::Value::F64(1.5),
                stmt::Value::Bytes(vec![1, 2]),
                stmt::Value::Null,
            ]]
        );

        assert!(conn.table_exists("t").unwrap());
        assert!(!conn.table_exists("missing").unwrap());
    }

    #[test]
    fn engine_failures_are_storage_errors() {
        let mut conn = Sqlite::in_memory().connect().unwrap();
        let err = conn.exec("INSERT INTO [Missing] DEFAULT VALUES", &[]).unwrap_err();
        assert!(err.is_storage());
    }

    #[test]
    fn transactions_roll_back() {
        let mut conn = Sqlite::in_memory().connect().unwrap();
        conn.execute_batch("CREATE TABLE [T] ([Id] INTEGER PRIMARY KEY)").unwrap();

        conn.begin().unwrap();
        conn.exec("INSERT INTO [T] DEFAULT VALUES", &[]).unwrap();
        conn.rollback().unwrap();

        assert!(conn.query("SELECT * FROM [T]", &[]).unwrap().is_empty());
    }
}
