use super::{Comma, Formatter, Ident, Params, ToSql};

use crate::stmt::{self, Statement};
use classmap_core::schema::db::ForeignKey;

impl ToSql for &Statement {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        match self {
            Statement::AddColumn(stmt) => stmt.to_sql(f),
            Statement::CreateIndex(stmt) => stmt.to_sql(f),
            Statement::CreateTable(stmt) => stmt.to_sql(f),
            Statement::CreateTrigger(stmt) => stmt.to_sql(f),
            Statement::Delete(stmt) => stmt.to_sql(f),
            Statement::Insert(stmt) => stmt.to_sql(f),
            Statement::InsertSelect(stmt) => stmt.to_sql(f),
            Statement::Select(stmt) => (&**stmt).to_sql(f),
            Statement::Update(stmt) => stmt.to_sql(f),
        }
    }
}

impl ToSql for &stmt::CreateTable {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        let serializer = f.serializer;
        if self.temporary {
            fmt!(f, "CREATE TEMP TABLE IF NOT EXISTS " Ident(&self.name) " (");
        } else {
            fmt!(f, "CREATE TABLE " Ident(&self.name) " (");
        }

        let mut s = "\n    ";
        for column in &self.columns {
            fmt!(f, s column);
            s = ",\n    ";
        }

        for foreign_key in &self.foreign_keys {
            let column = serializer.column_name(foreign_key.column);
            fmt!(f, s "FOREIGN KEY (" Ident(column) ")" References(foreign_key));
        }

        fmt!(f, "\n)");
    }
}

impl ToSql for &stmt::AddColumn {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        let column = &self.column;
        fmt!(f, "ALTER TABLE " Ident(&self.table) " ADD COLUMN " column);

        if let Some(foreign_key) = &self.references {
            fmt!(f, References(foreign_key));
        }
    }
}

/// ` REFERENCES [table]([column]) ON DELETE ...`
struct References<'a>(&'a ForeignKey);

impl ToSql for References<'_> {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        let serializer = f.serializer;
        let table = serializer.table_name(self.0.references.table);
        let column = serializer.column_name(self.0.references);

        fmt!(f, " REFERENCES " Ident(table) "(" Ident(column) ")");

        if let Some(action) = self.0.on_delete {
            fmt!(f, " ON DELETE " action.as_sql());
        }

        if let Some(action) = self.0.on_update {
            fmt!(f, " ON UPDATE " action.as_sql());
        }
    }
}

impl ToSql for &stmt::CreateIndex {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        let serializer = f.serializer;
        let table = serializer.table_name(self.on);
        let columns = Comma(
            self.columns
                .iter()
                .map(|column| Ident(serializer.column_name(*column))),
        );
        let unique = if self.unique { "UNIQUE " } else { "" };

        fmt!(f, "CREATE " unique "INDEX " Ident(&self.name) " ON " Ident(table) " (" columns ")");
    }
}

impl ToSql for &stmt::CreateTrigger {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        let serializer = f.serializer;
        let table = serializer.table_name(self.on);

        fmt!(f, "CREATE TRIGGER " Ident(&self.name) " " self.timing.as_sql() " ON " Ident(table));

        if let Some(when) = &self.when {
            fmt!(f, " WHEN " when);
        }

        let body = &self.body;
        fmt!(f, " BEGIN " body " END");
    }
}

impl ToSql for &stmt::Insert {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        fmt!(f, "INSERT INTO " Ident(&self.table));

        if self.columns.is_empty() {
            fmt!(f, " DEFAULT VALUES");
        } else {
            let columns = Comma(self.columns.iter().map(Ident));
            fmt!(f, " (" columns ") VALUES (" Comma(&self.values) ")");
        }
    }
}

impl ToSql for &stmt::InsertSelect {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        let columns = Comma(self.columns.iter().map(Ident));
        let query = &*self.query;
        fmt!(f, "INSERT INTO " Ident(&self.table) " (" columns ") " query);
    }
}

impl ToSql for &stmt::Update {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        let assignments = Comma(self.assignments.iter().map(Assignment));
        fmt!(f, "UPDATE " Ident(&self.table) " SET " assignments);

        if let Some(filter) = &self.filter {
            fmt!(f, " WHERE " filter);
        }
    }
}

struct Assignment<'a>(&'a (String, stmt::Expr));

impl ToSql for Assignment<'_> {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        let (column, value) = self.0;
        fmt!(f, Ident(column) " = " value);
    }
}

impl ToSql for &stmt::Delete {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        fmt!(f, "DELETE FROM " Ident(&self.table));

        if let Some(filter) = &self.filter {
            fmt!(f, " WHERE " filter);
        }
    }
}

impl ToSql for &stmt::Select {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        if !self.with.is_empty() {
            fmt!(f, "WITH " Comma(&self.with) " ");
        }

        let from = &self.from;
        fmt!(f, "SELECT " Comma(&self.columns) " FROM " from);

        for join in &self.joins {
            let (source, on) = (&join.source, &join.on);
            fmt!(f, " LEFT JOIN " source " ON " on);
        }

        if let Some(filter) = &self.filter {
            fmt!(f, " WHERE " filter);
        }

        if let Some(limit) = self.limit {
            let limit = limit.to_string();
            fmt!(f, " LIMIT " limit.as_str());
        }
    }
}

impl ToSql for &stmt::Cte {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        fmt!(f, Ident(&self.name));

        if !self.columns.is_empty() {
            let columns = Comma(self.columns.iter().map(Ident));
            fmt!(f, "(" columns ")");
        }

        let query = &self.query;
        fmt!(f, " AS (" query ")");
    }
}

impl ToSql for &stmt::SelectColumn {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        fmt!(f, &self.expr);

        if let Some(alias) = &self.alias {
            fmt!(f, " AS " Ident(alias));
        }
    }
}

impl ToSql for &stmt::Source {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        match self {
            stmt::Source::Table { name, alias } => {
                fmt!(f, Ident(name));
                if let Some(alias) = alias {
                    fmt!(f, " " Ident(alias));
                }
            }
            stmt::Source::Subquery { query, alias } => {
                let query = &**query;
                fmt!(f, "(" query ") " Ident(alias));
            }
        }
    }
}
