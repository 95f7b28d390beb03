use super::{Formatter, Ident, Params, ToSql};

use crate::stmt;

impl ToSql for &stmt::ColumnDef {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, Ident(&self.name));

        if let Some(ty) = self.ty.as_sql() {
            fmt!(f, " " ty);
        }

        if self.primary_key {
            fmt!(f, " PRIMARY KEY");
        }

        if self.not_null {
            fmt!(f, " NOT NULL");
        }

        if self.unique {
            fmt!(f, " UNIQUE");
        }

        if let Some(collation) = self.collation {
            fmt!(f, " COLLATE " collation.as_sql());
        }

        if let Some(default) = &self.default {
            fmt!(f, " DEFAULT (" default ")");
        }
    }
}
