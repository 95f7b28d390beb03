use super::{Comma, Delimited, Formatter, Ident, Params, ToSql};

use crate::stmt::{self, Expr};

impl ToSql for &Expr {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        match self {
            Expr::And(operands) if operands.is_empty() => fmt!(f, "1"),
            Expr::And(operands) => {
                fmt!(f, Delimited(operands.iter().map(Operand), " AND "));
            }
            Expr::BinaryOp { lhs, op, rhs } => {
                let op = op.to_string();
                fmt!(f, Operand(lhs) " " op.as_str() " " Operand(rhs));
            }
            Expr::Column(column) => column.to_sql(f),
            Expr::InList { expr, list } => {
                fmt!(f, Operand(expr) " IN (" Comma(list) ")");
            }
            Expr::InSubquery { expr, query } => {
                let query = &**query;
                fmt!(f, Operand(expr) " IN (" query ")");
            }
            Expr::IsNull { expr, negate } => {
                let keyword = if *negate { " IS NOT NULL" } else { " IS NULL" };
                fmt!(f, Operand(expr) keyword);
            }
            Expr::LastInsertRowid => fmt!(f, "last_insert_rowid()"),
            Expr::Not(expr) => {
                let expr = &**expr;
                fmt!(f, "NOT (" expr ")");
            }
            Expr::Or(operands) if operands.is_empty() => fmt!(f, "0"),
            Expr::Or(operands) => {
                fmt!(f, Delimited(operands.iter().map(Operand), " OR "));
            }
            Expr::Param(slot) => {
                let placeholder = f.params.push(slot);
                fmt!(f, placeholder);
            }
            Expr::Subquery(query) => {
                let query = &**query;
                fmt!(f, "(" query ")");
            }
            Expr::Value(value) => value.to_sql(f),
        }
    }
}

impl ToSql for &stmt::ColumnRef {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        if let Some(table) = &self.table {
            fmt!(f, Ident(table) ".");
        }
        fmt!(f, Ident(&self.name));
    }
}

/// An operand of a larger expression. Boolean combinations are
/// parenthesized.
struct Operand<'a>(&'a Expr);

impl ToSql for Operand<'_> {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        match self.0 {
            Expr::And(operands) | Expr::Or(operands) if operands.len() > 1 => {
                fmt!(f, "(" self.0 ")");
            }
            expr => expr.to_sql(f),
        }
    }
}
