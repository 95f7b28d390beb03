use super::{BinaryOp, Select, Value};
use crate::param::ParamSlot;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// AND of the operands. An empty list is `TRUE`.
    And(Vec<Expr>),

    BinaryOp {
        lhs: Box<Expr>,
        op: BinaryOp,
        rhs: Box<Expr>,
    },

    Column(ColumnRef),

    InList {
        expr: Box<Expr>,
        list: Vec<Expr>,
    },

    InSubquery {
        expr: Box<Expr>,
        query: Box<Select>,
    },

    IsNull {
        expr: Box<Expr>,
        negate: bool,
    },

    /// `last_insert_rowid()`
    LastInsertRowid,

    Not(Box<Expr>),

    /// OR of the operands. An empty list is `FALSE`.
    Or(Vec<Expr>),

    /// A statement parameter. The serializer numbers parameters in the order
    /// they are written.
    Param(ParamSlot),

    /// Scalar subquery
    Subquery(Box<Select>),

    /// Literal value, written inline
    Value(Value),
}

/// `[table].[column]`, or `[column]` when there is no qualifier
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub name: String,
}

impl Expr {
    pub fn column(name: impl Into<String>) -> Expr {
        Expr::Column(ColumnRef {
            table: None,
            name: name.into(),
        })
    }

    pub fn qualified_column(table: impl Into<String>, name: impl Into<String>) -> Expr {
        Expr::Column(ColumnRef {
            table: Some(table.into()),
            name: name.into(),
        })
    }

    pub fn binary_op(lhs: Expr, op: BinaryOp, rhs: Expr) -> Expr {
        Expr::BinaryOp {
            lhs: Box::new(lhs),
            op,
            rhs: Box::new(rhs),
        }
    }

    pub fn eq(lhs: Expr, rhs: Expr) -> Expr {
        Expr::binary_op(lhs, BinaryOp::Eq, rhs)
    }

    pub fn in_list(expr: Expr, list: Vec<Expr>) -> Expr {
        Expr::InList {
            expr: Box::new(expr),
            list,
        }
    }

    pub fn in_subquery(expr: Expr, query: Select) -> Expr {
        Expr::InSubquery {
            expr: Box::new(expr),
            query: Box::new(query),
        }
    }

    pub fn is_null(expr: Expr) -> Expr {
        Expr::IsNull {
            expr: Box::new(expr),
            negate: false,
        }
    }

    pub fn is_not_null(expr: Expr) -> Expr {
        Expr::IsNull {
            expr: Box::new(expr),
            negate: true,
        }
    }

    /// ANDs the operands, flattening nested ANDs. Returns `None` for an
    /// empty list and the operand itself for a single one.
    pub fn and_from_vec(operands: Vec<Expr>) -> Option<Expr> {
        let mut flat = vec![];
        for operand in operands {
            match operand {
                Expr::And(nested) => flat.extend(nested),
                operand => flat.push(operand),
            }
        }

        match flat.len() {
            0 => None,
            1 => flat.pop(),
            _ => Some(Expr::And(flat)),
        }
    }

    /// ORs the operands. Returns `None` for an empty list and the operand
    /// itself for a single one.
    pub fn or_from_vec(mut operands: Vec<Expr>) -> Option<Expr> {
        match operands.len() {
            0 => None,
            1 => operands.pop(),
            _ => Some(Expr::Or(operands)),
        }
    }

    pub fn is_column(&self) -> bool {
        matches!(self, Expr::Column(_))
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Expr::Value(value)
    }
}

impl From<ColumnRef> for Expr {
    fn from(value: ColumnRef) -> Self {
        Expr::Column(value)
    }
}
