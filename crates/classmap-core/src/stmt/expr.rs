use super::*;

/// An ECSQL expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    And(ExprAnd),

    BinaryOp(ExprBinaryOp),

    InList(ExprInList),

    IsNull(ExprIsNull),

    Not(ExprNot),

    Or(ExprOr),

    /// A statement parameter, bound after preparation
    Param(Param),

    /// A property of the class in scope, or a column of a subquery or CTE
    Property(ExprProperty),

    Value(Value),
}

impl Expr {
    pub fn null() -> Expr {
        Expr::Value(Value::Null)
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Expr::Value(_))
    }

    pub fn as_property(&self) -> Option<&ExprProperty> {
        match self {
            Expr::Property(property) => Some(property),
            _ => None,
        }
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Expr::Value(value)
    }
}

impl From<Param> for Expr {
    fn from(value: Param) -> Self {
        Expr::Param(value)
    }
}

impl From<bool> for Expr {
    fn from(value: bool) -> Self {
        Expr::Value(Value::Bool(value))
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Expr::Value(Value::I64(value))
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::Value(Value::F64(value))
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Expr::Value(Value::String(value.to_string()))
    }
}

impl From<String> for Expr {
    fn from(value: String) -> Self {
        Expr::Value(Value::String(value))
    }
}
