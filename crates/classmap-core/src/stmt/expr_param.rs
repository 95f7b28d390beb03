use super::Expr;

/// An ECSQL parameter.
///
/// Positional parameters are numbered from 1 in the order they appear in the
/// statement. A named parameter may appear several times and is bound once.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Param {
    /// `?`
    Positional,

    /// `:name`
    Named(String),
}

impl Expr {
    /// A positional `?` parameter
    pub fn param() -> Expr {
        Expr::Param(Param::Positional)
    }

    pub fn named_param(name: impl Into<String>) -> Expr {
        Expr::Param(Param::Named(name.into()))
    }
}
