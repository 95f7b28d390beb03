use super::Expr;

/// A property reference such as `Name`, `Address.Street` or `e.Parent.Id`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprProperty {
    /// Class alias, subquery alias or CTE name the property is taken from
    pub qualifier: Option<String>,

    /// Access string relative to the qualifier
    pub path: String,
}

impl Expr {
    pub fn property(path: impl Into<String>) -> Expr {
        Expr::Property(ExprProperty {
            qualifier: None,
            path: path.into(),
        })
    }

    pub fn qualified_property(qualifier: impl Into<String>, path: impl Into<String>) -> Expr {
        Expr::Property(ExprProperty {
            qualifier: Some(qualifier.into()),
            path: path.into(),
        })
    }
}
