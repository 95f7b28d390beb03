use super::Expr;

/// `SET <property> = <value>` in an UPDATE
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// Access string of the property being set
    pub property: String,

    pub value: Expr,
}

impl Assignment {
    pub fn new(property: impl Into<String>, value: impl Into<Expr>) -> Assignment {
        Assignment {
            property: property.into(),
            value: value.into(),
        }
    }
}
