use super::{ClassRef, Select};

/// The source of a SELECT
#[derive(Debug, Clone, PartialEq)]
pub enum FromItem {
    Class(ClassRef),

    /// `(SELECT ...) <alias>`
    Subquery { query: Box<Select>, alias: String },

    /// A CTE declared in the enclosing `WITH`
    Cte { name: String, alias: Option<String> },
}

impl FromItem {
    /// The name property references use to qualify columns of this source
    pub fn qualifier(&self) -> Option<&str> {
        match self {
            FromItem::Class(class) => class.alias.as_deref(),
            FromItem::Subquery { alias, .. } => Some(alias),
            FromItem::Cte { name, alias } => Some(alias.as_deref().unwrap_or(name)),
        }
    }
}

impl From<ClassRef> for FromItem {
    fn from(value: ClassRef) -> Self {
        FromItem::Class(value)
    }
}
