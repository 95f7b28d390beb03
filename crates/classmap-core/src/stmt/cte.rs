use super::Select;

/// A common table expression: `WITH <name>(<columns>) AS (<query>)`
#[derive(Debug, Clone, PartialEq)]
pub struct Cte {
    pub name: String,

    /// Column names exposed by the CTE, one per select item
    pub columns: Vec<String>,

    pub query: Select,
}

impl Cte {
    pub fn new(name: impl Into<String>, columns: Vec<String>, query: Select) -> Cte {
        Cte {
            name: name.into(),
            columns,
            query,
        }
    }
}
