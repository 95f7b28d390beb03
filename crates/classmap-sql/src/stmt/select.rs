use super::{Expr, Statement};

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub with: Vec<Cte>,
    pub columns: Vec<SelectColumn>,
    pub from: Source,
    /// Joined with `LEFT JOIN`
    pub joins: Vec<Join>,
    pub filter: Option<Expr>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectColumn {
    pub expr: Expr,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Table { name: String, alias: Option<String> },
    Subquery { query: Box<Select>, alias: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub source: Source,
    pub on: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cte {
    pub name: String,
    pub columns: Vec<String>,
    pub query: Select,
}

impl Select {
    pub fn new(from: Source) -> Select {
        Select {
            with: vec![],
            columns: vec![],
            from,
            joins: vec![],
            filter: None,
            limit: None,
        }
    }

    pub fn column(&mut self, expr: Expr, alias: Option<String>) {
        self.columns.push(SelectColumn { expr, alias });
    }
}

impl Source {
    pub fn table(name: impl Into<String>, alias: Option<String>) -> Source {
        Source::Table {
            name: name.into(),
            alias,
        }
    }

    /// The name columns of this source are qualified with
    pub fn qualifier(&self) -> &str {
        match self {
            Source::Table { name, alias } => alias.as_deref().unwrap_or(name),
            Source::Subquery { alias, .. } => alias,
        }
    }
}

impl From<Select> for Statement {
    fn from(value: Select) -> Self {
        Self::Select(Box::new(value))
    }
}
