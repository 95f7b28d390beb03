use super::{Expr, Select, Statement};

/// `INSERT INTO <table> (<columns>) VALUES (<values>)`
#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table: String,
    pub columns: Vec<String>,
    pub values: Vec<Expr>,
}

impl From<Insert> for Statement {
    fn from(value: Insert) -> Self {
        Self::Insert(value)
    }
}

/// `INSERT INTO <table> (<columns>) <query>`
#[derive(Debug, Clone, PartialEq)]
pub struct InsertSelect {
    pub table: String,
    pub columns: Vec<String>,
    pub query: Box<Select>,
}

impl From<InsertSelect> for Statement {
    fn from(value: InsertSelect) -> Self {
        Self::InsertSelect(value)
    }
}
