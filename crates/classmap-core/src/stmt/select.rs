use super::{ClassRef, Cte, Expr, FromItem};

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    /// Common table expressions visible to this query
    pub with: Vec<Cte>,

    /// Selected expressions. Selecting a struct, point or navigation property
    /// yields one result column per leaf.
    pub columns: Vec<SelectItem>,

    pub from: FromItem,

    pub filter: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub expr: Expr,
    pub alias: Option<String>,
}

impl Select {
    pub fn new(from: impl Into<FromItem>) -> Select {
        Select {
            with: vec![],
            columns: vec![],
            from: from.into(),
            filter: None,
        }
    }

    pub fn from_class(class: impl Into<ClassRef>) -> Select {
        Select::new(FromItem::Class(class.into()))
    }

    pub fn column(mut self, expr: impl Into<Expr>) -> Select {
        self.columns.push(SelectItem {
            expr: expr.into(),
            alias: None,
        });
        self
    }

    pub fn column_as(mut self, expr: impl Into<Expr>, alias: impl Into<String>) -> Select {
        self.columns.push(SelectItem {
            expr: expr.into(),
            alias: Some(alias.into()),
        });
        self
    }

    pub fn filter(mut self, filter: impl Into<Expr>) -> Select {
        self.filter = Some(filter.into());
        self
    }

    pub fn with(mut self, cte: Cte) -> Select {
        self.with.push(cte);
        self
    }
}
