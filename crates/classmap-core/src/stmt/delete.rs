use super::{ClassRef, Expr, Options};

#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub class: ClassRef,

    pub filter: Option<Expr>,

    pub options: Options,
}

impl Delete {
    pub fn new(class: impl Into<ClassRef>) -> Delete {
        Delete {
            class: class.into(),
            filter: None,
            options: Options::default(),
        }
    }

    pub fn filter(mut self, filter: impl Into<Expr>) -> Delete {
        self.filter = Some(filter.into());
        self
    }
}
