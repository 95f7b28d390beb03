use super::{Assignment, ClassRef, Expr, Options};

#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub class: ClassRef,

    pub assignments: Vec<Assignment>,

    pub filter: Option<Expr>,

    pub options: Options,
}

impl Update {
    pub fn new(class: impl Into<ClassRef>) -> Update {
        Update {
            class: class.into(),
            assignments: vec![],
            filter: None,
            options: Options::default(),
        }
    }

    pub fn set(mut self, property: impl Into<String>, value: impl Into<Expr>) -> Update {
        self.assignments.push(Assignment::new(property, value));
        self
    }

    pub fn filter(mut self, filter: impl Into<Expr>) -> Update {
        self.filter = Some(filter.into());
        self
    }

    pub fn options(mut self, options: Options) -> Update {
        self.options = options;
        self
    }
}
