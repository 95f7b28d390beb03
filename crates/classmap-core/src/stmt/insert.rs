use super::{ClassRef, Expr};

/// `INSERT INTO <class> (<properties>) VALUES (<values>)`
#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub class: ClassRef,

    /// Access strings of the properties being inserted
    pub properties: Vec<String>,

    pub values: Vec<Expr>,
}

impl Insert {
    pub fn new(class: impl Into<ClassRef>) -> Insert {
        Insert {
            class: class.into(),
            properties: vec![],
            values: vec![],
        }
    }

    pub fn value(mut self, property: impl Into<String>, value: impl Into<Expr>) -> Insert {
        self.properties.push(property.into());
        self.values.push(value.into());
        self
    }
}
