/// A class named in a FROM, INSERT INTO, UPDATE or DELETE FROM clause.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassRef {
    pub name: String,

    /// `ONLY <class>`: subclasses are excluded
    pub only: bool,

    pub alias: Option<String>,
}

impl ClassRef {
    /// A polymorphic reference, matching the class and all of its subclasses
    pub fn new(name: impl Into<String>) -> ClassRef {
        ClassRef {
            name: name.into(),
            only: false,
            alias: None,
        }
    }

    pub fn only(name: impl Into<String>) -> ClassRef {
        ClassRef {
            only: true,
            ..ClassRef::new(name)
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> ClassRef {
        self.alias = Some(alias.into());
        self
    }
}

impl From<&str> for ClassRef {
    fn from(value: &str) -> Self {
        ClassRef::new(value)
    }
}
