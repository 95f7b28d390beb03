use super::ClassId;
use serde::{Deserialize, Serialize};

/// Relationship-specific part of a relationship class
#[derive(Debug, Clone)]
pub struct Relationship {
    pub strength: Strength,
    pub source: RelationshipConstraint,
    pub target: RelationshipConstraint,

    /// Present when the navigation property of the relationship is backed by
    /// a physical foreign key constraint.
    pub foreign_key: Option<ForeignKeyHint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strength {
    Referencing,
    Holding,
    Embedding,
}

#[derive(Debug, Clone)]
pub struct RelationshipConstraint {
    /// Constraint class. Instances of subclasses are accepted when
    /// `polymorphic` is set.
    pub class: ClassId,
    pub multiplicity: Multiplicity,
    pub polymorphic: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Multiplicity {
    pub lower: u32,
    /// `None` means unbounded
    pub upper: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationshipEnd {
    Source,
    Target,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForeignKeyHint {
    pub on_delete: Option<ForeignKeyAction>,
    pub on_update: Option<ForeignKeyAction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ForeignKeyAction {
    Cascade,
    NoAction,
    SetNull,
    SetDefault,
    Restrict,
}

impl Relationship {
    pub fn new(source: ClassId, target: ClassId) -> Relationship {
        Relationship {
            strength: Strength::Referencing,
            source: RelationshipConstraint::new(source),
            target: RelationshipConstraint::new(target),
            foreign_key: None,
        }
    }

    pub fn with_strength(mut self, strength: Strength) -> Relationship {
        self.strength = strength;
        self
    }

    pub fn with_foreign_key(mut self, hint: ForeignKeyHint) -> Relationship {
        self.foreign_key = Some(hint);
        self
    }

    pub fn constraint(&self, end: RelationshipEnd) -> &RelationshipConstraint {
        match end {
            RelationshipEnd::Source => &self.source,
            RelationshipEnd::Target => &self.target,
        }
    }
}

impl RelationshipConstraint {
    pub fn new(class: ClassId) -> RelationshipConstraint {
        RelationshipConstraint {
            class,
            multiplicity: Multiplicity::ZERO_MANY,
            polymorphic: true,
        }
    }
}

impl Multiplicity {
    pub const ZERO_ONE: Multiplicity = Multiplicity {
        lower: 0,
        upper: Some(1),
    };

    pub const ZERO_MANY: Multiplicity = Multiplicity {
        lower: 0,
        upper: None,
    };

    pub const ONE_ONE: Multiplicity = Multiplicity {
        lower: 1,
        upper: Some(1),
    };
}

impl RelationshipEnd {
    pub fn other(self) -> RelationshipEnd {
        match self {
            RelationshipEnd::Source => RelationshipEnd::Target,
            RelationshipEnd::Target => RelationshipEnd::Source,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RelationshipEnd::Source => "Source",
            RelationshipEnd::Target => "Target",
        }
    }
}

impl ForeignKeyAction {
    pub fn as_sql(self) -> &'static str {
        match self {
            ForeignKeyAction::Cascade => "CASCADE",
            ForeignKeyAction::NoAction => "NO ACTION",
            ForeignKeyAction::SetNull => "SET NULL",
            ForeignKeyAction::SetDefault => "SET DEFAULT",
            ForeignKeyAction::Restrict => "RESTRICT",
        }
    }
}
