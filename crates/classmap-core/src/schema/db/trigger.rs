use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub name: String,
    pub timing: TriggerTiming,
    /// Condition of the `WHEN` clause, without the keyword
    pub when: Option<String>,
    /// Statements between `BEGIN` and `END`, including the trailing `;`
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerTiming {
    BeforeInsert,
    AfterInsert,
    BeforeUpdate,
    AfterUpdate,
    BeforeDelete,
    AfterDelete,
}

impl TriggerTiming {
    pub fn as_sql(self) -> &'static str {
        match self {
            TriggerTiming::BeforeInsert => "BEFORE INSERT",
            TriggerTiming::AfterInsert => "AFTER INSERT",
            TriggerTiming::BeforeUpdate => "BEFORE UPDATE",
            TriggerTiming::AfterUpdate => "AFTER UPDATE",
            TriggerTiming::BeforeDelete => "BEFORE DELETE",
            TriggerTiming::AfterDelete => "AFTER DELETE",
        }
    }
}
