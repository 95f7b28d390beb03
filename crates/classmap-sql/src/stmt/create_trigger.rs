use super::Statement;
use classmap_core::schema::db::{Table, TableId, Trigger, TriggerTiming};

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTrigger {
    pub name: String,
    pub on: TableId,
    pub timing: TriggerTiming,
    pub when: Option<String>,
    pub body: String,
}

impl Statement {
    pub fn create_trigger(table: &Table, trigger: &Trigger) -> Self {
        CreateTrigger {
            name: trigger.name.clone(),
            on: table.id,
            timing: trigger.timing,
            when: trigger.when.clone(),
            body: trigger.body.clone(),
        }
        .into()
    }
}

impl From<CreateTrigger> for Statement {
    fn from(value: CreateTrigger) -> Self {
        Self::CreateTrigger(value)
    }
}
