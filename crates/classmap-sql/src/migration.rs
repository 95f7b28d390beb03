use classmap_core::schema::db::{Schema, SchemaDiff, SchemaDiffItem};

use crate::{param::ParamSlot, stmt::Statement, Serializer};

/// A DDL statement applying one item of a schema diff, together with the
/// schema its ids resolve against.
pub struct MigrationStatement<'a> {
    statement: Statement,
    schema: &'a Schema,
}

impl<'a> MigrationStatement<'a> {
    pub fn from_diff(schema_diff: &SchemaDiff<'a>) -> Vec<Self> {
        let schema = schema_diff.next();

        schema_diff
            .items()
            .iter()
            .map(|item| {
                let statement = match item {
                    SchemaDiffItem::CreateTable(table) => Statement::create_table(table),
                    SchemaDiffItem::AddColumn { table, column } => {
                        Statement::add_column(table, column)
                    }
                    SchemaDiffItem::CreateIndex { table, index } => {
                        Statement::create_index(table, index)
                    }
                    SchemaDiffItem::CreateTrigger { table, trigger } => {
                        Statement::create_trigger(table, trigger)
                    }
                };

                MigrationStatement { statement, schema }
            })
            .collect()
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    /// The SQL text of the statement. DDL never has parameters.
    pub fn to_sql(&self) -> String {
        Serializer::sqlite(self.schema).serialize(&self.statement, &mut Vec::<ParamSlot>::new())
    }
}
