use super::{Column, Index, Schema, Table, Trigger};
use std::collections::HashMap;

/// The additive difference between a persisted schema and a freshly mapped
/// one.
///
/// Mapping never removes tables, columns or constraints, so the diff only
/// reports what has to be created. Tables and columns that have no storage
/// (virtual columns, existing and virtual tables) never show up.
pub struct SchemaDiff<'a> {
    previous: &'a Schema,
    next: &'a Schema,
    items: Vec<SchemaDiffItem<'a>>,
}

#[derive(Debug)]
pub enum SchemaDiffItem<'a> {
    CreateTable(&'a Table),
    AddColumn {
        table: &'a Table,
        column: &'a Column,
    },
    CreateIndex {
        table: &'a Table,
        index: &'a Index,
    },
    CreateTrigger {
        table: &'a Table,
        trigger: &'a Trigger,
    },
}

impl<'a> SchemaDiff<'a> {
    pub fn from(previous: &'a Schema, next: &'a Schema) -> SchemaDiff<'a> {
        let previous_map = HashMap::<String, &'a Table>::from_iter(
            previous
                .tables
                .iter()
                .map(|table| (table.name.to_ascii_lowercase(), table)),
        );

        let mut tables = vec![];
        let mut columns = vec![];
        let mut indexes = vec![];
        let mut triggers = vec![];

        for to in next.tables.iter().filter(|table| table.is_owned()) {
            let from = previous_map.get(&to.name.to_ascii_lowercase()).copied();

            match from {
                None => {
                    tables.push(SchemaDiffItem::CreateTable(to));
                }
                Some(from) => {
                    for column in to.physical_columns() {
                        if from.find_column(&column.name).is_none() {
                            columns.push(SchemaDiffItem::AddColumn { table: to, column });
                        }
                    }
                }
            }

            for index in &to.indexes {
                let exists = from.is_some_and(|from| from.indexes.iter().any(|i| i.name == index.name));
                if !exists {
                    indexes.push(SchemaDiffItem::CreateIndex { table: to, index });
                }
            }

            for trigger in &to.triggers {
                let exists = from.is_some_and(|from| from.trigger(&trigger.name).is_some());
                if !exists {
                    triggers.push(SchemaDiffItem::CreateTrigger { table: to, trigger });
                }
            }
        }

        let mut items = tables;
        items.extend(columns);
        items.extend(indexes);
        items.extend(triggers);

        SchemaDiff {
            previous,
            next,
            items,
        }
    }

    pub fn items(&self) -> &[SchemaDiffItem<'a>] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn previous(&self) -> &'a Schema {
        self.previous
    }

    pub fn next(&self) -> &'a Schema {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::db::{ColumnKind, ColumnType, PersistenceType, TableType, TriggerTiming};

    fn base() -> Schema {
        let mut schema = Schema::default();
        let foo = schema.create_table("Foo", TableType::Primary).unwrap();
        schema
            .add_column(foo, "Id", ColumnKind::ECInstanceId, ColumnType::Integer, PersistenceType::Physical)
            .unwrap();
        schema
    }

    #[test]
    fn new_table_is_created() {
        let previous = Schema::default();
        let next = base();

        let diff = SchemaDiff::from(&previous, &next);
        assert!(matches!(diff.items(), [SchemaDiffItem::CreateTable(t)] if t.name == "Foo"));
    }

    #[test]
    fn identical_schemas_have_no_diff() {
        let previous = base();
        let next = base();
        assert!(SchemaDiff::from(&previous, &next).is_empty());
    }

    #[test]
    fn physical_columns_are_added_and_virtual_ones_skipped() {
        let previous = base();
        let mut next = base();
        let foo = next.tables[0].id;
        next.add_column(foo, "Name", ColumnKind::Data, ColumnType::Text, PersistenceType::Physical)
            .unwrap();
        next.add_column(foo, "Flag", ColumnKind::Data, ColumnType::Boolean, PersistenceType::Virtual)
            .unwrap();

        let diff = SchemaDiff::from(&previous, &next);
        assert_eq!(diff.items().len(), 1);
        assert!(matches!(
            diff.items()[0],
            SchemaDiffItem::AddColumn { column, .. } if column.name == "Name"
        ));
    }

    #[test]
    fn existing_tables_are_left_alone() {
        let previous = Schema::default();
        let mut next = Schema::default();
        next.create_table("Legacy", TableType::Existing).unwrap();

        assert!(SchemaDiff::from(&previous, &next).is_empty());
    }

    #[test]
    fn triggers_are_created_once() {
        let mut previous = base();
        let foo = previous.tables[0].id;
        previous.add_trigger(foo, "t1", TriggerTiming::AfterUpdate, None, "SELECT 1;");

        let mut next = previous.clone();
        next.add_trigger(foo, "t2", TriggerTiming::AfterUpdate, None, "SELECT 2;");

        let diff = SchemaDiff::from(&previous, &next);
        assert!(matches!(
            diff.items(),
            [SchemaDiffItem::CreateTrigger { trigger, .. }] if trigger.name == "t2"
        ));
    }
}
