use super::{
    Column, ColumnId, ColumnKind, ColumnType, ForeignKey, Index, PersistenceType, Table,
    TableId, TableType, Trigger, TriggerTiming,
};
use crate::{schema::app::ForeignKeyAction, Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub tables: Vec<Table>,
}

impl Schema {
    pub fn column(&self, id: impl Into<ColumnId>) -> &Column {
        let id = id.into();
        self.table(id.table)
            .columns
            .get(id.index)
            .expect("invalid column ID")
    }

    pub fn column_mut(&mut self, id: impl Into<ColumnId>) -> &mut Column {
        let id = id.into();
        self.table_mut(id.table)
            .columns
            .get_mut(id.index)
            .expect("invalid column ID")
    }

    pub fn table(&self, id: impl Into<TableId>) -> &Table {
        self.tables.get(id.into().0).expect("invalid table ID")
    }

    pub fn table_mut(&mut self, id: impl Into<TableId>) -> &mut Table {
        self.tables.get_mut(id.into().0).expect("invalid table ID")
    }

    pub fn table_by_name(&self, name: &str) -> Option<&Table> {
        self.tables
            .iter()
            .find(|table| table.name.eq_ignore_ascii_case(name))
    }

    /// See [`Table::find_first`]
    pub fn find_first(&self, table: TableId, kind: ColumnKind) -> Option<&Column> {
        self.table(table).find_first(kind)
    }

    pub fn find_column(&self, table: TableId, name: &str) -> Option<&Column> {
        self.table(table).find_column(name)
    }

    /// Registers a new, empty table. Name uniqueness is checked.
    pub fn create_table(&mut self, name: impl Into<String>, ty: TableType) -> Result<TableId> {
        let name = name.into();
        if self.table_by_name(&name).is_some() {
            return Err(Error::invalid_schema(format!(
                "table `{name}` already exists"
            )));
        }

        let id = TableId(self.tables.len());
        self.tables.push(Table::new(id, name, ty));
        Ok(id)
    }

    pub fn add_column(
        &mut self,
        table: TableId,
        name: impl Into<String>,
        kind: ColumnKind,
        ty: ColumnType,
        persistence: PersistenceType,
    ) -> Result<ColumnId> {
        let name = name.into();
        let table = self.table_mut(table);

        if table.find_column(&name).is_some() {
            return Err(Error::invalid_schema(format!(
                "column `{}.{name}` already exists",
                table.name
            )));
        }

        let id = ColumnId {
            table: table.id,
            index: table.columns.len(),
        };

        // Virtual tables cannot hold anything physical
        let persistence = if table.ty == TableType::Virtual {
            PersistenceType::Virtual
        } else {
            persistence
        };

        table.columns.push(Column {
            id,
            name,
            kind,
            persistence,
            ty,
            not_null: false,
            unique: false,
            primary_key: false,
            default_expr: None,
            collation: None,
        });

        Ok(id)
    }

    /// Adds a foreign key from `column` to `references`.
    ///
    /// Adding the same constraint twice is a no-op. A column already
    /// constrained to reference a different column is an error.
    pub fn add_foreign_key_constraint(
        &mut self,
        column: ColumnId,
        references: ColumnId,
        on_delete: Option<ForeignKeyAction>,
        on_update: Option<ForeignKeyAction>,
    ) -> Result<()> {
        let table = self.table_mut(column.table);

        if let Some(existing) = table.foreign_key_for(column) {
            if existing.references == references {
                return Ok(());
            }

            return Err(Error::invalid_schema(format!(
                "column `{}.{}` already references another table",
                table.name,
                table.column(column).name
            )));
        }

        table.foreign_keys.push(ForeignKey {
            column,
            references,
            on_delete,
            on_update,
        });

        Ok(())
    }

    /// Registers a trigger on `table`. The caller makes sure the name is
    /// unique.
    pub fn add_trigger(
        &mut self,
        table: TableId,
        name: impl Into<String>,
        timing: TriggerTiming,
        when: Option<String>,
        body: impl Into<String>,
    ) {
        self.table_mut(table).triggers.push(Trigger {
            name: name.into(),
            timing,
            when,
            body: body.into(),
        });
    }

    pub fn add_index(
        &mut self,
        table: TableId,
        name: impl Into<String>,
        columns: Vec<ColumnId>,
        unique: bool,
    ) {
        let name = name.into();
        let table = self.table_mut(table);
        if table.indexes.iter().any(|index| index.name == name) {
            return;
        }

        table.indexes.push(Index {
            name,
            columns,
            unique,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema_with_two_tables() -> (Schema, ColumnId, ColumnId, ColumnId) {
        let mut schema = Schema::default();
        let parent = schema.create_table("Parent", TableType::Primary).unwrap();
        let other = schema.create_table("Other", TableType::Primary).unwrap();
        let child = schema.create_table("Child", TableType::Primary).unwrap();

        let parent_id = schema
            .add_column(parent, "Id", ColumnKind::ECInstanceId, ColumnType::Integer, PersistenceType::Physical)
            .unwrap();
        let other_id = schema
            .add_column(other, "Id", ColumnKind::ECInstanceId, ColumnType::Integer, PersistenceType::Physical)
            .unwrap();
        let fk = schema
            .add_column(child, "ParentId", ColumnKind::Data, ColumnType::Integer, PersistenceType::Physical)
            .unwrap();

        (schema, parent_id, other_id, fk)
    }

    #[test]
    fn foreign_key_is_idempotent() {
        let (mut schema, parent_id, _, fk) = schema_with_two_tables();

        schema
            .add_foreign_key_constraint(fk, parent_id, Some(ForeignKeyAction::Cascade), None)
            .unwrap();
        schema
            .add_foreign_key_constraint(fk, parent_id, Some(ForeignKeyAction::Cascade), None)
            .unwrap();

        assert_eq!(schema.table(fk.table).foreign_keys.len(), 1);
    }

    #[test]
    fn foreign_key_to_different_column_fails() {
        let (mut schema, parent_id, other_id, fk) = schema_with_two_tables();

        schema
            .add_foreign_key_constraint(fk, parent_id, None, None)
            .unwrap();
        let err = schema
            .add_foreign_key_constraint(fk, other_id, None, None)
            .unwrap_err();
        assert!(err.is_invalid_schema());
    }

    #[test]
    fn find_first_by_kind() {
        let (schema, parent_id, _, fk) = schema_with_two_tables();

        let found = schema
            .find_first(parent_id.table, ColumnKind::ECInstanceId)
            .unwrap();
        assert_eq!(found.id, parent_id);
        assert!(schema.find_first(fk.table, ColumnKind::ECClassId).is_none());
        assert_eq!(schema.find_column(fk.table, "parentid").unwrap().id, fk);
    }

    #[test]
    fn columns_of_virtual_tables_are_virtual() {
        let mut schema = Schema::default();
        let table = schema.create_table("Nothing", TableType::Virtual).unwrap();
        let column = schema
            .add_column(table, "Name", ColumnKind::Data, ColumnType::Text, PersistenceType::Physical)
            .unwrap();
        assert!(schema.column(column).is_virtual());
    }

    #[test]
    fn duplicate_table_name_is_rejected() {
        let mut schema = Schema::default();
        schema.create_table("Foo", TableType::Primary).unwrap();
        assert!(schema
            .create_table("foo", TableType::Primary)
            .unwrap_err()
            .is_invalid_schema());
    }
}
