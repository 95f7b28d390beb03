use super::{
    class_id_literal,
    leaf::SystemColumns,
    scope::{ClassScope, Scope},
    Preparer,
};
use crate::stmt::{self, Expr, Value};
use classmap_core::{
    schema::{
        db::TableType,
        mapping::{ClassMap, MapStrategy, SystemProperty},
    },
    stmt as ecsql, Error, Result,
};

impl<'a> Preparer<'a> {
    /// Deletes rows from the primary table. Rows in joined and overflow
    /// tables go with them through their cascading foreign keys.
    pub(super) fn prepare_delete(&mut self, delete: &'a ecsql::Delete) -> Result<Vec<stmt::Statement>> {
        let schema = self.schema;
        let class_map = self.class_map(&delete.class)?;

        if class_map.strategy.is_end_table_relationship() {
            return self.prepare_delete_relationship(class_map, delete);
        }

        let Some(primary) = class_map.primary_table() else {
            return Err(Error::internal(format!(
                "`{}` has no primary table",
                self.class_name(class_map.class)
            )));
        };

        let table = schema.db.table(primary);
        if class_map.strategy == MapStrategy::ExistingTable || table.ty == TableType::Existing {
            return Err(Error::invalid_ecsql(format!(
                "cannot delete from `{}`: it is mapped to existing table `{}`",
                self.class_name(class_map.class),
                table.name
            )));
        }

        if table.ty == TableType::Virtual {
            return Ok(vec![]);
        }

        let filter = self.write_filter(
            class_map,
            &delete.class,
            delete.filter.as_ref(),
            delete.options,
            primary,
        )?;

        Ok(vec![stmt::Delete {
            table: table.name.clone(),
            filter,
        }
        .into()])
    }

    /// Deleting a relationship stored as a foreign key clears the navigation
    /// columns of every table holding it. The rows themselves stay.
    fn prepare_delete_relationship(
        &mut self,
        class_map: &'a ClassMap,
        delete: &'a ecsql::Delete,
    ) -> Result<Vec<stmt::Statement>> {
        let schema = self.schema;
        let Some(end) = class_map.strategy.foreign_key_end() else {
            return Err(Error::internal("not an end-table relationship"));
        };

        let mut statements = vec![];

        for &table in &class_map.tables {
            let instance_id = class_map
                .system(SystemProperty::instance_id(end.other()))
                .and_then(|map| map.column_in(table));
            let Some(instance_id) = instance_id else {
                continue;
            };

            let scope = ClassScope::new(schema, class_map, delete.class.alias.as_deref())
                .system_columns(SystemColumns::In(table));

            let mut assignments = vec![(
                schema.db.column(instance_id).name.clone(),
                Expr::Value(Value::Null),
            )];

            let mut filters = vec![Expr::is_not_null(scope.column_expr(instance_id))];

            let rel_class_id = class_map
                .system(SystemProperty::ECClassId)
                .and_then(|map| map.column_in(table))
                .filter(|column| !schema.db.column(*column).is_virtual());

            if let Some(rel_class_id) = rel_class_id {
                assignments.push((
                    schema.db.column(rel_class_id).name.clone(),
                    Expr::Value(Value::Null),
                ));

                if delete.class.only && !delete.options.no_class_id_filter {
                    filters.push(Expr::eq(
                        scope.column_expr(rel_class_id),
                        class_id_literal(class_map.class),
                    ));
                }
            }

            if let Some(filter) = &delete.filter {
                filters.push(self.lower_expr(Some(&Scope::Class(scope)), filter)?);
            }

            statements.push(
                stmt::Update {
                    table: schema.db.table(table).name.clone(),
                    assignments,
                    filter: Expr::and_from_vec(filters),
                }
                .into(),
            );
        }

        Ok(statements)
    }
}
