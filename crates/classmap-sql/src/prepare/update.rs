use super::{
    leaf::{self, Leaf, SystemColumns},
    scope::{ClassScope, Scope},
    zip_filter_flatten, Preparer,
};
use crate::stmt;
use classmap_core::{
    schema::{
        db::{ColumnKind, ColumnType, TableId},
        mapping::PropertyMap,
    },
    stmt as ecsql, Error, Result,
};

/// Scratch table holding the ids a multi-table UPDATE targets
const TARGETS: &str = "classmap_targets";
const ID: &str = "ECInstanceId";

impl<'a> Preparer<'a> {
    /// One native UPDATE per table holding an assigned column, primary table
    /// first.
    pub(super) fn prepare_update(&mut self, update: &'a ecsql::Update) -> Result<Vec<stmt::Statement>> {
        let schema = self.schema;
        let class_map = self.class_map(&update.class)?;
        let class = schema.app.class(class_map.class);

        let scope = Scope::Class(ClassScope::new(
            schema,
            class_map,
            update.class.alias.as_deref(),
        ));

        let mut names = vec![];
        let mut values = vec![];

        for assignment in &update.assignments {
            let Some(map) = class_map.find(&assignment.property) else {
                return Err(Error::invalid_ecsql(format!(
                    "`{}` has no property `{}`",
                    class.name, assignment.property
                )));
            };

            if let PropertyMap::System(system) = map {
                return Err(Error::invalid_ecsql(format!(
                    "system property {} cannot be updated",
                    system.property.as_str()
                )));
            }

            if !update.options.readonly_properties_are_updatable {
                let root = map.access_string().split('.').next().unwrap_or_default();
                if schema
                    .app
                    .property(class.id, root)
                    .is_some_and(|property| property.readonly)
                {
                    return Err(Error::invalid_ecsql(format!(
                        "property `{}` of `{}` is readonly",
                        assignment.property, class.name
                    )));
                }
            }

            let leaves = leaf::leaves(map, SystemColumns::All);

            // The value is read from the row being updated, so it must live
            // in the same table as the column it is written to
            if let (ecsql::Expr::Property(source), Some(class_scope)) =
                (&assignment.value, scope.as_class())
            {
                let (_, source_leaves) = class_scope.resolve(source)?;
                if source_leaves.len() == leaves.len()
                    && source_leaves
                        .iter()
                        .zip(&leaves)
                        .any(|(source, target)| source.column.table != target.column.table)
                {
                    return Err(Error::invalid_ecsql(format!(
                        "cannot set `{}` from `{}`, which is stored in another table",
                        assignment.property, source.path
                    )));
                }
            }

            let targets: Vec<_> = leaves.iter().map(|leaf| leaf.path.clone()).collect();
            values.push(self.lower_values(Some(&scope), &assignment.value, &targets)?);
            names.push(leaves);
        }

        let (leaves, values) = zip_filter_flatten(names, values, |leaf: &Leaf| {
            !schema.db.column(leaf.column).is_virtual()
        })?;

        let mut groups = vec![];
        for table in self.storage_tables(class_map) {
            let assignments: Vec<(String, stmt::Expr)> = leaves
                .iter()
                .zip(&values)
                .filter(|(leaf, _)| leaf.column.table == table)
                .map(|(leaf, value)| (schema.db.column(leaf.column).name.clone(), value.clone()))
                .collect();

            if !assignments.is_empty() {
                groups.push((table, assignments));
            }
        }

        if groups.len() > 1 {
            if let Some(targets) =
                self.target_ids(class_map, &update.class, update.filter.as_ref(), update.options)?
            {
                return self.update_targets(targets, groups);
            }
        }

        let mut statements = vec![];
        for (table, assignments) in groups {
            let filter = self.write_filter(
                class_map,
                &update.class,
                update.filter.as_ref(),
                update.options,
                table,
            )?;

            statements.push(
                stmt::Update {
                    table: schema.db.table(table).name.clone(),
                    assignments,
                    filter,
                }
                .into(),
            );
        }

        Ok(statements)
    }

    /// Updates several tables of the same instances.
    ///
    /// The ids are collected into a temp table before any row changes, so
    /// assignments to columns the filter reads do not change which rows the
    /// later statements update.
    fn update_targets(
        &self,
        targets: stmt::Select,
        groups: Vec<(TableId, Vec<(String, stmt::Expr)>)>,
    ) -> Result<Vec<stmt::Statement>> {
        let schema = self.schema;

        let mut statements: Vec<stmt::Statement> = vec![
            stmt::CreateTable {
                name: TARGETS.to_string(),
                columns: vec![stmt::ColumnDef {
                    name: ID.to_string(),
                    ty: ColumnType::Integer,
                    primary_key: true,
                    not_null: true,
                    unique: false,
                    default: None,
                    collation: None,
                }],
                foreign_keys: vec![],
                temporary: true,
            }
            .into(),
            stmt::InsertSelect {
                table: TARGETS.to_string(),
                columns: vec![ID.to_string()],
                query: Box::new(targets),
            }
            .into(),
        ];

        for (table, assignments) in groups {
            let Some(id) = schema.db.find_first(table, ColumnKind::ECInstanceId) else {
                return Err(Error::internal(format!(
                    "table `{}` has no id column",
                    schema.db.table(table).name
                )));
            };

            let mut ids = stmt::Select::new(stmt::Source::table(TARGETS, None));
            ids.column(stmt::Expr::column(ID), None);

            statements.push(
                stmt::Update {
                    table: schema.db.table(table).name.clone(),
                    assignments,
                    filter: Some(stmt::Expr::in_subquery(stmt::Expr::column(id.name.clone()), ids)),
                }
                .into(),
            );
        }

        statements.push(
            stmt::Delete {
                table: TARGETS.to_string(),
                filter: None,
            }
            .into(),
        );

        Ok(statements)
    }
}
