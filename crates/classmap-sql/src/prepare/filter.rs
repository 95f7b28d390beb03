use super::{
    class_id_literal,
    scope::{ClassScope, Scope},
    Preparer,
};
use crate::stmt::{Expr, Select};
use classmap_core::{
    schema::{
        app::ClassId,
        db::{ColumnId, ColumnKind, TableId},
        mapping::ClassMap,
    },
    stmt as ecsql, Error, Result,
};

/// Restricts a statement to the rows of the classes it targets, for tables
/// shared by several classes.
#[derive(Debug)]
pub(super) struct ClassIdFilter {
    column: ColumnId,

    /// Sorted class ids. A single id for `ONLY`.
    classes: Vec<ClassId>,

    only: bool,
}

impl ClassIdFilter {
    pub(super) fn to_expr(&self, scope: &ClassScope<'_>) -> Expr {
        let column = scope.column_expr(self.column);
        let mut ids: Vec<Expr> = self.classes.iter().copied().map(class_id_literal).collect();

        match (self.only, ids.len()) {
            (true, 1) => Expr::eq(column, ids.remove(0)),
            _ => Expr::in_list(column, ids),
        }
    }
}

impl<'a> Preparer<'a> {
    /// The class id filter of a statement targeting `class`, if one is
    /// needed.
    ///
    /// No filter is needed when the primary table does not store class ids,
    /// when the statement opts out, or when every class stored in the table
    /// is targeted anyway.
    pub(super) fn class_id_filter(
        &self,
        class_map: &ClassMap,
        class: &ecsql::ClassRef,
        options: ecsql::Options,
    ) -> Option<ClassIdFilter> {
        let schema = self.schema;

        if options.no_class_id_filter {
            return None;
        }

        let table = class_map.primary_table()?;
        let column = schema.db.find_first(table, ColumnKind::ECClassId)?;
        if column.is_virtual() {
            return None;
        }

        let mut classes: Vec<ClassId> = if class.only {
            vec![class_map.class]
        } else {
            schema
                .app
                .class_and_derived(class_map.class)
                .into_iter()
                .filter(|id| {
                    schema
                        .mapping
                        .get(*id)
                        .is_some_and(|map| !map.strategy.is_not_mapped())
                })
                .collect()
        };
        classes.sort();

        if schema
            .classes_in_table(table)
            .all(|hosted| classes.contains(&hosted))
        {
            return None;
        }

        Some(ClassIdFilter {
            column: column.id,
            classes,
            only: class.only,
        })
    }

    /// The WHERE clause of an UPDATE or DELETE of `table`.
    ///
    /// A filter on the primary table that only reads primary table columns
    /// is applied directly. Otherwise rows are selected by id from a view
    /// joining all tables of the class.
    pub(super) fn write_filter(
        &self,
        class_map: &'a ClassMap,
        class: &ecsql::ClassRef,
        filter: Option<&'a ecsql::Expr>,
        options: ecsql::Options,
        table: TableId,
    ) -> Result<Option<Expr>> {
        let schema = self.schema;
        let Some(primary) = class_map.primary_table() else {
            return Err(Error::internal(format!(
                "`{}` has no primary table",
                self.class_name(class_map.class)
            )));
        };

        let class_id_filter = self.class_id_filter(class_map, class, options);
        let scope = ClassScope::new(schema, class_map, class.alias.as_deref());

        let mut touched = vec![];
        if let Some(filter) = filter {
            self.referenced_tables(&scope, filter, &mut touched)?;
        }

        if table == primary && touched.iter().all(|touched| *touched == primary) {
            let mut operands = vec![];
            if let Some(class_id_filter) = &class_id_filter {
                operands.push(class_id_filter.to_expr(&scope));
            }
            if let Some(filter) = filter {
                operands.insert(0, self.lower_expr(Some(&Scope::Class(scope)), filter)?);
            }
            return Ok(Expr::and_from_vec(operands));
        }

        let Some(view) = self.target_ids(class_map, class, filter, options)? else {
            return Ok(None);
        };

        let Some(target_id) = schema.db.find_first(table, ColumnKind::ECInstanceId) else {
            return Err(Error::internal(format!(
                "table `{}` has no id column",
                schema.db.table(table).name
            )));
        };

        Ok(Some(Expr::in_subquery(
            Expr::column(target_id.name.clone()),
            view,
        )))
    }

    /// Selects the ids of the instances an UPDATE or DELETE targets, from a
    /// view joining all tables of the class. `None` when every row of the
    /// class is targeted.
    pub(super) fn target_ids(
        &self,
        class_map: &'a ClassMap,
        class: &ecsql::ClassRef,
        filter: Option<&'a ecsql::Expr>,
        options: ecsql::Options,
    ) -> Result<Option<Select>> {
        let schema = self.schema;
        let class_id_filter = self.class_id_filter(class_map, class, options);

        if filter.is_none() && class_id_filter.is_none() {
            return Ok(None);
        }

        let Some(primary) = class_map.primary_table() else {
            return Err(Error::internal(format!(
                "`{}` has no primary table",
                self.class_name(class_map.class)
            )));
        };

        let (mut view, scope) = self.class_view(class_map, class.alias.as_deref())?;
        let Some(id) = schema.db.find_first(primary, ColumnKind::ECInstanceId) else {
            return Err(Error::internal(format!(
                "table `{}` has no id column",
                schema.db.table(primary).name
            )));
        };
        view.column(scope.column_expr(id.id), None);

        let mut operands = vec![];
        if let Some(class_id_filter) = &class_id_filter {
            operands.push(class_id_filter.to_expr(&scope));
        }
        if let Some(filter) = filter {
            operands.insert(0, self.lower_expr(Some(&Scope::Class(scope)), filter)?);
        }
        view.filter = Expr::and_from_vec(operands);

        Ok(Some(view))
    }
}
