use super::{
    class_id_literal,
    leaf::{self, SystemColumns},
    scope::{ClassScope, DerivedScope, Output, OutputLeaf, Scope, Snippet},
    Preparer,
};
use crate::stmt::{self, Expr, Join, Source};
use classmap_core::{
    schema::{
        app::ClassId,
        db::{ColumnKind, TableId},
        mapping::{ClassMap, SystemProperty},
    },
    stmt::{self as ecsql, ExprProperty, FromItem},
    Error, Result,
};

impl<'a> Preparer<'a> {
    /// Lowers a SELECT and returns it together with the outputs enclosing
    /// queries can reference.
    pub(super) fn prepare_select(
        &mut self,
        select: &'a ecsql::Select,
    ) -> Result<(stmt::Select, Vec<Output>)> {
        let mut ctes = vec![];

        for cte in &select.with {
            let (query, outputs) = self.prepare_select(&cte.query)?;

            let (columns, outputs) = if cte.columns.is_empty() {
                (vec![], outputs)
            } else {
                if cte.columns.len() != outputs.len() {
                    return Err(Error::invalid_ecsql(format!(
                        "CTE `{}` names {} columns but its query selects {}",
                        cte.name,
                        cte.columns.len(),
                        outputs.len()
                    )));
                }

                let outputs: Vec<Output> = outputs
                    .iter()
                    .zip(&cte.columns)
                    .map(|(output, name)| output.renamed(name))
                    .collect();
                let columns = outputs
                    .iter()
                    .flat_map(|output| output.leaves.iter().map(|leaf| leaf.column.clone()))
                    .collect();
                (columns, outputs)
            };

            ctes.push(stmt::Cte {
                name: cte.name.clone(),
                columns,
                query,
            });
            self.ctes.push((cte.name.clone(), outputs));
        }

        let prepared = self.prepare_select_body(select, ctes);
        self.ctes.truncate(self.ctes.len() - select.with.len());
        prepared
    }

    fn prepare_select_body(
        &mut self,
        select: &'a ecsql::Select,
        ctes: Vec<stmt::Cte>,
    ) -> Result<(stmt::Select, Vec<Output>)> {
        let mut filters = vec![];

        let (mut query, scope) = match &select.from {
            FromItem::Class(class) => {
                let class_map = self.class_map(class)?;

                if class_map.strategy.is_end_table_relationship() {
                    self.relationship_source(class_map, class, &mut filters)?
                } else {
                    let (query, scope) = self.class_view(class_map, class.alias.as_deref())?;
                    if let Some(class_id_filter) =
                        self.class_id_filter(class_map, class, ecsql::Options::default())
                    {
                        filters.push(class_id_filter.to_expr(&scope));
                    }
                    (query, Scope::Class(scope))
                }
            }
            FromItem::Subquery { query, alias } => {
                let (inner, outputs) = self.prepare_select(query)?;
                let source = Source::Subquery {
                    query: Box::new(inner),
                    alias: alias.clone(),
                };
                let scope = DerivedScope {
                    qualifier: alias.clone(),
                    outputs,
                };
                (stmt::Select::new(source), Scope::Derived(scope))
            }
            FromItem::Cte { name, alias } => {
                let Some((cte_name, outputs)) = self
                    .ctes
                    .iter()
                    .rev()
                    .find(|(cte_name, _)| cte_name.eq_ignore_ascii_case(name))
                else {
                    return Err(Error::invalid_ecsql(format!("no CTE named `{name}`")));
                };

                let scope = DerivedScope {
                    qualifier: alias.clone().unwrap_or_else(|| cte_name.clone()),
                    outputs: outputs.clone(),
                };
                let source = Source::table(cte_name.clone(), alias.clone());
                (stmt::Select::new(source), Scope::Derived(scope))
            }
        };

        query.with = ctes;

        let mut outputs = vec![];

        if select.columns.is_empty() {
            match &scope {
                Scope::Class(class_scope) => {
                    for map in class_scope.class_map.property_maps.iter() {
                        if leaf::leaves(map, class_scope.system).is_empty() {
                            continue;
                        }

                        let path = map.access_string().to_string();
                        let snippets = class_scope.snippets(&ExprProperty {
                            qualifier: None,
                            path: path.clone(),
                        })?;
                        outputs.push(push_output(&mut query, Some(path), &snippets));
                    }
                }
                Scope::Derived(derived) => {
                    for output in &derived.outputs {
                        for leaf in &output.leaves {
                            query.column(
                                Expr::qualified_column(&derived.qualifier, leaf.column.clone()),
                                Some(leaf.column.clone()),
                            );
                        }
                        outputs.push(output.clone());
                    }
                }
            }
        }

        for (index, item) in select.columns.iter().enumerate() {
            match &item.expr {
                ecsql::Expr::Property(property) => {
                    let snippets = scope.snippets(property)?;
                    let name = item.alias.clone().unwrap_or_else(|| property.path.clone());
                    outputs.push(push_output(&mut query, Some(name), &snippets));
                }
                expr => {
                    let lowered = self.lower_expr(Some(&scope), expr)?;
                    let column = item
                        .alias
                        .clone()
                        .unwrap_or_else(|| format!("expr{}", index + 1));
                    query.column(lowered, Some(column.clone()));
                    outputs.push(Output {
                        name: item.alias.clone(),
                        leaves: vec![OutputLeaf {
                            column,
                            relative: String::new(),
                            path: vec![],
                            ty: None,
                        }],
                    });
                }
            }
        }

        if let Some(filter) = &select.filter {
            filters.insert(0, self.lower_expr(Some(&scope), filter)?);
        }
        query.filter = Expr::and_from_vec(filters);

        Ok((query, outputs))
    }

    /// The primary table of a class LEFT JOINed with its other tables on the
    /// instance id, and the scope resolving properties against it.
    pub(super) fn class_view(
        &self,
        class_map: &'a ClassMap,
        alias: Option<&str>,
    ) -> Result<(stmt::Select, ClassScope<'a>)> {
        let schema = self.schema;
        let tables = self.storage_tables(class_map);

        let (Some(primary), Some(&first)) = (class_map.primary_table(), tables.first()) else {
            return Err(Error::invalid_ecsql(format!(
                "`{}` has no table to read from",
                self.class_name(class_map.class)
            )));
        };
        if primary != first {
            return Err(Error::invalid_ecsql(format!(
                "`{}` is mapped to a virtual table and cannot be queried",
                self.class_name(class_map.class)
            )));
        }

        let primary_name = schema.db.table(primary).name.clone();
        let qualifier = alias.map(str::to_string).unwrap_or_else(|| primary_name.clone());
        let primary_id = id_column(self, primary)?;

        let mut query = stmt::Select::new(Source::table(primary_name, alias.map(str::to_string)));
        let mut qualifiers = vec![(primary, qualifier.clone())];

        for &table in &tables[1..] {
            let name = schema.db.table(table).name.clone();
            let id = id_column(self, table)?;

            query.joins.push(Join {
                source: Source::table(name.clone(), None),
                on: Expr::eq(
                    Expr::qualified_column(&name, id),
                    Expr::qualified_column(&qualifier, primary_id.clone()),
                ),
            });
            qualifiers.push((table, name));
        }

        let scope = ClassScope::new(schema, class_map, alias).qualified(qualifiers);
        Ok((query, scope))
    }

    /// Source of a SELECT over a relationship stored as a foreign key.
    ///
    /// Only rows whose navigation property is set are relationship
    /// instances. The relationship must be stored in a single table.
    fn relationship_source(
        &self,
        class_map: &'a ClassMap,
        class: &ecsql::ClassRef,
        filters: &mut Vec<Expr>,
    ) -> Result<(stmt::Select, Scope<'a>)> {
        let schema = self.schema;

        let [table] = class_map.tables[..] else {
            return Err(Error::invalid_ecsql(format!(
                "`{}` is stored in {} tables and cannot be queried directly",
                self.class_name(class_map.class),
                class_map.tables.len()
            )));
        };
        let Some(end) = class_map.strategy.foreign_key_end() else {
            return Err(Error::internal("not an end-table relationship"));
        };

        let name = schema.db.table(table).name.clone();
        let qualifier = class.alias.clone().unwrap_or_else(|| name.clone());
        let query = stmt::Select::new(Source::table(name, class.alias.clone()));
        let scope = ClassScope::new(schema, class_map, class.alias.as_deref())
            .qualified(vec![(table, qualifier)])
            .system_columns(SystemColumns::In(table));

        if let Some(other_id) = class_map
            .system(SystemProperty::instance_id(end.other()))
            .and_then(|map| map.column_in(table))
        {
            filters.push(Expr::is_not_null(scope.column_expr(other_id)));
        }

        // Derived relationships share the navigation columns of their base
        let shares_columns = schema.app.primary_base(class_map.class).is_some_and(|base| {
            schema
                .mapping
                .get(base.id)
                .is_some_and(|map| map.strategy.is_end_table_relationship())
        });

        if let Some(rel_class_id) = class_map
            .system(SystemProperty::ECClassId)
            .and_then(|map| map.column_in(table))
            .filter(|column| !schema.db.column(*column).is_virtual())
        {
            if class.only || shares_columns {
                let classes: Vec<ClassId> = if class.only {
                    vec![class_map.class]
                } else {
                    let mut classes = schema.app.class_and_derived(class_map.class);
                    classes.sort();
                    classes
                };
                filters.push(Expr::in_list(
                    scope.column_expr(rel_class_id),
                    classes.into_iter().map(class_id_literal).collect(),
                ));
            }
        }

        Ok((query, Scope::Class(scope)))
    }
}

/// Adds the native columns of a resolved property to the select list and
/// returns the output describing them.
fn push_output(query: &mut stmt::Select, name: Option<String>, snippets: &[Snippet]) -> Output {
    let output = Output::from_snippets(name, snippets);
    for (snippet, leaf) in snippets.iter().zip(&output.leaves) {
        query.column(snippet.expr.clone(), Some(leaf.column.clone()));
    }
    output
}

fn id_column(preparer: &Preparer<'_>, table: TableId) -> Result<String> {
    match preparer.schema.db.find_first(table, ColumnKind::ECInstanceId) {
        Some(column) => Ok(column.name.clone()),
        None => Err(Error::internal(format!(
            "table `{}` has no id column",
            preparer.schema.db.table(table).name
        ))),
    }
}
