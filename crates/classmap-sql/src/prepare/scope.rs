use super::{
    class_id_literal,
    leaf::{self, Leaf, LeafKind, SystemColumns},
};
use crate::{
    param::Accessor,
    stmt::{Expr, Select, Source, Value},
};
use classmap_core::{
    schema::{
        app::RelationshipEnd,
        db::{ColumnId, ColumnKind, ColumnType, TableId},
        mapping::{ClassMap, PropertyMap, SystemProperty},
    },
    stmt::ExprProperty,
    Error, Result, Schema,
};

/// What property references in a statement resolve against.
pub(super) enum Scope<'a> {
    /// A mapped class
    Class(ClassScope<'a>),

    /// The columns of a subquery or CTE
    Derived(DerivedScope),
}

pub(super) struct ClassScope<'a> {
    pub schema: &'a Schema,

    pub class_map: &'a ClassMap,

    /// Names a qualified reference may use for the class: its ECSQL alias
    /// and the class name
    pub names: Vec<String>,

    /// Native qualifier of each table. Column references are unqualified
    /// when unset.
    pub qualifiers: Option<Vec<(TableId, String)>>,

    /// Which column of each system property map is read
    pub system: SystemColumns,
}

pub(super) struct DerivedScope {
    /// Name the columns are qualified with in native SQL
    pub qualifier: String,

    pub outputs: Vec<Output>,
}

/// A column of a SELECT as seen by enclosing queries. One output can span
/// several native columns.
#[derive(Debug, Clone)]
pub(super) struct Output {
    /// Name references resolve against. Unaliased expressions have none and
    /// cannot be referenced.
    pub name: Option<String>,

    pub leaves: Vec<OutputLeaf>,
}

#[derive(Debug, Clone)]
pub(super) struct OutputLeaf {
    /// Name of the native column
    pub column: String,

    /// Access string of the leaf relative to the output, empty for a single
    /// column output
    pub relative: String,

    pub path: Vec<Accessor>,

    /// Declared type of the column the leaf was read from, if any
    pub ty: Option<ColumnType>,
}

/// A resolved property reference: one native expression per leaf.
#[derive(Debug, Clone)]
pub(super) struct Snippet {
    pub expr: Expr,

    pub path: Vec<Accessor>,

    /// Access string relative to the reference
    pub relative: String,

    /// The mapped column the snippet reads, for class scopes
    pub column: Option<ColumnId>,

    pub ty: Option<ColumnType>,
}

impl Scope<'_> {
    pub(super) fn snippets(&self, property: &ExprProperty) -> Result<Vec<Snippet>> {
        match self {
            Scope::Class(scope) => scope.snippets(property),
            Scope::Derived(scope) => scope.snippets(property),
        }
    }

    pub(super) fn as_class(&self) -> Option<&ClassScope<'_>> {
        match self {
            Scope::Class(scope) => Some(scope),
            Scope::Derived(_) => None,
        }
    }
}

impl<'a> ClassScope<'a> {
    pub(super) fn new(schema: &'a Schema, class_map: &'a ClassMap, alias: Option<&str>) -> Self {
        let mut names = vec![schema.app.class(class_map.class).name.clone()];
        names.extend(alias.map(str::to_string));

        ClassScope {
            schema,
            class_map,
            names,
            qualifiers: None,
            system: SystemColumns::Primary,
        }
    }

    pub(super) fn qualified(mut self, qualifiers: Vec<(TableId, String)>) -> Self {
        self.qualifiers = Some(qualifiers);
        self
    }

    pub(super) fn system_columns(mut self, system: SystemColumns) -> Self {
        self.system = system;
        self
    }

    fn accepts(&self, qualifier: &str) -> bool {
        self.names
            .iter()
            .any(|name| name.eq_ignore_ascii_case(qualifier))
    }

    fn class_name(&self) -> &str {
        &self.schema.app.class(self.class_map.class).name
    }

    /// Resolves a reference to the property path it names and the leaves
    /// under it.
    pub(super) fn resolve<'p>(&self, property: &'p ExprProperty) -> Result<(&'p str, Vec<Leaf>)> {
        let mut path = property.path.as_str();

        if let Some(qualifier) = &property.qualifier {
            if !self.accepts(qualifier) {
                return Err(Error::invalid_ecsql(format!(
                    "`{qualifier}` does not name `{}` in this statement",
                    self.class_name()
                )));
            }
        }

        let mut found = find(self.class_map, path);
        if found.is_none() && property.qualifier.is_none() {
            if let Some((qualifier, rest)) = path.split_once('.') {
                if self.accepts(qualifier) {
                    path = rest;
                    found = find(self.class_map, path);
                }
            }
        }

        let Some((map, depth)) = found else {
            return Err(Error::invalid_ecsql(format!(
                "`{}` has no property `{}`",
                self.class_name(),
                property.path
            )));
        };

        let leaves = leaf::select(leaf::leaves(map, self.system), path, depth);
        if leaves.is_empty() {
            return Err(Error::invalid_ecsql(format!(
                "property `{path}` of `{}` has no columns here",
                self.class_name()
            )));
        }

        Ok((path, leaves))
    }

    pub(super) fn snippets(&self, property: &ExprProperty) -> Result<Vec<Snippet>> {
        let (path, leaves) = self.resolve(property)?;

        leaves
            .iter()
            .map(|leaf| {
                Ok(Snippet {
                    expr: self.leaf_expr(leaf)?,
                    path: leaf.path.clone(),
                    relative: leaf::relative(&leaf.access_string, path).to_string(),
                    column: Some(leaf.column),
                    ty: Some(self.schema.db.column(leaf.column).ty),
                })
            })
            .collect()
    }

    fn qualifier(&self, table: TableId) -> Option<&str> {
        let qualifiers = self.qualifiers.as_ref()?;
        qualifiers
            .iter()
            .find(|(id, _)| *id == table)
            .map(|(_, qualifier)| qualifier.as_str())
    }

    /// Name the outer row of `table` is reached through from a correlated
    /// subquery
    fn correlation(&self, table: TableId) -> String {
        self.qualifier(table)
            .map(str::to_string)
            .unwrap_or_else(|| self.schema.db.table(table).name.clone())
    }

    pub(super) fn column_expr(&self, column: ColumnId) -> Expr {
        let name = self.schema.db.column(column).name.clone();
        match self.qualifier(column.table) {
            Some(qualifier) => Expr::qualified_column(qualifier, name),
            None => Expr::column(name),
        }
    }

    /// The native expression reading a leaf.
    ///
    /// Physical columns are read directly. Virtual columns have no storage,
    /// so their value is derived from the mapping instead.
    pub(super) fn leaf_expr(&self, leaf: &Leaf) -> Result<Expr> {
        let column = self.schema.db.column(leaf.column);
        if !column.is_virtual() {
            return Ok(self.column_expr(leaf.column));
        }

        Ok(match leaf.kind {
            LeafKind::System(SystemProperty::ECClassId) => class_id_literal(self.class_map.class),
            LeafKind::System(property) if property.is_class_id() => {
                let Some(end) = property.constraint_end() else {
                    return Err(Error::internal(format!("{property:?} has no end")));
                };

                if column.kind == ColumnKind::ECClassId {
                    let class = self
                        .schema
                        .classes_in_table(leaf.column.table)
                        .next()
                        .unwrap_or(self.class_map.class);
                    class_id_literal(class)
                } else {
                    self.constraint_class_id(end, leaf.column.table)?
                }
            }
            LeafKind::NavigationRelClassId(relationship) => class_id_literal(relationship),
            _ => Expr::Value(Value::Null),
        })
    }

    /// The class id of the instance at one end of a relationship, looked up
    /// through the constraint's instance id when the relationship does not
    /// store it.
    ///
    /// Reads the `ECClassId` of the row the end's instance id points at. When
    /// the referenced table does not store class ids either, every row in it
    /// belongs to the constraint class.
    fn constraint_class_id(&self, end: RelationshipEnd, table: TableId) -> Result<Expr> {
        let schema = self.schema;
        let class = schema.app.class(self.class_map.class);

        let Some(relationship) = class.relationship() else {
            return Err(Error::internal(format!(
                "`{}` has constraint columns but is not a relationship",
                class.name
            )));
        };
        let constraint_class = relationship.constraint(end).class;

        let Some(instance_id) = self
            .class_map
            .system(SystemProperty::instance_id(end))
            .and_then(|map| map.column_in(table))
        else {
            return Err(Error::internal(format!(
                "`{}` has no {} instance id in table `{}`",
                class.name,
                end.as_str().to_ascii_lowercase(),
                schema.db.table(table).name
            )));
        };

        let referenced = schema
            .mapping
            .get(constraint_class)
            .and_then(ClassMap::primary_table)
            .and_then(|table| {
                let class_id = schema.db.find_first(table, ColumnKind::ECClassId)?;
                let id = schema.db.find_first(table, ColumnKind::ECInstanceId)?;
                (!class_id.is_virtual()).then_some((table, class_id, id))
            });

        let Some((referenced, class_id, id)) = referenced else {
            return Ok(class_id_literal(constraint_class));
        };

        let correlation = self.correlation(table);
        let referenced_name = &schema.db.table(referenced).name;
        let alias = if referenced_name.eq_ignore_ascii_case(&correlation) {
            Some(format!("{referenced_name}_{}", end.as_str()))
        } else {
            None
        };

        let source = Source::table(referenced_name.clone(), alias);
        let inner = source.qualifier().to_string();

        let mut query = Select::new(source);
        query.column(Expr::qualified_column(&inner, class_id.name.clone()), None);
        query.filter = Some(Expr::eq(
            Expr::qualified_column(&inner, id.name.clone()),
            Expr::qualified_column(
                correlation,
                schema.db.column(instance_id).name.clone(),
            ),
        ));
        query.limit = Some(1);

        Ok(Expr::Subquery(Box::new(query)))
    }
}

/// Finds the map a path resolves to and how many segments the path goes
/// below it. Only points and navigation properties can be reached below
/// their own access string.
fn find<'m>(class_map: &'m ClassMap, path: &str) -> Option<(&'m PropertyMap, usize)> {
    if let Some(map) = class_map.find(path) {
        return Some((map, 0));
    }

    let (parent, _) = path.rsplit_once('.')?;
    match class_map.find(parent)? {
        map @ (PropertyMap::Primitive(_) | PropertyMap::Navigation(_)) => Some((map, 1)),
        _ => None,
    }
}

impl DerivedScope {
    fn snippets(&self, property: &ExprProperty) -> Result<Vec<Snippet>> {
        let mut path = property.path.as_str();

        match &property.qualifier {
            Some(qualifier) if !qualifier.eq_ignore_ascii_case(&self.qualifier) => {
                return Err(Error::invalid_ecsql(format!(
                    "`{qualifier}` does not name `{}` in this statement",
                    self.qualifier
                )));
            }
            Some(_) => {}
            None => {
                if let Some((qualifier, rest)) = path.split_once('.') {
                    if qualifier.eq_ignore_ascii_case(&self.qualifier)
                        && self.output(path).is_none()
                    {
                        path = rest;
                    }
                }
            }
        }

        let Some((output, rest)) = self.output(path) else {
            return Err(Error::invalid_ecsql(format!(
                "`{}` has no column `{path}`",
                self.qualifier
            )));
        };

        let depth = if rest.is_empty() {
            0
        } else {
            rest.split('.').count()
        };

        let snippets: Vec<Snippet> = output
            .leaves
            .iter()
            .filter(|leaf| rest.is_empty() || leaf::is_under(&leaf.relative, rest))
            .map(|leaf| Snippet {
                expr: Expr::qualified_column(&self.qualifier, leaf.column.clone()),
                path: leaf.path[depth.min(leaf.path.len())..].to_vec(),
                relative: if rest.is_empty() {
                    leaf.relative.clone()
                } else {
                    leaf::relative(&leaf.relative, rest).to_string()
                },
                column: None,
                ty: leaf.ty,
            })
            .collect();

        if snippets.is_empty() {
            return Err(Error::invalid_ecsql(format!(
                "`{}` has no column `{path}`",
                self.qualifier
            )));
        }

        Ok(snippets)
    }

    /// The output `path` starts with, and the rest of the path below it
    fn output<'p>(&self, path: &'p str) -> Option<(&Output, &'p str)> {
        self.outputs.iter().find_map(|output| {
            let name = output.name.as_deref()?;
            if !leaf::is_under(path, name) {
                return None;
            }
            Some((output, leaf::relative(path, name)))
        })
    }
}

impl Output {
    /// An output made of resolved snippets, named `name`
    pub(super) fn from_snippets(name: Option<String>, snippets: &[Snippet]) -> Output {
        let base = name.clone().unwrap_or_default();
        let leaves = snippets
            .iter()
            .map(|snippet| OutputLeaf {
                column: native_name(&base, &snippet.relative),
                relative: snippet.relative.clone(),
                path: snippet.path.clone(),
                ty: snippet.ty,
            })
            .collect();

        Output { name, leaves }
    }

    /// Renames the output, and its native columns with it
    pub(super) fn renamed(&self, name: &str) -> Output {
        Output {
            name: Some(name.to_string()),
            leaves: self
                .leaves
                .iter()
                .map(|leaf| OutputLeaf {
                    column: native_name(name, &leaf.relative),
                    ..leaf.clone()
                })
                .collect(),
        }
    }
}

/// Native column name of a leaf of an output: the output name, followed by
/// the leaf's relative access string when the output spans several columns
pub(super) fn native_name(output: &str, relative: &str) -> String {
    if relative.is_empty() {
        output.to_string()
    } else {
        format!("{output}.{relative}")
    }
}
