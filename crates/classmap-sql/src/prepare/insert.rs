use super::{
    leaf::{self, Leaf, LeafKind, SystemColumns},
    zip_filter_flatten, Preparer,
};
use crate::stmt::{self, Expr};
use classmap_core::{
    schema::{db::ColumnKind, mapping::PropertyMap, mapping::SystemProperty},
    stmt as ecsql, Error, Result,
};

impl<'a> Preparer<'a> {
    /// One native INSERT per table the class spans, primary table first.
    ///
    /// Values for virtual columns are dropped. The class id is added to
    /// every table that stores it, and rows in joined and overflow tables
    /// take the id of the row just inserted into the primary table unless
    /// the statement sets it explicitly.
    pub(super) fn prepare_insert(&mut self, insert: &'a ecsql::Insert) -> Result<Vec<stmt::Statement>> {
        let schema = self.schema;
        let class_map = self.class_map(&insert.class)?;
        let class = schema.app.class(class_map.class);

        if class_map.strategy.is_end_table_relationship() {
            return Err(Error::invalid_ecsql(format!(
                "cannot insert into `{}`: it is mapped as a foreign key ({}); set the navigation property instead",
                class.name,
                class_map.strategy.name()
            )));
        }

        if class.is_abstract() {
            return Err(Error::invalid_ecsql(format!(
                "cannot insert into abstract class `{}`",
                class.name
            )));
        }

        if insert.properties.len() != insert.values.len() {
            return Err(Error::invalid_ecsql(format!(
                "INSERT into `{}` lists {} properties but {} values",
                class.name,
                insert.properties.len(),
                insert.values.len()
            )));
        }

        let mut names = vec![];
        let mut values = vec![];

        for (property, value) in insert.properties.iter().zip(&insert.values) {
            let Some(map) = class_map.find(property) else {
                return Err(Error::invalid_ecsql(format!(
                    "`{}` has no property `{property}`",
                    class.name
                )));
            };

            if let PropertyMap::System(system) = map {
                if system.property == SystemProperty::ECClassId {
                    return Err(Error::invalid_ecsql(format!(
                        "ECClassId of `{}` cannot be set",
                        class.name
                    )));
                }
            }

            let leaves = leaf::leaves(map, SystemColumns::All);
            let targets: Vec<_> = leaves.iter().map(|leaf| leaf.path.clone()).collect();
            values.push(self.lower_values(None, value, &targets)?);
            names.push(leaves);
        }

        let (leaves, values) = zip_filter_flatten(names, values, |leaf: &Leaf| {
            !schema.db.column(leaf.column).is_virtual()
        })?;

        let mut statements = vec![];

        for (position, table) in self.storage_tables(class_map).into_iter().enumerate() {
            let mut columns = vec![];
            let mut row = vec![];
            let mut has_id = false;

            for (leaf, value) in leaves.iter().zip(&values) {
                if leaf.column.table != table {
                    continue;
                }
                has_id |= leaf.kind == LeafKind::System(SystemProperty::ECInstanceId);
                columns.push(schema.db.column(leaf.column).name.clone());
                row.push(value.clone());
            }

            if position > 0 && !has_id {
                if let Some(id) = schema.db.find_first(table, ColumnKind::ECInstanceId) {
                    columns.insert(0, id.name.clone());
                    row.insert(0, Expr::LastInsertRowid);
                }
            }

            self.prepare_class_id(class_map.class, table, &mut columns, &mut row);

            statements.push(
                stmt::Insert {
                    table: schema.db.table(table).name.clone(),
                    columns,
                    values: row,
                }
                .into(),
            );
        }

        if statements.is_empty() {
            return Err(Error::invalid_ecsql(format!(
                "`{}` has no table to insert into",
                class.name
            )));
        }

        Ok(statements)
    }
}
