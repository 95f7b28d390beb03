#![allow(unused_variables)]

use super::{
    ArrayPropertyMap, NavigationPropertyMap, PrimitivePropertyMap, PropertyMap, StructPropertyMap,
    SystemPropertyMap,
};
use crate::schema::db::{self, ColumnId, TableId};

/// Walks a property map tree.
///
/// Every method has a default implementation that recurses through the
/// matching free function, so implementors only override what they care
/// about.
pub trait Visit {
    fn visit_property_map(&mut self, i: &PropertyMap) {
        visit_property_map(self, i);
    }

    fn visit_system(&mut self, i: &SystemPropertyMap) {
        visit_system(self, i);
    }

    fn visit_primitive(&mut self, i: &PrimitivePropertyMap) {
        visit_primitive(self, i);
    }

    fn visit_struct(&mut self, i: &StructPropertyMap) {
        visit_struct(self, i);
    }

    fn visit_array(&mut self, i: &ArrayPropertyMap) {
        visit_array(self, i);
    }

    fn visit_navigation(&mut self, i: &NavigationPropertyMap) {
        visit_navigation(self, i);
    }

    fn visit_column(&mut self, i: ColumnId) {}
}

impl<V: Visit> Visit for &mut V {
    fn visit_property_map(&mut self, i: &PropertyMap) {
        Visit::visit_property_map(&mut **self, i);
    }

    fn visit_system(&mut self, i: &SystemPropertyMap) {
        Visit::visit_system(&mut **self, i);
    }

    fn visit_primitive(&mut self, i: &PrimitivePropertyMap) {
        Visit::visit_primitive(&mut **self, i);
    }

    fn visit_struct(&mut self, i: &StructPropertyMap) {
        Visit::visit_struct(&mut **self, i);
    }

    fn visit_array(&mut self, i: &ArrayPropertyMap) {
        Visit::visit_array(&mut **self, i);
    }

    fn visit_navigation(&mut self, i: &NavigationPropertyMap) {
        Visit::visit_navigation(&mut **self, i);
    }

    fn visit_column(&mut self, i: ColumnId) {
        Visit::visit_column(&mut **self, i);
    }
}

pub fn visit_property_map<V>(v: &mut V, node: &PropertyMap)
where
    V: Visit + ?Sized,
{
    match node {
        PropertyMap::System(map) => v.visit_system(map),
        PropertyMap::Primitive(map) => v.visit_primitive(map),
        PropertyMap::Struct(map) => v.visit_struct(map),
        PropertyMap::Array(map) => v.visit_array(map),
        PropertyMap::Navigation(map) => v.visit_navigation(map),
    }
}

pub fn visit_system<V>(v: &mut V, node: &SystemPropertyMap)
where
    V: Visit + ?Sized,
{
    for column in &node.columns {
        v.visit_column(*column);
    }
}

pub fn visit_primitive<V>(v: &mut V, node: &PrimitivePropertyMap)
where
    V: Visit + ?Sized,
{
    for column in &node.columns {
        v.visit_column(*column);
    }
}

pub fn visit_struct<V>(v: &mut V, node: &StructPropertyMap)
where
    V: Visit + ?Sized,
{
    for member in &node.members {
        v.visit_property_map(member);
    }
}

pub fn visit_array<V>(v: &mut V, node: &ArrayPropertyMap)
where
    V: Visit + ?Sized,
{
    v.visit_column(node.column);
}

pub fn visit_navigation<V>(v: &mut V, node: &NavigationPropertyMap)
where
    V: Visit + ?Sized,
{
    if let Some(id) = node.id {
        v.visit_column(id);
    }
    if let Some(rel_class_id) = node.rel_class_id {
        v.visit_column(rel_class_id);
    }
}

/// Collects the flat, ordered list of columns a property map touches.
///
/// Callers use the virtual count to decide things like "every column is
/// virtual, leave the property out of the INSERT" without matching on the
/// map's variant.
pub struct GetColumnsVisitor<'a> {
    db: &'a db::Schema,
    table: Option<TableId>,
    columns: Vec<ColumnId>,
    virtual_count: usize,
}

impl<'a> GetColumnsVisitor<'a> {
    pub fn new(db: &'a db::Schema) -> GetColumnsVisitor<'a> {
        GetColumnsVisitor {
            db,
            table: None,
            columns: vec![],
            virtual_count: 0,
        }
    }

    /// Only collect columns of the given table
    pub fn in_table(db: &'a db::Schema, table: TableId) -> GetColumnsVisitor<'a> {
        GetColumnsVisitor {
            table: Some(table),
            ..GetColumnsVisitor::new(db)
        }
    }

    /// Convenience for visiting one map and returning the visitor
    pub fn collect(db: &'a db::Schema, map: &PropertyMap) -> GetColumnsVisitor<'a> {
        let mut visitor = GetColumnsVisitor::new(db);
        visitor.visit_property_map(map);
        visitor
    }

    pub fn columns(&self) -> &[ColumnId] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<ColumnId> {
        self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn virtual_column_count(&self) -> usize {
        self.virtual_count
    }

    /// True if there is at least one column and none of them has storage
    pub fn all_virtual(&self) -> bool {
        !self.columns.is_empty() && self.virtual_count == self.columns.len()
    }
}

impl Visit for GetColumnsVisitor<'_> {
    fn visit_column(&mut self, i: ColumnId) {
        if self.table.is_some_and(|table| table != i.table) {
            return;
        }

        if self.db.column(i).is_virtual() {
            self.virtual_count += 1;
        }

        self.columns.push(i);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{
        app::{ClassId, Direction},
        db::{ColumnKind, ColumnType, PersistenceType, TableType},
    };

    #[test]
    fn counts_virtual_columns() {
        let mut db = db::Schema::default();
        let foo = db.create_table("Foo", TableType::Primary).unwrap();
        let id = db
            .add_column(foo, "ParentId", ColumnKind::Data, ColumnType::Integer, PersistenceType::Physical)
            .unwrap();
        let rel = db
            .add_column(foo, "ParentRelECClassId", ColumnKind::Data, ColumnType::Integer, PersistenceType::Virtual)
            .unwrap();

        let map = PropertyMap::Navigation(NavigationPropertyMap {
            access_string: "Parent".to_string(),
            relationship: ClassId(10),
            direction: Direction::Forward,
            id: Some(id),
            rel_class_id: Some(rel),
        });

        let visitor = GetColumnsVisitor::collect(&db, &map);
        assert_eq!(visitor.columns(), &[id, rel]);
        assert_eq!(visitor.column_count(), 2);
        assert_eq!(visitor.virtual_column_count(), 1);
        assert!(!visitor.all_virtual());
    }

    #[test]
    fn filters_by_table() {
        let mut db = db::Schema::default();
        let a = db.create_table("A", TableType::Primary).unwrap();
        let b = db.create_table("A_Overflow", TableType::Overflow).unwrap();
        let a_id = db
            .add_column(a, "Id", ColumnKind::ECInstanceId, ColumnType::Integer, PersistenceType::Physical)
            .unwrap();
        let b_id = db
            .add_column(b, "Id", ColumnKind::ECInstanceId, ColumnType::Integer, PersistenceType::Physical)
            .unwrap();

        let map = PropertyMap::System(SystemPropertyMap {
            property: crate::schema::mapping::SystemProperty::ECInstanceId,
            columns: vec![a_id, b_id],
        });

        let mut visitor = GetColumnsVisitor::in_table(&db, b);
        visitor.visit_property_map(&map);
        assert_eq!(visitor.columns(), &[b_id]);
    }
}
