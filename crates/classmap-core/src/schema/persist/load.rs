use super::{ClassMapRecord, PropertyMapRecord, Records, TableRecord};
use crate::{
    driver::Row,
    schema::{app, app::ClassId, Schema},
    stmt::Value,
    Connection, Error, Result,
};

/// Reads the persisted mapping of `app`.
///
/// Returns `None` if the database has never been mapped.
pub fn load(app: app::Schema, conn: &mut dyn Connection) -> Result<Option<Schema>> {
    if !conn.table_exists("ec_ClassMap")? {
        return Ok(None);
    }

    let mut records = Records::default();

    for row in conn.query("SELECT [Id], [Name], [Definition] FROM [ec_Table] ORDER BY [Id]", &[])? {
        records.tables.push(TableRecord {
            id: integer(&row, 0)? as usize,
            name: text(&row, 1)?,
            definition: text(&row, 2)?,
        });
    }

    for row in conn.query(
        "SELECT [ClassId], [MapStrategy] FROM [ec_ClassMap] ORDER BY [ClassId]",
        &[],
    )? {
        records.class_maps.push(ClassMapRecord {
            class: ClassId(integer(&row, 0)? as u64),
            strategy: text(&row, 1)?,
        });
    }

    for row in conn.query(
        "SELECT [ClassId], [Ordinal], [AccessString], [TableName], [ColumnName] \
         FROM [ec_PropertyMap] ORDER BY [ClassId], [Ordinal]",
        &[],
    )? {
        records.property_maps.push(PropertyMapRecord {
            class: ClassId(integer(&row, 0)? as u64),
            ordinal: integer(&row, 1)? as usize,
            access_string: text(&row, 2)?,
            table: text(&row, 3)?,
            column: text(&row, 4)?,
        });
    }

    log::debug!(
        "loaded {} tables and {} class maps",
        records.tables.len(),
        records.class_maps.len()
    );

    records.into_schema(app).map(Some)
}

fn integer(row: &Row, index: usize) -> Result<i64> {
    match row.get(index) {
        Some(Value::I64(value)) => Ok(*value),
        other => Err(Error::invalid_schema(format!(
            "expected an integer in metadata column {index}, found {other:?}"
        ))),
    }
}

fn text(row: &Row, index: usize) -> Result<String> {
    match row.get(index) {
        Some(Value::String(value)) => Ok(value.clone()),
        other => Err(Error::invalid_schema(format!(
            "expected text in metadata column {index}, found {other:?}"
        ))),
    }
}
