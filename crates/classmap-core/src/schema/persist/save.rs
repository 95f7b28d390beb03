use super::{Records, METADATA_DDL};
use crate::{
    schema::{mapping::ClassMapState, Schema},
    stmt::Value,
    Connection, Result,
};

/// Creates the metadata tables if they do not exist yet.
pub fn ensure_metadata_tables(conn: &mut dyn Connection) -> Result<()> {
    conn.execute_batch(METADATA_DDL)
}

/// Writes the tables and every new or modified class map, then marks the
/// class maps persisted.
///
/// Runs inside the caller's transaction.
pub fn save(schema: &mut Schema, conn: &mut dyn Connection) -> Result<()> {
    ensure_metadata_tables(conn)?;

    let records = Records::from_schema(schema, |class_map| {
        class_map.state != ClassMapState::Persisted
    })?;

    for table in &records.tables {
        conn.exec(
            "INSERT OR REPLACE INTO [ec_Table] ([Id], [Name], [Definition]) VALUES (?1, ?2, ?3)",
            &[
                Value::I64(table.id as i64),
                Value::from(table.name.as_str()),
                Value::from(table.definition.as_str()),
            ],
        )?;
    }

    for class_map in &records.class_maps {
        let class = Value::I64(class_map.class.0 as i64);

        conn.exec(
            "DELETE FROM [ec_PropertyMap] WHERE [ClassId] = ?1",
            std::slice::from_ref(&class),
        )?;
        conn.exec(
            "INSERT OR REPLACE INTO [ec_ClassMap] ([ClassId], [MapStrategy]) VALUES (?1, ?2)",
            &[class, Value::from(class_map.strategy.as_str())],
        )?;
    }

    for property_map in &records.property_maps {
        conn.exec(
            "INSERT INTO [ec_PropertyMap] ([ClassId], [Ordinal], [AccessString], [TableName], [ColumnName]) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            &[
                Value::I64(property_map.class.0 as i64),
                Value::I64(property_map.ordinal as i64),
                Value::from(property_map.access_string.as_str()),
                Value::from(property_map.table.as_str()),
                Value::from(property_map.column.as_str()),
            ],
        )?;
    }

    log::debug!(
        "saved {} tables and {} class maps",
        records.tables.len(),
        records.class_maps.len()
    );

    for class_map in schema.mapping.classes.values_mut() {
        class_map.state = ClassMapState::Persisted;
        class_map.failed_to_load_properties.clear();
    }

    Ok(())
}
