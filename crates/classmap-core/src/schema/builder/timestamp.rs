use super::MappingContext;
use crate::{
    schema::{
        app::{Class, PrimitiveType, PropertyKind},
        db::{ColumnKind, TriggerTiming},
        mapping::PropertyMap,
    },
    Error, Result,
};

const CURRENT_TIME: &str = "julianday('now')";

impl MappingContext<'_> {
    /// Keeps the class's current-timestamp property up to date on every
    /// UPDATE that does not set it explicitly.
    pub(super) fn create_current_timestamp_trigger(&mut self, class: &Class) -> Result<()> {
        let app = self.app;

        let mut current = Some(class);
        let name = loop {
            match current {
                Some(c) => match &c.current_timestamp_property {
                    Some(name) => break name,
                    None => current = app.primary_base(c.id),
                },
                None => return Ok(()),
            }
        };

        let Some(property) = app.property(class.id, name) else {
            return Err(Error::invalid_schema(format!(
                "current timestamp property `{name}` not found on `{}`",
                class.name
            )));
        };

        if property.kind != PropertyKind::Primitive(PrimitiveType::DateTime) {
            return Err(Error::invalid_schema(format!(
                "current timestamp property `{}.{name}` must be a DateTime",
                class.name
            )));
        }

        let column = match self.mapping.class_map(class.id).find(name) {
            Some(PropertyMap::Primitive(map)) => map.columns.first().copied(),
            _ => None,
        };
        let Some(column) = column else {
            return Err(Error::internal(format!("`{name}` has no column")));
        };

        let info = self.db.column(column);
        if info.is_shared() || info.is_virtual() {
            log::debug!(
                "no current timestamp trigger for `{}.{name}`, its column is not dedicated",
                class.name
            );
            return Ok(());
        }

        let table = self.db.table(column.table);
        let trigger = format!("{}_{}_CurrentTimeStamp", table.name, info.name);
        if table.trigger(&trigger).is_some() {
            return Ok(());
        }

        let Some(id) = table.find_first(ColumnKind::ECInstanceId) else {
            return Err(Error::internal(format!(
                "table `{}` has no ECInstanceId column",
                table.name
            )));
        };

        let when = format!(
            "old.[{col}]=new.[{col}] AND old.[{col}]!={CURRENT_TIME}",
            col = info.name
        );
        let body = format!(
            "UPDATE [{table}] SET [{col}]={CURRENT_TIME} WHERE [{id}]=new.[{id}];",
            table = table.name,
            col = info.name,
            id = id.name
        );

        log::debug!("creating trigger `{trigger}`");
        self.db.column_mut(column).default_expr = Some(CURRENT_TIME.to_string());
        self.db
            .add_trigger(column.table, trigger, TriggerTiming::AfterUpdate, Some(when), body);

        Ok(())
    }
}
