//! Decomposition of ECSQL values into the scalars the engine stores.
//!
//! A property can span several columns. Each column is reached from the
//! property's value through a path of [`Accessor`]s: a point column through
//! its coordinate, a struct member column through the member names, and so
//! on. The same paths are used in both directions: to split bound values
//! into native parameters and to rebuild property values from result rows.

use classmap_core::{err, schema::db::ColumnType, stmt::Value, Error, Result};
use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Accessor {
    X,
    Y,
    Z,
    /// Id of the instance a navigation value points at
    NavigationId,
    /// Relationship class of a navigation value
    NavigationRelClassId,
    /// Struct member, by name
    Member(String),
    /// The whole array, encoded as JSON text
    Json,
}

/// A native parameter. Its value is taken from the ECSQL parameter `param`
/// (1-based) by following `path`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParamSlot {
    pub param: usize,
    pub path: Vec<Accessor>,
}

impl ParamSlot {
    pub fn new(param: usize, path: Vec<Accessor>) -> ParamSlot {
        ParamSlot { param, path }
    }

    /// The native value of this slot given the value bound to the ECSQL
    /// parameter.
    pub fn extract(&self, value: &Value) -> Result<Value> {
        extract(value, &self.path)
    }
}

/// Follows `path` into `value` and returns the scalar found there.
///
/// A null anywhere along the path yields null.
pub fn extract(value: &Value, path: &[Accessor]) -> Result<Value> {
    let Some((accessor, rest)) = path.split_first() else {
        return scalar(value);
    };

    let inner = match (accessor, value) {
        (_, Value::Null) => return Ok(Value::Null),
        (Accessor::X, Value::Point2d { x, .. } | Value::Point3d { x, .. }) => Value::F64(*x),
        (Accessor::Y, Value::Point2d { y, .. } | Value::Point3d { y, .. }) => Value::F64(*y),
        (Accessor::Z, Value::Point3d { z, .. }) => Value::F64(*z),
        (Accessor::NavigationId, Value::Navigation { id, .. }) => Value::I64(*id),
        (Accessor::NavigationId, Value::I64(id)) => Value::I64(*id),
        (Accessor::NavigationRelClassId, Value::Navigation { rel_class_id, .. }) => {
            Value::from(*rel_class_id)
        }
        (Accessor::NavigationRelClassId, Value::I64(_)) => Value::Null,
        (Accessor::Member(name), Value::Struct(members)) => members
            .iter()
            .find(|(member, _)| member.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.clone())
            .unwrap_or_default(),
        (Accessor::Json, Value::Array(_)) => Value::String(value.to_json()?.to_string()),
        (accessor, value) => {
            return Err(Error::invalid_binding(format!(
                "cannot take {accessor:?} of {}",
                describe(value)
            )))
        }
    };

    extract(&inner, rest)
}

/// Checks that every member of a bound struct is reached by one of the
/// `paths` taken into it. Misspelled members would otherwise be dropped.
pub fn check_members(value: &Value, paths: &[&[Accessor]]) -> Result<()> {
    let Value::Struct(members) = value else {
        return Ok(());
    };

    // Shape mismatches are reported by `extract`
    if paths.is_empty()
        || !paths
            .iter()
            .all(|path| matches!(path.first(), Some(Accessor::Member(_))))
    {
        return Ok(());
    }

    for (name, member) in members {
        let rest: Vec<&[Accessor]> = paths
            .iter()
            .filter_map(|path| match path.split_first() {
                Some((Accessor::Member(m), rest)) if m.eq_ignore_ascii_case(name) => Some(rest),
                _ => None,
            })
            .collect();

        if rest.is_empty() {
            return Err(Error::invalid_binding(format!(
                "struct has no member `{name}`"
            )));
        }

        check_members(member, &rest)?;
    }

    Ok(())
}

fn scalar(value: &Value) -> Result<Value> {
    match value {
        Value::DateTime(v) => Ok(Value::F64(*v)),
        value if value.is_scalar() => Ok(value.clone()),
        value => Err(Error::invalid_binding(format!(
            "expected a single value, got {}",
            describe(value)
        ))),
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::I64(_) => "an integer",
        Value::F64(_) => "a double",
        Value::String(_) => "a string",
        Value::Bytes(_) => "a blob",
        Value::DateTime(_) => "a date time",
        Value::Point2d { .. } => "a 2d point",
        Value::Point3d { .. } => "a 3d point",
        Value::Navigation { .. } => "a navigation value",
        Value::Struct(_) => "a struct",
        Value::Array(_) => "an array",
    }
}

/// Undoes the engine's numeric affinity: a whole number stored in a
/// floating point column may come back as an integer.
pub fn coerce(value: Value, ty: Option<ColumnType>) -> Value {
    match (ty, value) {
        (Some(ColumnType::DateTime | ColumnType::Double), Value::I64(v)) => Value::F64(v as f64),
        (_, value) => value,
    }
}

/// Rebuilds a property value from the scalars read for each of its columns.
///
/// This is the inverse of [`extract`]: every leaf carries the path the
/// column is reached through.
pub fn assemble(leaves: Vec<(&[Accessor], Value)>) -> Result<Value> {
    let Some(first) = leaves.first().map(|(path, _)| path.first().cloned()) else {
        return Ok(Value::Null);
    };

    match first {
        None => Ok(leaves.into_iter().next().map(|(_, v)| v).unwrap_or_default()),
        Some(Accessor::X | Accessor::Y | Accessor::Z) => assemble_point(leaves),
        Some(Accessor::NavigationId | Accessor::NavigationRelClassId) => {
            assemble_navigation(leaves)
        }
        Some(Accessor::Member(_)) => assemble_struct(leaves),
        Some(Accessor::Json) => {
            let Some((_, value)) = leaves.into_iter().next() else {
                return Ok(Value::Null);
            };
            match value {
                Value::Null => Ok(Value::Null),
                Value::String(text) => {
                    let json: serde_json::Value = serde_json::from_str(&text)
                        .map_err(|e| err!("array column holds invalid JSON: {e}"))?;
                    Ok(Value::from_json(&json))
                }
                value => Err(Error::internal(format!(
                    "array column holds {}",
                    describe(&value)
                ))),
            }
        }
    }
}

fn assemble_point(leaves: Vec<(&[Accessor], Value)>) -> Result<Value> {
    let mut coordinates: [Option<Value>; 3] = Default::default();

    for (path, value) in leaves {
        let slot = match path {
            [Accessor::X] => 0,
            [Accessor::Y] => 1,
            [Accessor::Z] => 2,
            _ => return Err(Error::internal(format!("unexpected point column {path:?}"))),
        };
        coordinates[slot] = Some(value);
    }

    let [x, y, z] = coordinates.map(|value| value.and_then(|value| value.as_f64()));
    Ok(match (x, y, z) {
        (Some(x), Some(y), Some(z)) => Value::Point3d { x, y, z },
        (Some(x), Some(y), None) => Value::Point2d { x, y },
        _ => Value::Null,
    })
}

fn assemble_navigation(leaves: Vec<(&[Accessor], Value)>) -> Result<Value> {
    let mut id = None;
    let mut rel_class_id = None;

    for (path, value) in leaves {
        match path {
            [Accessor::NavigationId] => id = value.as_i64(),
            [Accessor::NavigationRelClassId] => rel_class_id = value.as_i64(),
            _ => {
                return Err(Error::internal(format!(
                    "unexpected navigation column {path:?}"
                )))
            }
        }
    }

    Ok(match id {
        Some(id) => Value::Navigation { id, rel_class_id },
        None => Value::Null,
    })
}

fn assemble_struct(leaves: Vec<(&[Accessor], Value)>) -> Result<Value> {
    let mut members: IndexMap<String, Vec<(&[Accessor], Value)>> = IndexMap::new();

    for (path, value) in leaves {
        let Some((Accessor::Member(name), rest)) = path.split_first() else {
            return Err(Error::internal(format!("unexpected struct column {path:?}")));
        };
        members.entry(name.clone()).or_default().push((rest, value));
    }

    let mut all_null = true;
    let mut out = IndexMap::with_capacity(members.len());
    for (name, leaves) in members {
        let value = assemble(leaves)?;
        all_null &= value.is_null();
        out.insert(name, value);
    }

    Ok(if all_null {
        Value::Null
    } else {
        Value::Struct(out)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn member(name: &str) -> Accessor {
        Accessor::Member(name.to_string())
    }

    #[test]
    fn extract_struct_member_point() {
        let value = Value::structure([
            ("Name", Value::from("a")),
            ("Loc", Value::Point2d { x: 1.0, y: 2.0 }),
        ]);

        assert_eq!(
            extract(&value, &[member("loc"), Accessor::Y]).unwrap(),
            Value::F64(2.0)
        );
        assert_eq!(
            extract(&value, &[member("Missing")]).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn whole_numbers_in_real_columns_read_back_as_doubles() {
        assert_eq!(
            coerce(Value::I64(2451545), Some(ColumnType::DateTime)),
            Value::F64(2451545.0)
        );
        assert_eq!(coerce(Value::I64(2), Some(ColumnType::Double)), Value::F64(2.0));
        assert_eq!(coerce(Value::I64(2), Some(ColumnType::Integer)), Value::I64(2));
        assert_eq!(coerce(Value::I64(2), None), Value::I64(2));
    }

    #[test]
    fn unknown_struct_members_are_rejected() {
        let street = [member("Street")];
        let city = [member("Addr"), member("City")];
        let paths: Vec<&[Accessor]> = vec![&street, &city];

        let value = Value::structure([("street", Value::from("Main"))]);
        assert!(check_members(&value, &paths).is_ok());

        let value = Value::structure([("Stret", Value::from("Main"))]);
        assert!(check_members(&value, &paths).unwrap_err().is_invalid_binding());

        let value = Value::structure([(
            "Addr",
            Value::structure([("Town", Value::from("x"))]),
        )]);
        assert!(check_members(&value, &paths).unwrap_err().is_invalid_binding());
    }

    #[test]
    fn extract_navigation_accepts_plain_id() {
        assert_eq!(
            extract(&Value::I64(7), &[Accessor::NavigationId]).unwrap(),
            Value::I64(7)
        );
        assert_eq!(
            extract(&Value::I64(7), &[Accessor::NavigationRelClassId]).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn extract_rejects_mismatched_shapes() {
        let err = extract(&Value::from("x"), &[Accessor::X]).unwrap_err();
        assert!(err.is_invalid_binding());

        let err = extract(&Value::Point2d { x: 0.0, y: 0.0 }, &[]).unwrap_err();
        assert!(err.is_invalid_binding());
    }

    #[test]
    fn date_times_are_stored_as_doubles() {
        assert_eq!(
            extract(&Value::DateTime(2451545.0), &[]).unwrap(),
            Value::F64(2451545.0)
        );
    }

    #[test]
    fn assemble_struct_with_point_and_array() {
        let loc_x = [member("Loc"), Accessor::X];
        let loc_y = [member("Loc"), Accessor::Y];
        let tags = [member("Tags"), Accessor::Json];

        let value = assemble(vec![
            (&loc_x[..], Value::F64(1.0)),
            (&loc_y[..], Value::F64(2.0)),
            (&tags[..], Value::from(r#"["a","b"]"#)),
        ])
        .unwrap();

        assert_eq!(
            value,
            Value::structure([
                ("Loc", Value::Point2d { x: 1.0, y: 2.0 }),
                ("Tags", Value::Array(vec![Value::from("a"), Value::from("b")])),
            ])
        );
    }

    #[test]
    fn all_null_members_assemble_to_null() {
        let street = [member("Street")];
        let value = assemble(vec![(&street[..], Value::Null)]).unwrap();
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn navigation_without_id_is_null() {
        let id = [Accessor::NavigationId];
        let rel = [Accessor::NavigationRelClassId];
        let value = assemble(vec![(&id[..], Value::Null), (&rel[..], Value::I64(3))]).unwrap();
        assert_eq!(value, Value::Null);
    }
}
