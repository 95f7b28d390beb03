use super::{Formatter, Params, ToSql};

use classmap_core::stmt::Value;
use std::fmt::Write;

/// Literals are written inline. Only scalar values reach the serializer;
/// the preparer decomposes everything else first.
impl ToSql for &Value {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        match self {
            Value::Null => f.dst.push_str("NULL"),
            Value::Bool(true) => f.dst.push('1'),
            Value::Bool(false) => f.dst.push('0'),
            Value::I64(v) => {
                let _ = write!(f.dst, "{v}");
            }
            Value::F64(v) | Value::DateTime(v) => real(*v, f.dst),
            Value::String(v) => {
                f.dst.push('\'');
                f.dst.push_str(&v.replace('\'', "''"));
                f.dst.push('\'');
            }
            Value::Bytes(v) => {
                f.dst.push_str("X'");
                for byte in v {
                    let _ = write!(f.dst, "{byte:02X}");
                }
                f.dst.push('\'');
            }
            Value::Point2d { .. }
            | Value::Point3d { .. }
            | Value::Navigation { .. }
            | Value::Struct(_)
            | Value::Array(_) => {
                debug_assert!(false, "non-scalar literal {self:?}");
                f.dst.push_str("NULL");
            }
        }
    }
}

fn real(v: f64, dst: &mut String) {
    if v.is_nan() {
        dst.push_str("NULL");
    } else if v.is_infinite() {
        dst.push_str(if v > 0.0 { "9e999" } else { "-9e999" });
    } else {
        let _ = write!(dst, "{v:?}");
    }
}
