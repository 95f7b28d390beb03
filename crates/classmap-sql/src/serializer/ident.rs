use super::{Formatter, Params, ToSql};

/// A bracket-quoted identifier
pub(super) struct Ident<S>(pub(super) S);

impl<S: AsRef<str>> ToSql for Ident<S> {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        let name = self.0.as_ref();

        f.dst.push('[');
        if name.contains(']') {
            f.dst.push_str(&name.replace(']', "]]"));
        } else {
            f.dst.push_str(name);
        }
        f.dst.push(']');
    }
}
