use super::{Formatter, ToSql};

use crate::param::ParamSlot;

pub trait Params {
    fn push(&mut self, slot: &ParamSlot) -> Placeholder;
}

/// 1-based position of a native parameter
pub struct Placeholder(pub usize);

impl Params for Vec<ParamSlot> {
    fn push(&mut self, slot: &ParamSlot) -> Placeholder {
        self.push(slot.clone());
        Placeholder(self.len())
    }
}

impl ToSql for Placeholder {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        use std::fmt::Write;

        let _ = write!(f.dst, "?{}", self.0);
    }
}
