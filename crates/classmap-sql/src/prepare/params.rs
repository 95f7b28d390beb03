use super::ParamInfo;
use by_address::ByAddress;
use classmap_core::{
    stmt::{Expr, FromItem, Param, Select, Statement},
    Error, Result,
};
use std::collections::HashMap;

/// Numbers the parameters of an ECSQL statement.
///
/// Positional parameters are numbered in the order they appear. A named
/// parameter gets a number the first time it appears and keeps it for every
/// later occurrence. Parameter nodes are keyed by address: two `?` in the same
/// statement are equal as values but are different parameters.
#[derive(Debug)]
pub(super) struct ParamRegistry<'a> {
    indexes: HashMap<ByAddress<&'a Expr>, usize>,
    params: Vec<ParamInfo>,
}

impl<'a> ParamRegistry<'a> {
    pub(super) fn collect(statement: &'a Statement) -> ParamRegistry<'a> {
        let mut registry = ParamRegistry {
            indexes: HashMap::new(),
            params: vec![],
        };

        match statement {
            Statement::Insert(insert) => {
                for value in &insert.values {
                    registry.visit_expr(value);
                }
            }
            Statement::Update(update) => {
                for assignment in &update.assignments {
                    registry.visit_expr(&assignment.value);
                }
                if let Some(filter) = &update.filter {
                    registry.visit_expr(filter);
                }
            }
            Statement::Delete(delete) => {
                if let Some(filter) = &delete.filter {
                    registry.visit_expr(filter);
                }
            }
            Statement::Select(select) => registry.visit_select(select),
        }

        registry
    }

    /// The 1-based index of a parameter expression of the statement
    pub(super) fn index_of(&self, expr: &'a Expr) -> Result<usize> {
        self.indexes
            .get(&ByAddress(expr))
            .copied()
            .ok_or_else(|| Error::internal("parameter was not numbered"))
    }

    pub(super) fn into_params(self) -> Vec<ParamInfo> {
        self.params
    }

    fn visit_select(&mut self, select: &'a Select) {
        for cte in &select.with {
            self.visit_select(&cte.query);
        }

        for item in &select.columns {
            self.visit_expr(&item.expr);
        }

        if let FromItem::Subquery { query, .. } = &select.from {
            self.visit_select(query);
        }

        if let Some(filter) = &select.filter {
            self.visit_expr(filter);
        }
    }

    fn visit_expr(&mut self, expr: &'a Expr) {
        match expr {
            Expr::And(and) => {
                for operand in &and.operands {
                    self.visit_expr(operand);
                }
            }
            Expr::Or(or) => {
                for operand in &or.operands {
                    self.visit_expr(operand);
                }
            }
            Expr::BinaryOp(binary) => {
                self.visit_expr(&binary.lhs);
                self.visit_expr(&binary.rhs);
            }
            Expr::InList(in_list) => {
                self.visit_expr(&in_list.expr);
                for item in &in_list.list {
                    self.visit_expr(item);
                }
            }
            Expr::IsNull(is_null) => self.visit_expr(&is_null.expr),
            Expr::Not(not) => self.visit_expr(&not.expr),
            Expr::Param(param) => {
                let index = match param {
                    Param::Named(name) => self.named(name),
                    Param::Positional => self.push(None),
                };
                self.indexes.insert(ByAddress(expr), index);
            }
            Expr::Property(_) | Expr::Value(_) => {}
        }
    }

    fn named(&mut self, name: &str) -> usize {
        let existing = self.params.iter().position(|param| {
            param
                .name
                .as_deref()
                .is_some_and(|n| n.eq_ignore_ascii_case(name))
        });

        match existing {
            Some(position) => position + 1,
            None => self.push(Some(name.to_string())),
        }
    }

    fn push(&mut self, name: Option<String>) -> usize {
        self.params.push(ParamInfo { name });
        self.params.len()
    }
}
