use super::{
    scope::{ClassScope, Scope, Snippet},
    Preparer,
};
use crate::{param::Accessor, stmt::Expr, ParamSlot};
use classmap_core::{
    schema::db::TableId,
    stmt::{self as ecsql, Value},
    Error, Result,
};

impl<'a> Preparer<'a> {
    /// Lowers a value written to, or compared with, a property whose leaves
    /// are reached through `targets`. Produces one native expression per
    /// target.
    pub(super) fn lower_values(
        &self,
        scope: Option<&Scope<'_>>,
        expr: &'a ecsql::Expr,
        targets: &[Vec<Accessor>],
    ) -> Result<Vec<Expr>> {
        match expr {
            ecsql::Expr::Param(_) => {
                let index = self.params.index_of(expr)?;
                Ok(targets
                    .iter()
                    .map(|path| Expr::Param(ParamSlot::new(index, path.clone())))
                    .collect())
            }
            ecsql::Expr::Value(value) => targets.iter().map(|path| literal(value, path)).collect(),
            ecsql::Expr::Property(property) => {
                let Some(scope) = scope else {
                    return Err(Error::invalid_ecsql(format!(
                        "property `{}` cannot be referenced here",
                        property.path
                    )));
                };

                let snippets = scope.snippets(property)?;
                if snippets.len() != targets.len() {
                    return Err(Error::invalid_ecsql(format!(
                        "`{}` spans {} columns where {} are expected",
                        property.path,
                        snippets.len(),
                        targets.len()
                    )));
                }

                Ok(snippets.into_iter().map(|snippet| snippet.expr).collect())
            }
            _ if targets.len() == 1 => Ok(vec![self.lower_expr(scope, expr)?]),
            _ => Err(Error::invalid_ecsql(format!(
                "an expression cannot stand for a property spanning {} columns",
                targets.len()
            ))),
        }
    }

    /// Lowers an expression producing a single native value, such as a
    /// filter.
    pub(super) fn lower_expr(&self, scope: Option<&Scope<'_>>, expr: &'a ecsql::Expr) -> Result<Expr> {
        Ok(match expr {
            ecsql::Expr::And(and) => Expr::And(
                and.operands
                    .iter()
                    .map(|operand| self.lower_expr(scope, operand))
                    .collect::<Result<_>>()?,
            ),
            ecsql::Expr::Or(or) => Expr::Or(
                or.operands
                    .iter()
                    .map(|operand| self.lower_expr(scope, operand))
                    .collect::<Result<_>>()?,
            ),
            ecsql::Expr::Not(not) => Expr::Not(Box::new(self.lower_expr(scope, &not.expr)?)),
            ecsql::Expr::BinaryOp(binary_op) => self.lower_binary_op(scope, binary_op)?,
            ecsql::Expr::InList(in_list) => {
                let (lhs, path) = self.lower_operand(scope, &in_list.expr)?;
                let targets = [path];

                let mut list = Vec::with_capacity(in_list.list.len());
                for item in &in_list.list {
                    list.extend(self.lower_values(scope, item, &targets)?);
                }

                Expr::in_list(lhs, list)
            }
            ecsql::Expr::IsNull(is_null) => {
                let operands = match (&*is_null.expr, scope) {
                    (ecsql::Expr::Property(property), Some(scope)) => {
                        let mut snippets = scope.snippets(property)?;
                        match_navigation_on_id(&mut snippets);
                        snippets.into_iter().map(|snippet| snippet.expr).collect()
                    }
                    (expr, _) => vec![self.lower_expr(scope, expr)?],
                };

                // A value spanning several columns is null when all of them
                // are
                let checks: Vec<Expr> = operands
                    .into_iter()
                    .map(|operand| {
                        if is_null.negate {
                            Expr::is_not_null(operand)
                        } else {
                            Expr::is_null(operand)
                        }
                    })
                    .collect();

                let combined = if is_null.negate {
                    Expr::or_from_vec(checks)
                } else {
                    Expr::and_from_vec(checks)
                };
                combined.ok_or_else(|| Error::internal("IS NULL without operand"))?
            }
            ecsql::Expr::Param(_) => Expr::Param(ParamSlot::new(self.params.index_of(expr)?, vec![])),
            ecsql::Expr::Property(_) => self.lower_operand(scope, expr)?.0,
            ecsql::Expr::Value(value) => literal(value, &[])?,
        })
    }

    /// Lowers an operand that must be a single native value, along with the
    /// path values compared with it go through.
    fn lower_operand(
        &self,
        scope: Option<&Scope<'_>>,
        expr: &'a ecsql::Expr,
    ) -> Result<(Expr, Vec<Accessor>)> {
        let ecsql::Expr::Property(property) = expr else {
            return Ok((self.lower_expr(scope, expr)?, vec![]));
        };

        let Some(scope) = scope else {
            return Err(Error::invalid_ecsql(format!(
                "property `{}` cannot be referenced here",
                property.path
            )));
        };

        let mut snippets = scope.snippets(property)?;
        if snippets.len() != 1 {
            return Err(Error::invalid_ecsql(format!(
                "`{}` spans {} columns and cannot be used as a single value",
                property.path,
                snippets.len()
            )));
        }

        let snippet = snippets.remove(0);
        Ok((snippet.expr, snippet.path))
    }

    /// Comparisons involving a property spanning several columns compare
    /// column by column: `=` holds when all columns are equal, `<>` when any
    /// differs.
    fn lower_binary_op(
        &self,
        scope: Option<&Scope<'_>>,
        binary_op: &'a ecsql::ExprBinaryOp,
    ) -> Result<Expr> {
        let op = binary_op.op;
        let lhs: &'a ecsql::Expr = &binary_op.lhs;
        let rhs: &'a ecsql::Expr = &binary_op.rhs;

        let (property, other, swapped) = match (lhs, rhs, scope) {
            (ecsql::Expr::Property(property), other, Some(scope)) => ((scope, property), other, false),
            (other, ecsql::Expr::Property(property), Some(scope)) => ((scope, property), other, true),
            _ => {
                return Ok(Expr::binary_op(
                    self.lower_expr(scope, lhs)?,
                    op,
                    self.lower_expr(scope, rhs)?,
                ))
            }
        };
        let (scope, property) = property;

        let mut snippets = scope.snippets(property)?;

        if !matches!(other, ecsql::Expr::Property(_)) {
            match_navigation_on_id(&mut snippets);
        }

        let targets: Vec<Vec<Accessor>> = snippets.iter().map(|snippet| snippet.path.clone()).collect();
        let others = self.lower_values(Some(scope), other, &targets)?;

        let mut comparisons: Vec<Expr> = snippets
            .into_iter()
            .zip(others)
            .map(|(snippet, other)| {
                if swapped {
                    Expr::binary_op(other, op, snippet.expr)
                } else {
                    Expr::binary_op(snippet.expr, op, other)
                }
            })
            .collect();

        match comparisons.len() {
            1 => Ok(comparisons.remove(0)),
            _ if op.is_eq() => Ok(Expr::And(comparisons)),
            _ if op.is_ne() => Ok(Expr::Or(comparisons)),
            n => Err(Error::invalid_ecsql(format!(
                "`{op}` cannot compare `{}`, which spans {n} columns",
                property.path
            ))),
        }
    }

    /// Tables holding the columns an expression reads
    pub(super) fn referenced_tables(
        &self,
        scope: &ClassScope<'_>,
        expr: &ecsql::Expr,
        tables: &mut Vec<TableId>,
    ) -> Result<()> {
        match expr {
            ecsql::Expr::And(and) => {
                for operand in &and.operands {
                    self.referenced_tables(scope, operand, tables)?;
                }
            }
            ecsql::Expr::Or(or) => {
                for operand in &or.operands {
                    self.referenced_tables(scope, operand, tables)?;
                }
            }
            ecsql::Expr::BinaryOp(binary_op) => {
                self.referenced_tables(scope, &binary_op.lhs, tables)?;
                self.referenced_tables(scope, &binary_op.rhs, tables)?;
            }
            ecsql::Expr::InList(in_list) => {
                self.referenced_tables(scope, &in_list.expr, tables)?;
                for item in &in_list.list {
                    self.referenced_tables(scope, item, tables)?;
                }
            }
            ecsql::Expr::IsNull(is_null) => self.referenced_tables(scope, &is_null.expr, tables)?,
            ecsql::Expr::Not(not) => self.referenced_tables(scope, &not.expr, tables)?,
            ecsql::Expr::Property(property) => {
                let (_, leaves) = scope.resolve(property)?;
                for leaf in leaves {
                    if !tables.contains(&leaf.column.table) {
                        tables.push(leaf.column.table);
                    }
                }
            }
            ecsql::Expr::Param(_) | ecsql::Expr::Value(_) => {}
        }

        Ok(())
    }
}

/// Navigation values are matched on the id alone: the relationship class
/// is optional when binding and always set when reading.
fn match_navigation_on_id(snippets: &mut Vec<Snippet>) {
    if snippets.len() > 1 {
        snippets.retain(|snippet| snippet.path.last() != Some(&Accessor::NavigationRelClassId));
    }
}

/// A literal written inline, decomposed like a bound value would be
fn literal(value: &Value, path: &[Accessor]) -> Result<Expr> {
    crate::param::extract(value, path)
        .map(Expr::Value)
        .map_err(|err| err.context(Error::invalid_ecsql("literal does not match the property")))
}
