//! Vectorised evaluation of condition expressions against a [`BarTable`].
//!
//! Columns are bound before any row is evaluated. Undefined values propagate
//! through arithmetic and make comparisons false.

use crate::domain::bar_table::BarTable;
use crate::domain::error::ConditionError;
use crate::domain::expr::Expr;
use crate::domain::expr_parser;

/// Parse `expression` and evaluate it on every row of `table`.
pub fn evaluate_condition(expression: &str, table: &BarTable) -> Result<Vec<bool>, ConditionError> {
    let expr = expr_parser::parse(expression)?;
    evaluate_expr(&expr, table)
}

/// Evaluate an already parsed condition on every row of `table`.
pub fn evaluate_expr(expr: &Expr, table: &BarTable) -> Result<Vec<bool>, ConditionError> {
    if let Some(name) = expr.columns().into_iter().find(|n| !table.has_column(n)) {
        return Err(ConditionError::MissingColumn { name });
    }
    Evaluator { table }.boolean(expr)
}

struct Evaluator<'a> {
    table: &'a BarTable,
}

impl Evaluator<'_> {
    fn rows(&self) -> usize {
        self.table.len()
    }

    fn numeric(&self, expr: &Expr) -> Result<Vec<Option<f64>>, ConditionError> {
        match expr {
            Expr::Number(v) => Ok(vec![Some(*v); self.rows()]),
            Expr::Column(name) => {
                let column = self
                    .table
                    .column_ref(name)
                    .ok_or_else(|| ConditionError::MissingColumn { name: name.clone() })?;
                let bars = self.table.bars();
                Ok((0..self.rows())
                    .map(|row| column.get(bars, row).filter(|v| !v.is_nan()))
                    .collect())
            }
            Expr::Neg(inner) => Ok(self
                .numeric(inner)?
                .into_iter()
                .map(|v| v.map(|x| -x))
                .collect()),
            Expr::Arith { op, left, right } => {
                let left = self.numeric(left)?;
                let right = self.numeric(right)?;
                Ok(left
                    .into_iter()
                    .zip(right)
                    .map(|(l, r)| match (l, r) {
                        (Some(l), Some(r)) => Some(op.apply(l, r)).filter(|v| !v.is_nan()),
                        _ => None,
                    })
                    .collect())
            }
            Expr::Compare { .. } | Expr::And(_) | Expr::Or(_) => Err(ConditionError::TypeMismatch {
                reason: format!("expected a number, found condition '{}'", expr),
            }),
        }
    }

    fn boolean(&self, expr: &Expr) -> Result<Vec<bool>, ConditionError> {
        match expr {
            Expr::Compare { op, left, right } => {
                let left = self.numeric(left)?;
                let right = self.numeric(right)?;
                Ok(left
                    .into_iter()
                    .zip(right)
                    .map(|(l, r)| match (l, r) {
                        (Some(l), Some(r)) => op.apply(l, r),
                        _ => false,
                    })
                    .collect())
            }
            Expr::And(items) => items.iter().try_fold(vec![true; self.rows()], |acc, item| {
                let values = self.boolean(item)?;
                Ok(acc.into_iter().zip(values).map(|(a, b)| a && b).collect())
            }),
            Expr::Or(items) => items.iter().try_fold(vec![false; self.rows()], |acc, item| {
                let values = self.boolean(item)?;
                Ok(acc.into_iter().zip(values).map(|(a, b)| a || b).collect())
            }),
            Expr::Number(_) | Expr::Column(_) | Expr::Neg(_) | Expr::Arith { .. } => {
                Err(ConditionError::TypeMismatch {
                    reason: format!("expected a condition, found number '{}'", expr),
                })
            }
        }
    }
}
