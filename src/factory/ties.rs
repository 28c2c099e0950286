use super::FunctionFactory;
use crate::ast::Form;
use crate::{Expression, FactoryError, Function};

impl FunctionFactory {
    /// Attach the ties of a `ties=(..)` item: a single `=` or a `,`-chain of them
    ///
    /// An empty list (`ties=()`) attaches nothing.
    pub fn add_ties(&self, function: &mut dyn Function, expr: &Expression) -> Result<(), FactoryError> {
        for item in expr.to_list(",") {
            let item = item.brackets_removed();
            if item.is_empty_marker() {
                continue;
            }
            self.add_tie(function, item)?;
        }
        Ok(())
    }

    /// Attach one tie; `a=b=expr` ties every parameter on the left to the last term
    pub fn add_tie(&self, function: &mut dyn Function, expr: &Expression) -> Result<(), FactoryError> {
        let terms = expr.terms();
        if expr.form() != Form::Assign || terms.len() < 2 {
            return Err(FactoryError::InvalidInput(expr.to_string()));
        }

        let (formula, targets) = terms
            .split_last()
            .ok_or_else(|| FactoryError::InvalidInput(expr.to_string()))?;
        let formula = formula.to_string();
        for target in targets.iter().rev() {
            function.tie(&target.to_string(), &formula)?;
        }
        Ok(())
    }
}
