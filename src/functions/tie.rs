use super::Function;
use crate::evaluator::evaluate;
use crate::{Expression, FunctionError};

/// A parameter fixed to a formula of other parameters of the same function
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterTie {
    parameter: String,
    formula: Expression,
}

impl ParameterTie {
    /// Parse `formula` and check that it only refers to parameters of `owner`
    pub fn new(owner: &dyn Function, parameter: &str, formula: &str) -> Result<Self, FunctionError> {
        let invalid = |reason: String| FunctionError::InvalidTie {
            parameter: parameter.to_string(),
            formula: formula.to_string(),
            reason,
        };

        if owner.parameter_index(parameter).is_none() {
            return Err(FunctionError::UnknownParameter {
                function: owner.name().to_string(),
                parameter: parameter.to_string(),
            });
        }

        let expr = Expression::parse(formula).map_err(|e| invalid(e.message().to_string()))?;
        if expr.is_empty_marker() {
            return Err(invalid("empty formula".to_string()));
        }
        for name in expr.variables() {
            if name == parameter {
                return Err(invalid("a parameter cannot be tied to itself".to_string()));
            }
            if owner.parameter_index(&name).is_none() {
                return Err(invalid(format!("unknown parameter {}", name)));
            }
        }

        Ok(ParameterTie {
            parameter: parameter.to_string(),
            formula: expr,
        })
    }

    pub fn parameter(&self) -> &str {
        &self.parameter
    }

    pub fn formula(&self) -> &Expression {
        &self.formula
    }

    /// Canonical text of the formula
    pub fn formula_text(&self) -> String {
        self.formula.to_string()
    }

    /// Value of the formula at the current parameters of `owner`
    pub fn evaluate(&self, owner: &dyn Function) -> Result<f64, FunctionError> {
        evaluate(&self.formula, &|name| owner.get_parameter(name).ok()).map_err(|reason| {
            FunctionError::TieEvaluation {
                parameter: self.parameter.clone(),
                formula: self.formula_text(),
                reason,
            }
        })
    }

    pub fn as_string(&self) -> String {
        format!("{}={}", self.parameter, self.formula)
    }
}
