//! Simple function built from a static definition

use super::definitions::FunctionDefinition;
use super::attribute::replace_typed;
use super::{Attribute, Function, ParameterTie};
use crate::{Constraint, Expression, FunctionError};
use log::debug;
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq)]
struct Parameter {
    name: String,
    value: f64,
}

/// Function whose behaviour comes from a [`FunctionDefinition`]
#[derive(Debug)]
pub struct ParamFunction {
    definition: &'static FunctionDefinition,
    parameters: Vec<Parameter>,
    attributes: Vec<(String, Attribute)>,
    /// Parsed `Formula` attribute of user functions
    formula: Option<Expression>,
    ties: Vec<ParameterTie>,
    constraints: Vec<Box<dyn Constraint>>,
}

impl ParamFunction {
    pub(crate) fn new(definition: &'static FunctionDefinition) -> Self {
        ParamFunction {
            definition,
            parameters: definition
                .parameters
                .iter()
                .map(|&(name, value)| Parameter {
                    name: name.to_string(),
                    value,
                })
                .collect(),
            attributes: (definition.attributes)()
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
            formula: None,
            ties: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Value of the parameter at `index`, NaN when out of range
    #[inline]
    pub(crate) fn value(&self, index: usize) -> f64 {
        self.parameters.get(index).map_or(f64::NAN, |p| p.value)
    }

    pub(crate) fn values(&self) -> Vec<f64> {
        self.parameters.iter().map(|p| p.value).collect()
    }

    pub(crate) fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    pub(crate) fn formula(&self) -> Option<&Expression> {
        self.formula.as_ref()
    }

    pub(crate) fn set_formula(&mut self, formula: Option<Expression>, parameters: Vec<String>) {
        self.formula = formula;
        self.declare_parameters(parameters);
    }

    /// Replace the parameter list; values of surviving names are kept
    pub(crate) fn declare_parameters(&mut self, names: Vec<String>) {
        let previous = std::mem::take(&mut self.parameters);
        self.parameters = names
            .into_iter()
            .map(|name| {
                let value = previous
                    .iter()
                    .find(|p| p.name == name)
                    .map_or(0.0, |p| p.value);
                Parameter { name, value }
            })
            .collect();
        // Ties and constraints on removed parameters go with them
        let parameters = &self.parameters;
        self.ties
            .retain(|t| parameters.iter().any(|p| p.name == t.parameter()));
        self.constraints
            .retain(|c| parameters.iter().any(|p| p.name == c.parameter_name()));
    }

    fn unknown_parameter(&self, name: &str) -> FunctionError {
        FunctionError::UnknownParameter {
            function: self.definition.name.to_string(),
            parameter: name.to_string(),
        }
    }
}

impl Function for ParamFunction {
    fn name(&self) -> &str {
        self.definition.name
    }

    fn parameter_names(&self) -> Vec<String> {
        self.parameters.iter().map(|p| p.name.clone()).collect()
    }

    fn n_params(&self) -> usize {
        self.parameters.len()
    }

    fn parameter_index(&self, name: &str) -> Option<usize> {
        self.parameters.iter().position(|p| p.name == name)
    }

    fn get_parameter(&self, name: &str) -> Result<f64, FunctionError> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value)
            .ok_or_else(|| self.unknown_parameter(name))
    }

    fn set_parameter(&mut self, name: &str, value: f64) -> Result<(), FunctionError> {
        let index = self
            .parameter_index(name)
            .ok_or_else(|| self.unknown_parameter(name))?;
        self.parameters[index].value = value;
        Ok(())
    }

    fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    fn attribute_names(&self) -> Vec<String> {
        self.attributes.iter().map(|(n, _)| n.clone()).collect()
    }

    fn get_attribute(&self, name: &str) -> Result<Attribute, FunctionError> {
        self.attribute(name)
            .cloned()
            .ok_or_else(|| FunctionError::UnknownAttribute {
                function: self.definition.name.to_string(),
                attribute: name.to_string(),
            })
    }

    fn set_attribute(&mut self, name: &str, value: Attribute) -> Result<(), FunctionError> {
        let previous = replace_typed(&mut self.attributes, self.definition.name, name, value)?;

        if let Some(changed) = self.definition.attribute_changed
            && let Err(err) = changed(self, name)
        {
            // Hooks only run on known names
            let _ = replace_typed(&mut self.attributes, self.definition.name, name, previous);
            return Err(err);
        }
        Ok(())
    }

    fn tie(&mut self, parameter: &str, formula: &str) -> Result<(), FunctionError> {
        let tie = ParameterTie::new(&*self, parameter, formula)?;
        debug!("{}: tie {}", self.name(), tie.as_string());
        match self.ties.iter_mut().find(|t| t.parameter() == parameter) {
            Some(existing) => *existing = tie,
            None => self.ties.push(tie),
        }
        Ok(())
    }

    fn ties(&self) -> &[ParameterTie] {
        &self.ties
    }

    fn apply_ties(&mut self) -> Result<(), FunctionError> {
        for i in 0..self.ties.len() {
            let value = self.ties[i].evaluate(&*self)?;
            let parameter = self.ties[i].parameter().to_string();
            self.set_parameter(&parameter, value)?;
        }
        Ok(())
    }

    fn add_constraint(&mut self, constraint: Box<dyn Constraint>) -> Result<(), FunctionError> {
        let parameter = constraint.parameter_name();
        if self.parameter_index(parameter).is_none() {
            return Err(self.unknown_parameter(parameter));
        }
        debug!("{}: constraint {}", self.name(), constraint.as_string());
        match self
            .constraints
            .iter_mut()
            .find(|c| c.parameter_name() == parameter)
        {
            Some(existing) => *existing = constraint,
            None => self.constraints.push(constraint),
        }
        Ok(())
    }

    fn constraints(&self) -> &[Box<dyn Constraint>] {
        &self.constraints
    }

    fn function_1d(&self, x: f64) -> f64 {
        (self.definition.eval)(self, x)
    }

    fn as_string(&self) -> String {
        let mut out = format!("name={}", self.definition.name);
        for (name, value) in &self.attributes {
            let _ = write!(out, ",{}={}", name, value.value_string());
        }
        for p in &self.parameters {
            let _ = write!(out, ",{}={}", p.name, p.value);
        }
        write_ties_and_constraints(&mut out, ',', &self.ties, &self.constraints);
        out
    }
}

/// Append `ties=(..)` and `constraints=(..)` sections, each preceded by `separator`
pub(crate) fn write_ties_and_constraints(
    out: &mut String,
    separator: char,
    ties: &[ParameterTie],
    constraints: &[Box<dyn Constraint>],
) {
    if !ties.is_empty() {
        let list: Vec<String> = ties.iter().map(ParameterTie::as_string).collect();
        let _ = write!(out, "{}ties=({})", separator, list.join(","));
    }

    let mut list = Vec::new();
    for constraint in constraints.iter().filter(|c| !c.is_default()) {
        list.push(constraint.as_string());
        if constraint.penalty_factor() != constraint.default_penalty_factor() {
            list.push(format!("penalty={}", constraint.penalty_factor()));
        }
    }
    if !list.is_empty() {
        let _ = write!(out, "{}constraints=({})", separator, list.join(","));
    }
}
