//! Function objects assembled by the factory
//!
//! A [`Function`] owns named parameters, typed attributes, parameter ties and
//! constraints. A [`CompositeFunction`] additionally owns member functions and
//! exposes their parameters under qualified names `f<i>.<name>`.

use crate::{Constraint, FunctionError};
use std::fmt;

pub(crate) mod attribute;
pub(crate) mod composite;
pub(crate) mod definitions;
pub(crate) mod param_function;
pub(crate) mod registry;
mod tie;

pub use attribute::Attribute;
pub use composite::Composite;
pub use param_function::ParamFunction;
pub use registry::FunctionRegistry;
pub use tie::ParameterTie;

/// Capability surface of a function object
pub trait Function: fmt::Debug + Send + Sync {
    /// Registered type name, e.g. `Gaussian`
    fn name(&self) -> &str;

    /// Called once by the registry after construction
    fn initialize(&mut self) {}

    // Parameters

    fn parameter_names(&self) -> Vec<String>;

    fn n_params(&self) -> usize {
        self.parameter_names().len()
    }

    fn parameter_index(&self, name: &str) -> Option<usize>;

    fn get_parameter(&self, name: &str) -> Result<f64, FunctionError>;

    fn set_parameter(&mut self, name: &str, value: f64) -> Result<(), FunctionError>;

    // Attributes

    fn has_attribute(&self, name: &str) -> bool {
        self.attribute_names().iter().any(|a| a == name)
    }

    fn attribute_names(&self) -> Vec<String>;

    fn get_attribute(&self, name: &str) -> Result<Attribute, FunctionError>;

    fn set_attribute(&mut self, name: &str, value: Attribute) -> Result<(), FunctionError>;

    /// Set an attribute from text, using the attribute's own conversion
    fn set_attribute_value(&mut self, name: &str, text: &str) -> Result<(), FunctionError> {
        let mut attribute = self.get_attribute(name)?;
        attribute.set_from_str(name, text)?;
        self.set_attribute(name, attribute)
    }

    // Ties

    /// Tie `parameter` to `formula`, replacing an existing tie on it
    fn tie(&mut self, parameter: &str, formula: &str) -> Result<(), FunctionError>;

    fn ties(&self) -> &[ParameterTie];

    fn get_tie(&self, parameter: &str) -> Option<&ParameterTie> {
        self.ties().iter().find(|t| t.parameter() == parameter)
    }

    /// Set every tied parameter to the value of its formula
    fn apply_ties(&mut self) -> Result<(), FunctionError>;

    // Constraints

    /// Attach a constraint, replacing an existing one on the same parameter
    fn add_constraint(&mut self, constraint: Box<dyn Constraint>) -> Result<(), FunctionError>;

    fn constraints(&self) -> &[Box<dyn Constraint>];

    fn get_constraint(&self, parameter: &str) -> Option<&dyn Constraint> {
        self.constraints()
            .iter()
            .find(|c| c.parameter_name() == parameter)
            .map(|c| c.as_ref())
    }

    /// Sum of the penalties of all constraints at the current parameter values
    fn penalty(&self) -> f64 {
        self.constraints()
            .iter()
            .filter_map(|c| {
                self.get_parameter(c.parameter_name())
                    .ok()
                    .map(|value| c.check(value))
            })
            .sum()
    }

    // Evaluation and serialisation

    fn function_1d(&self, x: f64) -> f64;

    /// Model string that recreates this function through the factory
    fn as_string(&self) -> String;

    fn as_composite(&self) -> Option<&dyn CompositeFunction> {
        None
    }

    fn as_composite_mut(&mut self) -> Option<&mut dyn CompositeFunction> {
        None
    }
}

/// Container of member functions
pub trait CompositeFunction: Function {
    /// Append a member, returning its index
    fn add_function(&mut self, function: Box<dyn Function>) -> usize;

    fn n_functions(&self) -> usize;

    fn get_function(&self, index: usize) -> Result<&dyn Function, FunctionError>;

    fn get_function_mut(&mut self, index: usize) -> Result<&mut dyn Function, FunctionError>;

    /// Whether the composite stores an attribute of this name per member
    fn has_local_attribute(&self, name: &str) -> bool;

    fn local_attribute_names(&self) -> Vec<String>;

    fn get_local_attribute(&self, index: usize, name: &str) -> Result<Attribute, FunctionError>;

    fn set_local_attribute_value(
        &mut self,
        index: usize,
        name: &str,
        text: &str,
    ) -> Result<(), FunctionError>;
}
