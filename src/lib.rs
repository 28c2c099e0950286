//! Fit-model expressions and function composition
//!
//! Two layers:
//!
//! - an operator-precedence [`Parser`] turning text such as
//!   `name=Gaussian,Sigma=2;name=FlatBackground` into an [`Expression`]
//!   tree, driven by a configurable [`OperatorTable`];
//! - a [`FunctionFactory`] interpreting such trees as fit models: simple
//!   functions, composites, parameter ties, constraints and penalty factors.
//!
//! # Usage Examples
//!
//! ## Parsing
//! ```
//! use fitmodel::parse;
//!
//! let expr = parse("a+b*c").unwrap();
//! assert_eq!(expr.name(), "+");
//! assert_eq!(expr[1].name(), "*");
//! assert_eq!(expr.to_string(), "a+b*c");
//! ```
//!
//! ## Building a model
//! ```
//! use fitmodel::create_initialized;
//!
//! let model = create_initialized(
//!     "name=Gaussian,Height=2,Sigma=1;name=FlatBackground,A0=0.5;ties=(f1.A0=f0.Height/4)",
//! )
//! .unwrap();
//! assert_eq!(model.get_parameter("f1.A0").unwrap(), 0.5);
//! assert_eq!(model.as_composite().unwrap().n_functions(), 2);
//! ```

mod ast;
pub mod constraints;
mod display;
mod error;
mod evaluator;
mod factory;
pub mod functions;
mod parser;

#[cfg(feature = "parallel")]
pub mod parallel;

#[cfg(test)]
mod tests;

pub use ast::{EMPTY, Expression, Form};
pub use constraints::{BoundaryConstraint, Constraint, ConstraintRegistry};
pub use error::{FactoryError, FunctionError, ParsingError, Span};
pub use factory::{FunctionFactory, ParentAttributes};
pub use functions::{
    Attribute, Composite, CompositeFunction, Function, FunctionRegistry, ParamFunction,
    ParameterTie,
};
pub use parser::{
    DEFAULT_BINARY_OPERATORS, DEFAULT_MAX_DEPTH, DEFAULT_UNARY_OPERATORS, OperatorTable, Parser,
};

/// Parse `input` with the default operator table
///
/// # Example
/// ```
/// let expr = fitmodel::parse("f(x, 2)").unwrap();
/// assert!(expr.is_func());
/// assert_eq!(expr.len(), 2);
/// ```
///
/// # Note
/// For a custom operator table or nesting limit, use the [`Parser`] builder.
pub fn parse(input: &str) -> Result<Expression, ParsingError> {
    Parser::new().parse(input)
}

/// Build the function described by a model string using the built-in registries
///
/// # Note
/// For custom function or constraint types, configure a [`FunctionFactory`].
pub fn create_initialized(input: &str) -> Result<Box<dyn Function>, FactoryError> {
    FunctionFactory::new().create_initialized(input)
}
