//! Parameter constraints and their registry

use crate::{Expression, Function, FunctionError};
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

mod boundary;

pub use boundary::BoundaryConstraint;

/// Restriction on one parameter, enforced through a penalty
pub trait Constraint: fmt::Debug + Send + Sync {
    /// Configure from a parsed constraint expression of `function`
    fn initialize(
        &mut self,
        function: &dyn Function,
        expr: &Expression,
        is_default: bool,
    ) -> Result<(), FunctionError>;

    /// Name of the constrained parameter, as known to the owning function
    fn parameter_name(&self) -> &str;

    fn penalty_factor(&self) -> f64;

    fn set_penalty_factor(&mut self, factor: f64);

    fn default_penalty_factor(&self) -> f64;

    /// Whether the constraint was declared by the function itself rather than
    /// the model string
    fn is_default(&self) -> bool;

    /// Penalty for `value`; 0 when the constraint is satisfied
    fn check(&self, value: f64) -> f64;

    /// Constraint expression as written in model strings
    fn as_string(&self) -> String;
}

type ConstraintConstructor = Arc<dyn Fn() -> Box<dyn Constraint> + Send + Sync>;

/// Maps constraint type names (or operator labels) to constructors
#[derive(Clone, Default)]
pub struct ConstraintRegistry {
    constructors: FxHashMap<String, ConstraintConstructor>,
}

static SHARED: OnceLock<Arc<ConstraintRegistry>> = OnceLock::new();

impl ConstraintRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `BoundaryConstraint`, also reachable through the `<` and `>` labels
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for name in ["BoundaryConstraint", "<", ">"] {
            registry.subscribe(name, || Box::new(BoundaryConstraint::new()));
        }
        registry
    }

    /// Shared registry with the built-in types, created on first use
    pub fn shared() -> Arc<Self> {
        Arc::clone(SHARED.get_or_init(|| Arc::new(Self::with_builtins())))
    }

    pub fn subscribe<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn() -> Box<dyn Constraint> + Send + Sync + 'static,
    {
        self.constructors.insert(name.into(), Arc::new(constructor));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Construct a constraint of type `name` and initialise it from `expr`
    pub fn create_constraint(
        &self,
        name: &str,
        function: &dyn Function,
        expr: &Expression,
        is_default: bool,
    ) -> Result<Box<dyn Constraint>, FunctionError> {
        let make = self
            .constructors
            .get(name)
            .ok_or_else(|| FunctionError::UnknownConstraint(name.to_string()))?;
        let mut constraint = make();
        constraint.initialize(function, expr, is_default)?;
        Ok(constraint)
    }
}

impl fmt::Debug for ConstraintRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.constructors.keys().collect();
        names.sort_unstable();
        f.debug_struct("ConstraintRegistry")
            .field("constraints", &names)
            .finish()
    }
}
