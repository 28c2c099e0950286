use super::composite::Composite;
use super::definitions::all_definitions;
use super::param_function::ParamFunction;
use super::{CompositeFunction, Function};
use crate::FunctionError;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

type SimpleConstructor = Arc<dyn Fn() -> Box<dyn Function> + Send + Sync>;
type CompositeConstructor = Arc<dyn Fn() -> Box<dyn CompositeFunction> + Send + Sync>;

#[derive(Clone)]
enum Constructor {
    Simple(SimpleConstructor),
    Composite(CompositeConstructor),
}

/// Maps function type names to constructors
///
/// The registry is immutable once shared; build a custom one with
/// [`FunctionRegistry::with_builtins`] and [`FunctionRegistry::subscribe`]
/// before handing it to a factory.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    constructors: FxHashMap<String, Constructor>,
}

/// Process-wide registry with the built-in types
static SHARED: OnceLock<Arc<FunctionRegistry>> = OnceLock::new();

impl FunctionRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in function and composite type
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for definition in all_definitions() {
            registry.subscribe(definition.name, move || {
                Box::new(ParamFunction::new(definition))
            });
        }
        registry.subscribe_composite("CompositeFunction", || {
            Box::new(Composite::composite_function())
        });
        registry.subscribe_composite("MultiDomainFunction", || Box::new(Composite::multi_domain()));
        registry
    }

    /// Shared registry with the built-in types, created on first use
    pub fn shared() -> Arc<Self> {
        Arc::clone(SHARED.get_or_init(|| Arc::new(Self::with_builtins())))
    }

    /// Register a simple function type, replacing any previous one of that name
    pub fn subscribe<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn() -> Box<dyn Function> + Send + Sync + 'static,
    {
        self.constructors
            .insert(name.into(), Constructor::Simple(Arc::new(constructor)));
    }

    /// Register a composite function type
    pub fn subscribe_composite<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn() -> Box<dyn CompositeFunction> + Send + Sync + 'static,
    {
        self.constructors
            .insert(name.into(), Constructor::Composite(Arc::new(constructor)));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    pub fn is_composite(&self, name: &str) -> bool {
        matches!(self.constructors.get(name), Some(Constructor::Composite(_)))
    }

    /// Registered type names, sorted
    pub fn function_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.constructors.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Construct and initialise a function of type `name`
    pub fn create_function(&self, name: &str) -> Result<Box<dyn Function>, FunctionError> {
        let mut function: Box<dyn Function> = match self.constructors.get(name) {
            Some(Constructor::Simple(make)) => make(),
            Some(Constructor::Composite(make)) => make(),
            None => return Err(FunctionError::UnknownFunction(name.to_string())),
        };
        function.initialize();
        Ok(function)
    }

    /// Construct and initialise a composite of type `name`
    pub fn create_composite(&self, name: &str) -> Result<Box<dyn CompositeFunction>, FunctionError> {
        match self.constructors.get(name) {
            Some(Constructor::Composite(make)) => {
                let mut composite = make();
                composite.initialize();
                Ok(composite)
            }
            Some(Constructor::Simple(_)) => Err(FunctionError::NotComposite(name.to_string())),
            None => Err(FunctionError::UnknownFunction(name.to_string())),
        }
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.function_names())
            .finish()
    }
}
