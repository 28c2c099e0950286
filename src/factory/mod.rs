//! Model-string interpreter
//!
//! Turns strings such as
//! `name=Gaussian,PeakCentre=10,Sigma=1;name=LinearBackground,A0=0`
//! into function objects:
//!
//! - `;` separates the members of a composite,
//! - `,` separates the items of one function,
//! - `name=Type` (or `composite=Type`) must come first,
//! - `ties=(..)` and `constraints=(..)` attach ties and constraints,
//! - `$attr=value` configures the enclosing composite for this member,
//! - any other `key=value` sets an attribute or a parameter.

mod constraints;
mod ties;

use crate::ast::Form;
use crate::parser::{DEFAULT_MAX_DEPTH, Parser};
use crate::{
    CompositeFunction, ConstraintRegistry, Expression, FactoryError, Function, FunctionError,
    FunctionRegistry,
};
use log::{Level, debug, log_enabled, trace, warn};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Attributes declared with a `$` prefix, on their way up to the enclosing composite
pub type ParentAttributes = FxHashMap<String, String>;

/// Special keys of `key=value` items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key<'a> {
    Name,
    Composite,
    Ties,
    Constraints,
    ParentAttribute(&'a str),
    Other(&'a str),
}

impl<'a> Key<'a> {
    fn classify(key: &'a str) -> Self {
        match key {
            "name" => Key::Name,
            "composite" => Key::Composite,
            "ties" => Key::Ties,
            k if k.starts_with("constraint") => Key::Constraints,
            k => match k.strip_prefix('$') {
                Some(attribute) => Key::ParentAttribute(attribute),
                None => Key::Other(k),
            },
        }
    }
}

/// Key and value of a `key=value` node
fn assignment(expr: &Expression) -> Option<(&str, &Expression)> {
    match (expr.form(), expr.terms()) {
        (Form::Assign, [key, value]) => Some((key.name(), value)),
        _ => None,
    }
}

/// Key of the first item of a `,`-chain or of a single `key=value`
fn first_key(expr: &Expression) -> Option<&str> {
    let first = expr.to_list(",")[0];
    assignment(first).map(|(key, _)| key)
}

/// A nested composite member: `(a;b)` alone or followed by the `$` attributes
/// its parent keeps for it, `(a;b),$domains=i`
fn nested_composite(expr: &Expression) -> Option<(&Expression, &[Expression])> {
    match expr.form() {
        Form::Sequence => Some((expr, Default::default())),
        Form::List => {
            let (head, rest) = expr.terms().split_first()?;
            let head = head.brackets_removed();
            (head.form() == Form::Sequence).then_some((head, rest))
        }
        _ => None,
    }
}

/// Strip one pair of surrounding double quotes
fn unquote(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
}

/// Builds functions from model strings
///
/// # Example
/// ```
/// use fitmodel::FunctionFactory;
///
/// let factory = FunctionFactory::new();
/// let f = factory
///     .create_initialized("name=LinearBackground,A0=0,A1=1")
///     .unwrap();
/// assert_eq!(f.name(), "LinearBackground");
/// assert_eq!(f.get_parameter("A1").unwrap(), 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct FunctionFactory {
    functions: Arc<FunctionRegistry>,
    constraints: Arc<ConstraintRegistry>,
    parser: Parser,
}

impl Default for FunctionFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionFactory {
    /// Factory using the shared built-in registries
    pub fn new() -> Self {
        FunctionFactory {
            functions: FunctionRegistry::shared(),
            constraints: ConstraintRegistry::shared(),
            parser: Parser::new().max_depth(DEFAULT_MAX_DEPTH),
        }
    }

    pub fn function_registry(mut self, registry: Arc<FunctionRegistry>) -> Self {
        self.functions = registry;
        self
    }

    pub fn constraint_registry(mut self, registry: Arc<ConstraintRegistry>) -> Self {
        self.constraints = registry;
        self
    }

    /// Maximum nesting depth of model strings
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.parser = self.parser.max_depth(depth);
        self
    }

    /// Construct and initialise a function of a registered type
    pub fn create_function(&self, type_name: &str) -> Result<Box<dyn Function>, FactoryError> {
        Ok(self.functions.create_function(type_name)?)
    }

    /// Build the function described by `input`
    ///
    /// # Errors
    /// Fails on the first problem found; nothing built up to that point is
    /// returned. Parser errors come back as [`FactoryError::Parsing`] with
    /// the whole input attached.
    pub fn create_initialized(&self, input: &str) -> Result<Box<dyn Function>, FactoryError> {
        let expr = self
            .parser
            .parse(input)
            .map_err(|source| FactoryError::Parsing {
                input: input.to_string(),
                source,
            })?;
        if log_enabled!(Level::Trace) {
            trace!("model tree:\n{}", expr.tree_string());
        }

        let expr = expr.brackets_removed();
        if expr.is_empty_marker() {
            return Err(FactoryError::NoFunction);
        }

        let mut parent_attributes = ParentAttributes::default();
        let function: Box<dyn Function> = if expr.form() == Form::Sequence {
            match self.create_composite(expr, &mut parent_attributes)? {
                Some(composite) => composite,
                None => return Err(FactoryError::NoFunction),
            }
        } else {
            self.create_simple(expr, &mut parent_attributes)?
        };

        if !parent_attributes.is_empty() {
            let mut names: Vec<&String> = parent_attributes.keys().collect();
            names.sort_unstable();
            warn!("no enclosing composite for attributes {:?}", names);
        }
        debug!("created {}", function.name());
        Ok(function)
    }

    /// Build one function from `name=Type` or `name=Type,key=value,...`
    ///
    /// `$`-prefixed items are collected into `parent_attributes`.
    pub fn create_simple(
        &self,
        expr: &Expression,
        parent_attributes: &mut ParentAttributes,
    ) -> Result<Box<dyn Function>, FactoryError> {
        let expr = expr.brackets_removed();

        let items = match expr.form() {
            Form::Assign => std::slice::from_ref(expr),
            Form::List => expr.terms(),
            _ => return Err(FactoryError::InvalidInput(expr.to_string())),
        };

        let (head, rest) = items
            .split_first()
            .ok_or_else(|| FactoryError::InvalidInput(expr.to_string()))?;
        let type_name = match assignment(head) {
            Some((key, value)) if matches!(Key::classify(key), Key::Name | Key::Composite) => {
                value.to_string()
            }
            _ => return Err(FactoryError::NameNotFirst),
        };

        let mut function = self.create_function(&type_name)?;
        debug!("creating {}", type_name);

        for item in rest {
            let (key, value) =
                assignment(item).ok_or_else(|| FactoryError::InvalidInput(item.to_string()))?;

            if function.has_attribute(key) {
                function.set_attribute_value(key, unquote(&value.to_string()))?;
                continue;
            }

            match Key::classify(key) {
                Key::Constraints => self.add_constraints(function.as_mut(), value.brackets_removed())?,
                Key::Ties => self.add_ties(function.as_mut(), value.brackets_removed())?,
                Key::ParentAttribute(attribute) => {
                    parent_attributes.insert(attribute.to_string(), unquote(&value.to_string()).to_string());
                }
                Key::Name | Key::Composite | Key::Other(_) => {
                    let text = value.to_string();
                    let number = text
                        .parse::<f64>()
                        .map_err(|_| FactoryError::InvalidParameterValue {
                            name: key.to_string(),
                            value: text.clone(),
                        })?;
                    function.set_parameter(key, number)?;
                }
            }
        }

        function.apply_ties()?;
        Ok(function)
    }

    /// Build a composite from a `;`-chain
    ///
    /// The first member decides the composite type: `composite=Type` (alone or
    /// followed by `,`-separated attributes) creates that type and is not a
    /// member; `name=...` or a nested `;`-chain starts a plain
    /// `CompositeFunction` and is its first member, as does a leading
    /// composite-level `ties=`/`constraints=` item. Returns `None` for a chain
    /// without members.
    pub fn create_composite(
        &self,
        expr: &Expression,
        parent_attributes: &mut ParentAttributes,
    ) -> Result<Option<Box<dyn CompositeFunction>>, FactoryError> {
        let expr = expr.brackets_removed();
        if expr.form() != Form::Sequence {
            return Err(FactoryError::InvalidInput(expr.to_string()));
        }
        let Some(first) = expr.terms().first() else {
            return Ok(None);
        };

        let first = first.brackets_removed();
        let (mut composite, members) = match first_key(first).map(Key::classify) {
            Some(Key::Composite) => {
                let composite = self.composite_header(first, parent_attributes)?;
                (composite, &expr.terms()[1..])
            }
            Some(Key::Name | Key::Ties | Key::Constraints) => {
                (self.generic_composite()?, expr.terms())
            }
            None if nested_composite(first).is_some() => (self.generic_composite()?, expr.terms()),
            _ => return Err(FactoryError::InvalidInput(first.to_string())),
        };

        // Composite-level ties and constraints may refer to any member
        let mut deferred = Vec::new();
        for member in members {
            let member = member.brackets_removed();
            let mut member_attributes = ParentAttributes::default();

            let function: Box<dyn Function> = if let Some((inner, items)) =
                nested_composite(member)
            {
                let Some(inner) = self.create_composite(inner, &mut member_attributes)? else {
                    continue;
                };
                // Override attributes bubbling up from inside the group
                for item in items {
                    match assignment(item).map(|(key, value)| (Key::classify(key), value)) {
                        Some((Key::ParentAttribute(attribute), value)) => {
                            member_attributes.insert(
                                attribute.to_string(),
                                unquote(&value.to_string()).to_string(),
                            );
                        }
                        _ => return Err(FactoryError::InvalidInput(item.to_string())),
                    }
                }
                inner
            } else if matches!(
                first_key(member).map(Key::classify),
                Some(Key::Ties | Key::Constraints)
            ) {
                deferred.push(member);
                continue;
            } else {
                self.create_simple(member, &mut member_attributes)?
            };

            let index = composite.add_function(function);
            for (name, value) in member_attributes {
                if composite.has_local_attribute(&name) {
                    composite.set_local_attribute_value(index, &name, &value)?;
                } else {
                    parent_attributes.insert(name, value);
                }
            }
        }

        for item in deferred.iter().flat_map(|member| member.to_list(",")) {
            let (key, value) =
                assignment(item).ok_or_else(|| FactoryError::InvalidInput(item.to_string()))?;
            match Key::classify(key) {
                Key::Ties => self.add_ties(composite.as_mut(), value.brackets_removed())?,
                Key::Constraints => {
                    self.add_constraints(composite.as_mut(), value.brackets_removed())?
                }
                _ => return Err(FactoryError::InvalidInput(item.to_string())),
            }
        }

        composite.apply_ties()?;
        debug!(
            "created {} with {} members",
            composite.name(),
            composite.n_functions()
        );
        Ok(Some(composite))
    }

    fn generic_composite(&self) -> Result<Box<dyn CompositeFunction>, FactoryError> {
        Ok(self.functions.create_composite("CompositeFunction")?)
    }

    /// `composite=Type[,attr=value...]`
    fn composite_header(
        &self,
        header: &Expression,
        parent_attributes: &mut ParentAttributes,
    ) -> Result<Box<dyn CompositeFunction>, FactoryError> {
        let items = header.to_list(",");
        let Some((_, type_name)) = assignment(items[0]) else {
            return Err(FactoryError::InvalidInput(header.to_string()));
        };
        let mut composite = self.functions.create_composite(&type_name.to_string())?;

        for item in &items[1..] {
            let (key, value) =
                assignment(item).ok_or_else(|| FactoryError::InvalidInput(item.to_string()))?;
            let value = value.to_string();
            if composite.has_attribute(key) {
                composite.set_attribute_value(key, unquote(&value))?;
            } else if let Key::ParentAttribute(attribute) = Key::classify(key) {
                parent_attributes.insert(attribute.to_string(), unquote(&value).to_string());
            } else {
                return Err(FunctionError::UnknownAttribute {
                    function: composite.name().to_string(),
                    attribute: key.to_string(),
                }
                .into());
            }
        }
        Ok(composite)
    }
}
