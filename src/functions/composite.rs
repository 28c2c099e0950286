//! Composite functions: sums of member functions

use super::attribute::replace_typed;
use super::param_function::write_ties_and_constraints;
use super::{Attribute, CompositeFunction, Function, ParameterTie};
use crate::{Constraint, FunctionError};
use log::debug;
use std::fmt::Write;

/// Generic composite container
///
/// Parameters of member `i` are exposed as `f<i>.<name>`; nested composites
/// stack prefixes (`f1.f0.A0`). Attributes declared as *local* are stored
/// once per member, e.g. the `domains` of a `MultiDomainFunction` member.
#[derive(Debug)]
pub struct Composite {
    name: String,
    functions: Vec<Box<dyn Function>>,
    attributes: Vec<(String, Attribute)>,
    default_attributes: Vec<(String, Attribute)>,
    local_defaults: Vec<(String, Attribute)>,
    local_attributes: Vec<Vec<(String, Attribute)>>,
    ties: Vec<ParameterTie>,
    constraints: Vec<Box<dyn Constraint>>,
}

impl Composite {
    /// Empty composite of type `name` with its own and per-member attributes
    pub fn new(
        name: impl Into<String>,
        attributes: Vec<(String, Attribute)>,
        local_attributes: Vec<(String, Attribute)>,
    ) -> Self {
        Composite {
            name: name.into(),
            functions: Vec::new(),
            default_attributes: attributes.clone(),
            attributes,
            local_defaults: local_attributes,
            local_attributes: Vec::new(),
            ties: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// The plain `CompositeFunction`
    pub fn composite_function() -> Self {
        Self::new(
            "CompositeFunction",
            vec![("NumDeriv".to_string(), Attribute::Bool(false))],
            Vec::new(),
        )
    }

    /// `MultiDomainFunction`: members carry a local `domains` attribute
    pub fn multi_domain() -> Self {
        Self::new(
            "MultiDomainFunction",
            vec![("NumDeriv".to_string(), Attribute::Bool(false))],
            vec![("domains".to_string(), Attribute::Str("All".to_string()))],
        )
    }

    /// Split `f<i>.<rest>` into the member index and the member's parameter name
    fn split_qualified(name: &str) -> Option<(usize, &str)> {
        let (index, local) = name.strip_prefix('f')?.split_once('.')?;
        Some((index.parse().ok()?, local))
    }

    fn unknown_parameter(&self, name: &str) -> FunctionError {
        FunctionError::UnknownParameter {
            function: self.name.clone(),
            parameter: name.to_string(),
        }
    }

    fn out_of_range(&self, index: usize) -> FunctionError {
        FunctionError::MemberOutOfRange {
            index,
            size: self.functions.len(),
        }
    }

    fn member_for<'a, 'n>(
        &'a self,
        name: &'n str,
    ) -> Result<(&'a dyn Function, &'n str), FunctionError> {
        Self::split_qualified(name)
            .and_then(|(i, local)| self.functions.get(i).map(|f| (f.as_ref(), local)))
            .ok_or_else(|| self.unknown_parameter(name))
    }
}

impl Function for Composite {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameter_names(&self) -> Vec<String> {
        self.functions
            .iter()
            .enumerate()
            .flat_map(|(i, f)| {
                f.parameter_names()
                    .into_iter()
                    .map(move |p| format!("f{}.{}", i, p))
            })
            .collect()
    }

    fn n_params(&self) -> usize {
        self.functions.iter().map(|f| f.n_params()).sum()
    }

    fn parameter_index(&self, name: &str) -> Option<usize> {
        let (i, local) = Self::split_qualified(name)?;
        let member = self.functions.get(i)?;
        let offset: usize = self.functions[..i].iter().map(|f| f.n_params()).sum();
        member.parameter_index(local).map(|j| offset + j)
    }

    fn get_parameter(&self, name: &str) -> Result<f64, FunctionError> {
        let (member, local) = self.member_for(name)?;
        member
            .get_parameter(local)
            .map_err(|_| self.unknown_parameter(name))
    }

    fn set_parameter(&mut self, name: &str, value: f64) -> Result<(), FunctionError> {
        let unknown = self.unknown_parameter(name);
        let (i, local) = Self::split_qualified(name).ok_or_else(|| unknown.clone())?;
        let member = self.functions.get_mut(i).ok_or_else(|| unknown.clone())?;
        member.set_parameter(local, value).map_err(|_| unknown)
    }

    fn attribute_names(&self) -> Vec<String> {
        self.attributes.iter().map(|(n, _)| n.clone()).collect()
    }

    fn get_attribute(&self, name: &str) -> Result<Attribute, FunctionError> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| FunctionError::UnknownAttribute {
                function: self.name.clone(),
                attribute: name.to_string(),
            })
    }

    fn set_attribute(&mut self, name: &str, value: Attribute) -> Result<(), FunctionError> {
        replace_typed(&mut self.attributes, &self.name, name, value).map(|_| ())
    }

    fn tie(&mut self, parameter: &str, formula: &str) -> Result<(), FunctionError> {
        let tie = ParameterTie::new(&*self, parameter, formula)?;
        debug!("{}: tie {}", self.name, tie.as_string());
        match self.ties.iter_mut().find(|t| t.parameter() == parameter) {
            Some(existing) => *existing = tie,
            None => self.ties.push(tie),
        }
        Ok(())
    }

    fn ties(&self) -> &[ParameterTie] {
        &self.ties
    }

    /// Members first, then the composite's own ties
    fn apply_ties(&mut self) -> Result<(), FunctionError> {
        for function in &mut self.functions {
            function.apply_ties()?;
        }
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
        debug!("{}: constraint {}", self.name, constraint.as_string());
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

    fn penalty(&self) -> f64 {
        let own: f64 = self
            .constraints
            .iter()
            .filter_map(|c| {
                self.get_parameter(c.parameter_name())
                    .ok()
                    .map(|value| c.check(value))
            })
            .sum();
        own + self.functions.iter().map(|f| f.penalty()).sum::<f64>()
    }

    fn function_1d(&self, x: f64) -> f64 {
        self.functions.iter().map(|f| f.function_1d(x)).sum()
    }

    fn as_string(&self) -> String {
        let changed: Vec<&(String, Attribute)> = self
            .attributes
            .iter()
            .filter(|slot| !self.default_attributes.contains(slot))
            .collect();

        // Without a header a single member would read back as a simple function
        let mut out = String::new();
        if self.name != "CompositeFunction" || !changed.is_empty() || self.functions.len() < 2 {
            let _ = write!(out, "composite={}", self.name);
            for (name, value) in changed {
                let _ = write!(out, ",{}={}", name, value.value_string());
            }
            out.push(';');
        }

        for (i, function) in self.functions.iter().enumerate() {
            if i > 0 {
                out.push(';');
            }
            if function.as_composite().is_some() {
                let _ = write!(out, "({})", function.as_string());
            } else {
                out.push_str(&function.as_string());
            }
            for slot in &self.local_attributes[i] {
                if !self.local_defaults.contains(slot) {
                    let _ = write!(out, ",${}={}", slot.0, slot.1.value_string());
                }
            }
        }

        write_ties_and_constraints(&mut out, ';', &self.ties, &self.constraints);
        out
    }

    fn as_composite(&self) -> Option<&dyn CompositeFunction> {
        Some(self)
    }

    fn as_composite_mut(&mut self) -> Option<&mut dyn CompositeFunction> {
        Some(self)
    }
}

impl CompositeFunction for Composite {
    fn add_function(&mut self, function: Box<dyn Function>) -> usize {
        debug!(
            "{}: member f{} = {}",
            self.name,
            self.functions.len(),
            function.name()
        );
        self.functions.push(function);
        self.local_attributes.push(self.local_defaults.clone());
        self.functions.len() - 1
    }

    fn n_functions(&self) -> usize {
        self.functions.len()
    }

    fn get_function(&self, index: usize) -> Result<&dyn Function, FunctionError> {
        self.functions
            .get(index)
            .map(|f| f.as_ref())
            .ok_or_else(|| self.out_of_range(index))
    }

    fn get_function_mut(&mut self, index: usize) -> Result<&mut dyn Function, FunctionError> {
        let err = self.out_of_range(index);
        match self.functions.get_mut(index) {
            Some(function) => Ok(function.as_mut()),
            None => Err(err),
        }
    }

    fn has_local_attribute(&self, name: &str) -> bool {
        self.local_defaults.iter().any(|(n, _)| n == name)
    }

    fn local_attribute_names(&self) -> Vec<String> {
        self.local_defaults.iter().map(|(n, _)| n.clone()).collect()
    }

    fn get_local_attribute(&self, index: usize, name: &str) -> Result<Attribute, FunctionError> {
        let slots = self
            .local_attributes
            .get(index)
            .ok_or_else(|| self.out_of_range(index))?;
        slots
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| FunctionError::UnknownAttribute {
                function: self.name.clone(),
                attribute: name.to_string(),
            })
    }

    fn set_local_attribute_value(
        &mut self,
        index: usize,
        name: &str,
        text: &str,
    ) -> Result<(), FunctionError> {
        let mut value = self.get_local_attribute(index, name)?;
        value.set_from_str(name, text)?;
        replace_typed(&mut self.local_attributes[index], &self.name, name, value).map(|_| ())
    }
}
