//! Built-in function definitions
//!
//! Each definition names a function type, declares its initial parameters and
//! attributes, and provides its evaluation. Types whose parameter list depends
//! on an attribute (`Polynomial`, `Chebyshev`, `UserFunction`) redeclare their
//! parameters from an `attribute_changed` hook.

use super::param_function::ParamFunction;
use super::Attribute;
use crate::evaluator::evaluate;
use crate::{Expression, Function, FunctionError};
use std::f64::consts::PI;

/// Definition of a parametrised function type
#[derive(Debug)]
pub(crate) struct FunctionDefinition {
    /// Registered type name (e.g., "Gaussian")
    pub name: &'static str,

    /// Initial parameters with their default values
    pub parameters: &'static [(&'static str, f64)],

    /// Attributes with their default values, in serialisation order
    pub attributes: fn() -> Vec<(&'static str, Attribute)>,

    /// Called after an attribute has been set; an error restores the previous value
    pub attribute_changed: Option<fn(&mut ParamFunction, &str) -> Result<(), FunctionError>>,

    /// Value of the function at `x`
    pub eval: fn(&ParamFunction, f64) -> f64,
}

static DEFINITIONS: [FunctionDefinition; 8] = [
    FunctionDefinition {
        name: "Gaussian",
        parameters: &[("Height", 0.0), ("PeakCentre", 0.0), ("Sigma", 1.0)],
        attributes: Vec::new,
        attribute_changed: None,
        eval: |f, x| {
            let (height, centre, sigma) = (f.value(0), f.value(1), f.value(2));
            let z = (x - centre) / sigma;
            height * (-0.5 * z * z).exp()
        },
    },
    FunctionDefinition {
        name: "Lorentzian",
        parameters: &[("Amplitude", 1.0), ("PeakCentre", 0.0), ("FWHM", 1.0)],
        attributes: Vec::new,
        attribute_changed: None,
        eval: |f, x| {
            let (amplitude, centre, fwhm) = (f.value(0), f.value(1), f.value(2));
            let half = fwhm / 2.0;
            let dx = x - centre;
            amplitude / PI * half / (dx * dx + half * half)
        },
    },
    FunctionDefinition {
        name: "LinearBackground",
        parameters: &[("A0", 0.0), ("A1", 0.0)],
        attributes: Vec::new,
        attribute_changed: None,
        eval: |f, x| f.value(0) + f.value(1) * x,
    },
    FunctionDefinition {
        name: "FlatBackground",
        parameters: &[("A0", 0.0)],
        attributes: Vec::new,
        attribute_changed: None,
        eval: |f, _| f.value(0),
    },
    FunctionDefinition {
        name: "Polynomial",
        parameters: &[("A0", 0.0)],
        attributes: || vec![("n", Attribute::Int(0))],
        attribute_changed: Some(declare_coefficients),
        eval: |f, x| {
            // Horner
            f.values().iter().rev().fold(0.0, |acc, a| acc * x + a)
        },
    },
    FunctionDefinition {
        name: "Chebyshev",
        parameters: &[("A0", 0.0)],
        attributes: || {
            vec![
                ("n", Attribute::Int(0)),
                ("StartX", Attribute::Double(-1.0)),
                ("EndX", Attribute::Double(1.0)),
            ]
        },
        attribute_changed: Some(declare_coefficients),
        eval: chebyshev,
    },
    FunctionDefinition {
        name: "UserFunction",
        parameters: &[],
        attributes: || vec![("Formula", Attribute::Str(String::new()))],
        attribute_changed: Some(compile_formula),
        eval: |f, x| {
            let Some(formula) = f.formula() else {
                return 0.0;
            };
            evaluate(formula, &|name| {
                if name == "x" {
                    Some(x)
                } else {
                    f.get_parameter(name).ok()
                }
            })
            .unwrap_or(f64::NAN)
        },
    },
    FunctionDefinition {
        name: "TabulatedFunction",
        parameters: &[("Scaling", 1.0), ("Shift", 0.0), ("XScaling", 1.0)],
        attributes: || {
            vec![
                ("X", Attribute::Vector(Vec::new())),
                ("Y", Attribute::Vector(Vec::new())),
            ]
        },
        attribute_changed: None,
        eval: tabulated,
    },
];

/// Return all function definitions for populating the registry
pub(crate) fn all_definitions() -> &'static [FunctionDefinition] {
    &DEFINITIONS
}

/// Highest degree accepted for `Polynomial` and `Chebyshev`
pub(crate) const MAX_DEGREE: i64 = 1000;

/// `n` changed: parameters become `A0..An`
fn declare_coefficients(f: &mut ParamFunction, attribute: &str) -> Result<(), FunctionError> {
    if attribute != "n" {
        return Ok(());
    }
    let n = f.attribute("n").and_then(Attribute::as_int).unwrap_or(0);
    if !(0..=MAX_DEGREE).contains(&n) {
        return Err(FunctionError::InvalidAttributeValue {
            attribute: "n".to_string(),
            kind: "int",
            value: n.to_string(),
        });
    }
    f.declare_parameters((0..=n).map(|i| format!("A{}", i)).collect());
    Ok(())
}

/// `Formula` changed: parse it and declare every variable except `x`
fn compile_formula(f: &mut ParamFunction, attribute: &str) -> Result<(), FunctionError> {
    if attribute != "Formula" {
        return Ok(());
    }
    let text = f
        .attribute("Formula")
        .and_then(Attribute::as_str)
        .unwrap_or_default()
        .to_string();
    if text.trim().is_empty() {
        f.set_formula(None, Vec::new());
        return Ok(());
    }

    let formula = Expression::parse(&text).map_err(|_| FunctionError::InvalidAttributeValue {
        attribute: "Formula".to_string(),
        kind: "string",
        value: text.clone(),
    })?;
    let names = formula
        .variables()
        .into_iter()
        .filter(|name| name != "x")
        .collect();
    f.set_formula(Some(formula), names);
    Ok(())
}

fn chebyshev(f: &ParamFunction, x: f64) -> f64 {
    let start = f.attribute("StartX").and_then(Attribute::as_double).unwrap_or(-1.0);
    let end = f.attribute("EndX").and_then(Attribute::as_double).unwrap_or(1.0);
    if end <= start {
        return f64::NAN;
    }
    let t = (2.0 * x - (start + end)) / (end - start);

    // Clenshaw recurrence
    let coefficients = f.values();
    let Some((&a0, rest)) = coefficients.split_first() else {
        return 0.0;
    };
    let (mut b1, mut b2) = (0.0, 0.0);
    for &a in rest.iter().rev() {
        let b0 = a + 2.0 * t * b1 - b2;
        b2 = b1;
        b1 = b0;
    }
    a0 + t * b1 - b2
}

fn tabulated(f: &ParamFunction, x: f64) -> f64 {
    let xs = f.attribute("X").and_then(Attribute::as_vector).unwrap_or_default();
    let ys = f.attribute("Y").and_then(Attribute::as_vector).unwrap_or_default();
    let len = xs.len().min(ys.len());
    if len == 0 {
        return 0.0;
    }
    let (xs, ys) = (&xs[..len], &ys[..len]);

    let (scaling, shift, x_scaling) = (f.value(0), f.value(1), f.value(2));
    let u = x_scaling * (x - shift);
    if u < xs[0] || u > xs[len - 1] {
        return 0.0;
    }

    let i = xs.partition_point(|&v| v <= u);
    let value = if i == 0 {
        ys[0]
    } else if i >= len {
        ys[len - 1]
    } else {
        let (x0, x1, y0, y1) = (xs[i - 1], xs[i], ys[i - 1], ys[i]);
        y0 + (y1 - y0) * (u - x0) / (x1 - x0)
    };
    scaling * value
}
