//! Numeric evaluation of parsed formulas
//!
//! Used by parameter ties: a tie formula is evaluated against the parameters
//! of its owning function. Only the arithmetic part of the default operator
//! table is meaningful here (`+ - * / ^`, prefix `+`/`-`) together with a
//! small table of elementary functions.

use crate::Expression;
use std::ops::RangeInclusive;

/// Elementary function callable from a formula
struct MathFunction {
    name: &'static str,
    arity: RangeInclusive<usize>,
    eval: fn(&[f64]) -> Option<f64>,
}

static MATH_FUNCTIONS: &[MathFunction] = &[
    MathFunction {
        name: "sin",
        arity: 1..=1,
        eval: |args| Some(args[0].sin()),
    },
    MathFunction {
        name: "cos",
        arity: 1..=1,
        eval: |args| Some(args[0].cos()),
    },
    MathFunction {
        name: "tan",
        arity: 1..=1,
        eval: |args| Some(args[0].tan()),
    },
    MathFunction {
        name: "exp",
        arity: 1..=1,
        eval: |args| Some(args[0].exp()),
    },
    MathFunction {
        name: "log",
        arity: 1..=1,
        eval: |args| (args[0] > 0.0).then(|| args[0].ln()),
    },
    MathFunction {
        name: "sqrt",
        arity: 1..=1,
        eval: |args| (args[0] >= 0.0).then(|| args[0].sqrt()),
    },
    MathFunction {
        name: "abs",
        arity: 1..=1,
        eval: |args| Some(args[0].abs()),
    },
    MathFunction {
        name: "min",
        arity: 2..=2,
        eval: |args| Some(args[0].min(args[1])),
    },
    MathFunction {
        name: "max",
        arity: 2..=2,
        eval: |args| Some(args[0].max(args[1])),
    },
];

fn math_function(name: &str) -> Option<&'static MathFunction> {
    MATH_FUNCTIONS.iter().find(|f| f.name == name)
}

/// Evaluate `expr`, resolving identifiers through `lookup`
pub(crate) fn evaluate(expr: &Expression, lookup: &dyn Fn(&str) -> Option<f64>) -> Result<f64, String> {
    if expr.is_leaf() {
        return evaluate_leaf(expr, lookup);
    }

    if expr.is_unary() {
        let value = evaluate(&expr.terms()[0], lookup)?;
        return match expr.name() {
            "-" => Ok(-value),
            "+" => Ok(value),
            op => Err(format!("unary operator {} cannot be evaluated", op)),
        };
    }

    if expr.is_operator() {
        return evaluate_chain(expr, lookup);
    }

    // Bracket group
    if expr.name().is_empty() {
        return evaluate(&expr.terms()[0], lookup);
    }

    let function = math_function(expr.name())
        .ok_or_else(|| format!("unknown function {}", expr.name()))?;
    if !function.arity.contains(&expr.len()) {
        return Err(format!(
            "function {} takes {} argument(s), got {}",
            function.name,
            function.arity.start(),
            expr.len()
        ));
    }
    let args = expr
        .iter()
        .map(|arg| evaluate(arg, lookup))
        .collect::<Result<Vec<f64>, String>>()?;
    (function.eval)(&args).ok_or_else(|| format!("{} is undefined for {:?}", function.name, args))
}

fn evaluate_leaf(expr: &Expression, lookup: &dyn Fn(&str) -> Option<f64>) -> Result<f64, String> {
    let name = expr.name();
    if expr.is_empty_marker() {
        return Err("empty expression".to_string());
    }
    if name.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return name
            .parse::<f64>()
            .map_err(|_| format!("{} is not a number", name));
    }
    lookup(name).ok_or_else(|| format!("unknown name {}", name))
}

fn evaluate_chain(expr: &Expression, lookup: &dyn Fn(&str) -> Option<f64>) -> Result<f64, String> {
    let values = expr
        .iter()
        .map(|term| evaluate(term, lookup).map(|v| (term.operator_name(), v)))
        .collect::<Result<Vec<(&str, f64)>, String>>()?;

    match expr.name() {
        "+" => values.iter().try_fold(0.0, |acc, &(op, v)| match op {
            "" | "+" => Ok(acc + v),
            "-" => Ok(acc - v),
            other => Err(format!("unexpected operator {} in sum", other)),
        }),
        "*" => values.iter().try_fold(1.0, |acc, &(op, v)| match op {
            "" | "*" => Ok(acc * v),
            "/" => Ok(acc / v),
            other => Err(format!("unexpected operator {} in product", other)),
        }),
        // Right associative
        "^" => Ok(values
            .iter()
            .rev()
            .map(|&(_, v)| v)
            .reduce(|exponent, base| base.powf(exponent))
            .unwrap_or(f64::NAN)),
        op => Err(format!("operator {} cannot be evaluated", op)),
    }
}
