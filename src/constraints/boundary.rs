use super::Constraint;
use crate::{Expression, Function, FunctionError};

/// Penalty factor of a boundary constraint unless the model sets one
pub const DEFAULT_PENALTY_FACTOR: f64 = 1000.0;

/// Lower and/or upper bound on a parameter, written `0<Sigma<10`, `Sigma<10`
/// or `10>Sigma`
///
/// A value outside the bounds costs `factor * distance^2`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryConstraint {
    parameter: String,
    lower: Option<f64>,
    upper: Option<f64>,
    penalty_factor: f64,
    is_default: bool,
}

impl Default for BoundaryConstraint {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundaryConstraint {
    /// Unbound constraint, configured by [`Constraint::initialize`]
    pub fn new() -> Self {
        BoundaryConstraint {
            parameter: String::new(),
            lower: None,
            upper: None,
            penalty_factor: DEFAULT_PENALTY_FACTOR,
            is_default: false,
        }
    }

    pub fn with_bounds(parameter: impl Into<String>, lower: Option<f64>, upper: Option<f64>) -> Self {
        BoundaryConstraint {
            parameter: parameter.into(),
            lower,
            upper,
            ..Self::new()
        }
    }

    pub fn lower(&self) -> Option<f64> {
        self.lower
    }

    pub fn upper(&self) -> Option<f64> {
        self.upper
    }
}

impl Constraint for BoundaryConstraint {
    fn initialize(
        &mut self,
        function: &dyn Function,
        expr: &Expression,
        is_default: bool,
    ) -> Result<(), FunctionError> {
        let invalid = |reason: String| FunctionError::InvalidConstraint {
            expression: expr.to_string(),
            reason,
        };

        let terms = expr.terms();
        if terms.len() < 2 {
            return Err(invalid("expected a parameter and at least one bound".to_string()));
        }
        if terms.len() > 3 {
            return Err(invalid("too many terms".to_string()));
        }

        let mut parameter: Option<(usize, String)> = None;
        let mut values = Vec::with_capacity(2);
        for (i, term) in terms.iter().enumerate() {
            let text = term.to_string();
            match text.parse::<f64>() {
                Ok(value) => values.push((i, value)),
                Err(_) if parameter.is_some() => {
                    return Err(invalid("Non-numeric value for a bound".to_string()));
                }
                Err(_) => parameter = Some((i, text)),
            }
        }
        let (position, name) =
            parameter.ok_or_else(|| invalid("no parameter to constrain".to_string()))?;
        if function.parameter_index(&name).is_none() {
            return Err(FunctionError::UnknownParameter {
                function: function.name().to_string(),
                parameter: name,
            });
        }

        let (mut lower, mut upper) = (None, None);
        for (i, value) in values {
            // Comparison between this term and its neighbour towards the parameter
            let (op, before) = if i < position {
                (terms[i + 1].operator_name(), true)
            } else {
                (terms[i].operator_name(), false)
            };
            let is_lower = match op {
                "<" | "<=" => before,
                ">" | ">=" => !before,
                other => return Err(invalid(format!("unsupported comparison '{}'", other))),
            };
            let slot = if is_lower { &mut lower } else { &mut upper };
            if slot.replace(value).is_some() {
                return Err(invalid("both bounds are on the same side".to_string()));
            }
        }

        if let (Some(lo), Some(hi)) = (lower, upper)
            && lo > hi
        {
            return Err(invalid("Lower bound is greater than upper bound".to_string()));
        }

        self.parameter = name;
        self.lower = lower;
        self.upper = upper;
        self.is_default = is_default;
        Ok(())
    }

    fn parameter_name(&self) -> &str {
        &self.parameter
    }

    fn penalty_factor(&self) -> f64 {
        self.penalty_factor
    }

    fn set_penalty_factor(&mut self, factor: f64) {
        self.penalty_factor = factor;
    }

    fn default_penalty_factor(&self) -> f64 {
        DEFAULT_PENALTY_FACTOR
    }

    fn is_default(&self) -> bool {
        self.is_default
    }

    fn check(&self, value: f64) -> f64 {
        let distance = match (self.lower, self.upper) {
            (Some(lo), _) if value < lo => lo - value,
            (_, Some(hi)) if value > hi => value - hi,
            _ => return 0.0,
        };
        self.penalty_factor * distance * distance
    }

    fn as_string(&self) -> String {
        match (self.lower, self.upper) {
            (Some(lo), Some(hi)) => format!("{}<{}<{}", lo, self.parameter, hi),
            (Some(lo), None) => format!("{}<{}", lo, self.parameter),
            (None, Some(hi)) => format!("{}<{}", self.parameter, hi),
            (None, None) => self.parameter.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FunctionRegistry;

    fn boundary(text: &str) -> Result<BoundaryConstraint, FunctionError> {
        let gaussian = FunctionRegistry::shared().create_function("Gaussian").unwrap();
        let expr = Expression::parse(text).unwrap();
        let mut constraint = BoundaryConstraint::new();
        constraint.initialize(gaussian.as_ref(), &expr, false)?;
        Ok(constraint)
    }

    #[test]
    fn test_two_sided() {
        let c = boundary("0<Sigma<10").unwrap();
        assert_eq!(c.parameter_name(), "Sigma");
        assert_eq!((c.lower(), c.upper()), (Some(0.0), Some(10.0)));
        assert_eq!(c.as_string(), "0<Sigma<10");

        let c = boundary("10 > Sigma > -1").unwrap();
        assert_eq!((c.lower(), c.upper()), (Some(-1.0), Some(10.0)));
    }

    #[test]
    fn test_one_sided() {
        let c = boundary("Height<5").unwrap();
        assert_eq!((c.lower(), c.upper()), (None, Some(5.0)));
        let c = boundary("1e-3<Sigma").unwrap();
        assert_eq!((c.lower(), c.upper()), (Some(0.001), None));
        let c = boundary("Sigma>=2").unwrap();
        assert_eq!(c.as_string(), "2<Sigma");
    }

    #[test]
    fn test_penalty() {
        let mut c = boundary("0<Sigma<10").unwrap();
        assert_eq!(c.penalty_factor(), DEFAULT_PENALTY_FACTOR);
        assert_eq!(c.check(5.0), 0.0);
        assert_eq!(c.check(-2.0), 4000.0);
        c.set_penalty_factor(5.0);
        assert_eq!(c.check(13.0), 45.0);
    }

    #[test]
    fn test_invalid() {
        assert!(matches!(
            boundary("0<Sigma<Height"),
            Err(FunctionError::InvalidConstraint { reason, .. }) if reason == "Non-numeric value for a bound"
        ));
        assert!(matches!(
            boundary("0<Width"),
            Err(FunctionError::UnknownParameter { .. })
        ));
        assert!(boundary("10<Sigma<1").is_err());
        assert!(boundary("0<1<Sigma").is_err());
        assert!(boundary("Sigma==1").is_err());
    }
}
