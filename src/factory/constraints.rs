use super::{FunctionFactory, assignment};
use crate::{Expression, FactoryError, Function};
use log::{debug, warn};

/// `penalty=<value>` item following a constraint
fn penalty_value(expr: &Expression) -> Option<&Expression> {
    assignment(expr)
        .filter(|(key, _)| *key == "penalty")
        .map(|(_, value)| value)
}

impl FunctionFactory {
    /// Attach the constraints of a `constraints=(..)` item
    ///
    /// Each constraint may be followed by a `penalty=<factor>` item that
    /// applies to it alone. A `penalty` item with no constraint right before
    /// it is ignored, as is an empty list.
    pub fn add_constraints(
        &self,
        function: &mut dyn Function,
        expr: &Expression,
    ) -> Result<(), FactoryError> {
        let mut items = expr.to_list(",").into_iter().peekable();
        while let Some(item) = items.next() {
            if item.brackets_removed().is_empty_marker() {
                continue;
            }
            if penalty_value(item).is_some() {
                warn!("{}: ignoring {} with no constraint before it", function.name(), item);
                continue;
            }
            let penalty = items.next_if(|next| penalty_value(next).is_some());
            self.add_constraint(function, item.brackets_removed(), penalty.and_then(penalty_value))?;
        }
        Ok(())
    }

    /// Attach one constraint, with an optional penalty factor expression
    pub fn add_constraint(
        &self,
        function: &mut dyn Function,
        expr: &Expression,
        penalty: Option<&Expression>,
    ) -> Result<(), FactoryError> {
        // Comparison chains are labelled by the first operator of their group
        let kind = match expr.name() {
            "==" => "BoundaryConstraint",
            other => other,
        };
        let mut constraint = self
            .constraints
            .create_constraint(kind, &*function, expr, false)?;

        if let Some(penalty) = penalty {
            let text = penalty.to_string();
            let factor = text
                .parse::<f64>()
                .map_err(|_| FactoryError::InvalidParameterValue {
                    name: "penalty".to_string(),
                    value: text.clone(),
                })?;
            constraint.set_penalty_factor(factor);
        }

        debug!(
            "{}: {} with penalty {}",
            function.name(),
            constraint.as_string(),
            constraint.penalty_factor()
        );
        function.add_constraint(constraint)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{Expression, FactoryError, FunctionError, FunctionFactory};

    #[test]
    fn test_penalty_binds_to_preceding_constraint() {
        let factory = FunctionFactory::new();
        let mut f = factory.create_function("Gaussian").unwrap();
        let expr = Expression::parse("0<Sigma<10,penalty=5,Height<3").unwrap();
        factory.add_constraints(f.as_mut(), &expr).unwrap();

        let sigma = f.get_constraint("Sigma").unwrap();
        assert_eq!(sigma.penalty_factor(), 5.0);
        let height = f.get_constraint("Height").unwrap();
        assert_eq!(height.penalty_factor(), height.default_penalty_factor());
    }

    #[test]
    fn test_bad_penalty_value() {
        let factory = FunctionFactory::new();
        let mut f = factory.create_function("Gaussian").unwrap();
        let expr = Expression::parse("0<Sigma,penalty=high").unwrap();
        assert!(matches!(
            factory.add_constraints(f.as_mut(), &expr),
            Err(FactoryError::InvalidParameterValue { name, .. }) if name == "penalty"
        ));
    }

    #[test]
    fn test_stray_penalties_are_ignored() {
        let factory = FunctionFactory::new();
        let mut f = factory.create_function("Gaussian").unwrap();
        let expr = Expression::parse("penalty=5,0<Sigma<10").unwrap();
        factory.add_constraints(f.as_mut(), &expr).unwrap();
        let sigma = f.get_constraint("Sigma").unwrap();
        assert_eq!(sigma.penalty_factor(), sigma.default_penalty_factor());

        let mut f = factory.create_function("Gaussian").unwrap();
        let expr = Expression::parse("0<Sigma<10,penalty=5,penalty=6").unwrap();
        factory.add_constraints(f.as_mut(), &expr).unwrap();
        assert_eq!(f.constraints().len(), 1);
        assert_eq!(f.get_constraint("Sigma").unwrap().penalty_factor(), 5.0);
    }

    #[test]
    fn test_empty_constraint_list_adds_nothing() {
        let factory = FunctionFactory::new();
        let mut f = factory.create_function("Gaussian").unwrap();
        let expr = Expression::parse("()").unwrap();
        factory.add_constraints(f.as_mut(), &expr).unwrap();
        assert!(f.constraints().is_empty());
    }

    #[test]
    fn test_unknown_constraint_kind() {
        let factory = FunctionFactory::new();
        let mut f = factory.create_function("Gaussian").unwrap();
        let expr = Expression::parse("Sigma&&Height").unwrap();
        assert!(matches!(
            factory.add_constraints(f.as_mut(), &expr),
            Err(FactoryError::Function(FunctionError::UnknownConstraint(kind))) if kind == "&&"
        ));
    }
}
