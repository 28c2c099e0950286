use crate::constraints::BoundaryConstraint;
use crate::{
    Constraint, ConstraintRegistry, Expression, FactoryError, Function, FunctionError,
    FunctionFactory, create_initialized,
};
use std::sync::Arc;

#[test]
fn test_constraint_with_penalty() {
    let f = create_initialized("name=Gaussian,Sigma=1,constraints=(0<Sigma<10,penalty=5)").unwrap();
    assert_eq!(f.constraints().len(), 1);
    let c = f.get_constraint("Sigma").unwrap();
    assert_eq!(c.parameter_name(), "Sigma");
    assert_eq!(c.penalty_factor(), 5.0);
    assert_eq!(c.as_string(), "0<Sigma<10");
}

#[test]
fn test_default_penalty() {
    let f = create_initialized("name=Gaussian,constraints=(Height>0)").unwrap();
    let c = f.get_constraint("Height").unwrap();
    assert_eq!(c.penalty_factor(), c.default_penalty_factor());
    assert_eq!(c.as_string(), "0<Height");
}

#[test]
fn test_several_constraints() {
    let f = create_initialized(
        "name=Gaussian,constraints=(0<Sigma<10,penalty=5,Height<100,1<PeakCentre<2,penalty=0.5)",
    )
    .unwrap();
    let factors: Vec<(&str, f64)> = f
        .constraints()
        .iter()
        .map(|c| (c.parameter_name(), c.penalty_factor()))
        .collect();
    assert_eq!(
        factors,
        vec![("Sigma", 5.0), ("Height", 1000.0), ("PeakCentre", 0.5)]
    );
}

#[test]
fn test_constraint_key_suffixes() {
    let f = create_initialized("name=Gaussian,constraint1=(Sigma<3),constraint2=(Height<1)").unwrap();
    assert_eq!(f.constraints().len(), 2);
}

#[test]
fn test_constraint_replaces_previous_on_same_parameter() {
    let f = create_initialized("name=Gaussian,constraints=(Sigma<3,0<Sigma<2)").unwrap();
    assert_eq!(f.constraints().len(), 1);
    assert_eq!(f.get_constraint("Sigma").unwrap().as_string(), "0<Sigma<2");
}

#[test]
fn test_penalty_from_violation() {
    let f = create_initialized(
        "name=Gaussian,Sigma=12,Height=-1,constraints=(0<Sigma<10,penalty=2,Height>0)",
    )
    .unwrap();
    // 2 * (12 - 10)^2 + 1000 * 1^2
    assert_eq!(f.penalty(), 1008.0);

    let f = create_initialized("name=Gaussian,Sigma=5,constraints=(0<Sigma<10)").unwrap();
    assert_eq!(f.penalty(), 0.0);
}

#[test]
fn test_composite_level_constraints() {
    let f = create_initialized(
        "name=Gaussian,Sigma=3;name=Gaussian,Sigma=0.5,constraints=(Sigma>1);constraints=(f0.Sigma<2,penalty=10)",
    )
    .unwrap();
    assert_eq!(f.constraints().len(), 1);
    assert_eq!(f.get_constraint("f0.Sigma").unwrap().penalty_factor(), 10.0);

    // Own constraint: 10 * (3 - 2)^2, member constraint: 1000 * (1 - 0.5)^2
    assert_eq!(f.penalty(), 10.0 + 250.0);
}

#[test]
fn test_constraint_string_form() {
    let f = create_initialized("name=Gaussian,constraints=(Sigma<10,penalty=5,Height>0)").unwrap();
    assert_eq!(
        f.as_string(),
        "name=Gaussian,Height=0,PeakCentre=0,Sigma=1,constraints=(Sigma<10,penalty=5,0<Height)"
    );
}

#[test]
fn test_invalid_constraints() {
    assert!(matches!(
        create_initialized("name=Gaussian,constraints=(0<Width<1)").unwrap_err(),
        FactoryError::Function(FunctionError::UnknownParameter { .. })
    ));
    assert!(matches!(
        create_initialized("name=Gaussian,constraints=(Sigma<Height)").unwrap_err(),
        FactoryError::Function(FunctionError::InvalidConstraint { .. })
    ));
    assert!(matches!(
        create_initialized("name=Gaussian,constraints=(Sigma+1)").unwrap_err(),
        FactoryError::Function(FunctionError::UnknownConstraint(kind)) if kind == "+"
    ));
    assert!(matches!(
        create_initialized("name=Gaussian,constraints=(0<Sigma,penalty=big)").unwrap_err(),
        FactoryError::InvalidParameterValue { name, value } if name == "penalty" && value == "big"
    ));
}

#[test]
fn test_penalty_without_constraint_is_ignored() {
    let f = create_initialized("name=Gaussian,constraints=(penalty=5,0<Sigma<10)").unwrap();
    let c = f.get_constraint("Sigma").unwrap();
    assert_eq!(c.penalty_factor(), c.default_penalty_factor());

    let f = create_initialized("name=Gaussian,constraints=(0<Sigma<10,penalty=5,penalty=6)").unwrap();
    assert_eq!(f.constraints().len(), 1);
    assert_eq!(f.get_constraint("Sigma").unwrap().penalty_factor(), 5.0);
}

#[test]
fn test_empty_constraint_list() {
    let f = create_initialized("name=Gaussian,constraints=()").unwrap();
    assert!(f.constraints().is_empty());
    assert_eq!(f.as_string(), "name=Gaussian,Height=0,PeakCentre=0,Sigma=1");
}

/// Rejects any value above the bound, regardless of how far
#[derive(Debug, Default)]
struct CapConstraint {
    parameter: String,
    cap: f64,
    penalty_factor: f64,
}

impl Constraint for CapConstraint {
    fn initialize(
        &mut self,
        function: &dyn Function,
        expr: &Expression,
        _is_default: bool,
    ) -> Result<(), FunctionError> {
        let invalid = || FunctionError::InvalidConstraint {
            expression: expr.to_string(),
            reason: "expected parameter&&cap".to_string(),
        };
        let [parameter, cap] = expr.terms() else {
            return Err(invalid());
        };
        if function.parameter_index(parameter.name()).is_none() {
            return Err(invalid());
        }
        self.parameter = parameter.name().to_string();
        self.cap = cap.name().parse().map_err(|_| invalid())?;
        self.penalty_factor = self.default_penalty_factor();
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
        1.0
    }

    fn is_default(&self) -> bool {
        false
    }

    fn check(&self, value: f64) -> f64 {
        if value > self.cap { self.penalty_factor } else { 0.0 }
    }

    fn as_string(&self) -> String {
        format!("{}&&{}", self.parameter, self.cap)
    }
}

#[test]
fn test_custom_constraint_type_by_operator() {
    let mut registry = ConstraintRegistry::with_builtins();
    registry.subscribe("&&", || Box::<CapConstraint>::default());
    let factory = FunctionFactory::new().constraint_registry(Arc::new(registry));

    let f = factory
        .create_initialized("name=Gaussian,Height=4,constraints=(Height&&3,penalty=7)")
        .unwrap();
    assert_eq!(f.penalty(), 7.0);
    assert_eq!(f.get_constraint("Height").unwrap().as_string(), "Height&&3");
}

#[test]
fn test_equality_label_maps_to_boundary() {
    // A comparison chain is labelled `==`, which selects BoundaryConstraint
    let expr = Expression::parse("1<=Sigma").unwrap();
    assert_eq!(expr.name(), "==");

    let factory = FunctionFactory::new();
    let mut f = factory.create_function("Gaussian").unwrap();
    factory.add_constraint(f.as_mut(), &expr, None).unwrap();
    assert_eq!(f.get_constraint("Sigma").unwrap().as_string(), "1<Sigma");

    let boundary = BoundaryConstraint::with_bounds("Sigma", Some(1.0), None);
    assert_eq!(boundary.as_string(), "1<Sigma");
}
