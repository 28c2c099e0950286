use crate::{
    Attribute, CompositeFunction, FactoryError, Function, FunctionError, create_initialized,
};

fn composite(f: &dyn Function) -> &dyn CompositeFunction {
    f.as_composite().expect("a composite function")
}

#[test]
fn test_members_in_declaration_order() {
    let f = create_initialized("name=LinearBackground,A0=0;name=Gaussian,PeakCentre=10,Sigma=1")
        .unwrap();
    assert_eq!(f.name(), "CompositeFunction");
    let c = composite(f.as_ref());
    assert_eq!(c.n_functions(), 2);
    assert_eq!(c.get_function(0).unwrap().name(), "LinearBackground");
    let gaussian = c.get_function(1).unwrap();
    assert_eq!(gaussian.name(), "Gaussian");
    assert_eq!(gaussian.get_parameter("PeakCentre"), Ok(10.0));
    assert_eq!(f.get_parameter("f1.PeakCentre"), Ok(10.0));
    assert!(matches!(
        c.get_function(2),
        Err(FunctionError::MemberOutOfRange { index: 2, size: 2 })
    ));
}

#[test]
fn test_composite_header_is_consumed() {
    let f = create_initialized(
        "composite=MultiDomainFunction;name=FlatBackground,A0=1;name=FlatBackground,A0=2",
    )
    .unwrap();
    assert_eq!(f.name(), "MultiDomainFunction");
    let c = composite(f.as_ref());
    assert_eq!(c.n_functions(), 2);
    assert_eq!(f.get_parameter("f0.A0"), Ok(1.0));
    assert_eq!(f.get_parameter("f1.A0"), Ok(2.0));
}

#[test]
fn test_composite_header_attributes() {
    let f = create_initialized("composite=CompositeFunction,NumDeriv=true;name=Gaussian;name=Gaussian")
        .unwrap();
    assert_eq!(f.get_attribute("NumDeriv"), Ok(Attribute::Bool(true)));
    assert_eq!(composite(f.as_ref()).n_functions(), 2);

    let err = create_initialized("composite=CompositeFunction,Colour=red;name=Gaussian").unwrap_err();
    assert!(matches!(
        err,
        FactoryError::Function(FunctionError::UnknownAttribute { .. })
    ));
}

#[test]
fn test_header_only_composite() {
    let f = create_initialized("composite=CompositeFunction;").unwrap();
    assert_eq!(f.name(), "CompositeFunction");
    assert_eq!(composite(f.as_ref()).n_functions(), 0);
}

#[test]
fn test_header_must_name_a_composite() {
    let err = create_initialized("composite=Gaussian;name=FlatBackground").unwrap_err();
    assert_eq!(
        err,
        FactoryError::Function(FunctionError::NotComposite("Gaussian".to_string()))
    );
}

#[test]
fn test_nested_composites() {
    let f = create_initialized(
        "name=FlatBackground,A0=1;(name=Gaussian,Height=2;name=Gaussian,Height=3);name=LinearBackground",
    )
    .unwrap();
    let c = composite(f.as_ref());
    assert_eq!(c.n_functions(), 3);
    let inner = c.get_function(1).unwrap();
    assert_eq!(inner.name(), "CompositeFunction");
    assert_eq!(composite(inner).n_functions(), 2);
    assert_eq!(f.get_parameter("f1.f1.Height"), Ok(3.0));
    assert_eq!(f.n_params(), 1 + 6 + 2);
}

#[test]
fn test_nested_composite_as_first_member() {
    let f = create_initialized("(name=Gaussian;name=Gaussian);name=FlatBackground").unwrap();
    let c = composite(f.as_ref());
    assert_eq!(c.n_functions(), 2);
    assert!(c.get_function(0).unwrap().as_composite().is_some());
    assert_eq!(c.get_function(1).unwrap().name(), "FlatBackground");
}

#[test]
fn test_nested_composite_with_header() {
    let f = create_initialized(
        "name=FlatBackground;(composite=MultiDomainFunction;name=Gaussian,$domains=i;name=Gaussian,$domains=\"0,1\")",
    )
    .unwrap();
    let inner = composite(f.as_ref()).get_function(1).unwrap();
    assert_eq!(inner.name(), "MultiDomainFunction");
    let inner = composite(inner);
    assert_eq!(
        inner.get_local_attribute(0, "domains"),
        Ok(Attribute::Str("i".to_string()))
    );
    assert_eq!(
        inner.get_local_attribute(1, "domains"),
        Ok(Attribute::Str("0,1".to_string()))
    );
}

#[test]
fn test_local_attributes_set_per_member() {
    let f = create_initialized(
        "composite=MultiDomainFunction;name=FlatBackground,$domains=i;name=FlatBackground",
    )
    .unwrap();
    let c = composite(f.as_ref());
    assert!(c.has_local_attribute("domains"));
    assert_eq!(
        c.get_local_attribute(0, "domains"),
        Ok(Attribute::Str("i".to_string()))
    );
    assert_eq!(
        c.get_local_attribute(1, "domains"),
        Ok(Attribute::Str("All".to_string()))
    );
}

#[test]
fn test_parent_attributes_bubble_up() {
    // The inner generic composite has no `domains`; the outer one does
    let f = create_initialized(
        "composite=MultiDomainFunction;(name=FlatBackground,$domains=i;name=FlatBackground);name=Gaussian",
    )
    .unwrap();
    let c = composite(f.as_ref());
    assert_eq!(
        c.get_local_attribute(0, "domains"),
        Ok(Attribute::Str("i".to_string()))
    );
    assert_eq!(
        c.get_local_attribute(1, "domains"),
        Ok(Attribute::Str("All".to_string()))
    );
}

#[test]
fn test_function_value_is_sum() {
    let f = create_initialized("name=LinearBackground,A0=1,A1=2;name=FlatBackground,A0=0.5").unwrap();
    assert_eq!(f.function_1d(2.0), 5.5);
}

#[test]
fn test_errors_in_members_fail_the_whole_call() {
    let err = create_initialized("name=Gaussian;name=FlatBackground,A0=x").unwrap_err();
    assert_eq!(
        err,
        FactoryError::InvalidParameterValue {
            name: "A0".to_string(),
            value: "x".to_string(),
        }
    );
    assert!(create_initialized("name=Gaussian;(name=Nope;name=Gaussian)").is_err());
}

#[test]
fn test_string_form_reads_back() {
    let inputs = [
        "name=LinearBackground,A0=1,A1=0;name=Gaussian,Height=2,PeakCentre=10,Sigma=1",
        "composite=MultiDomainFunction;name=FlatBackground,A0=1,$domains=\"i\";name=FlatBackground,A0=2",
        "name=FlatBackground,A0=1;(name=Gaussian,Height=2;name=Gaussian,Height=3)",
        "name=Gaussian,Height=1;name=Gaussian,Height=1;ties=(f1.Sigma=f0.Sigma)",
        "composite=CompositeFunction,NumDeriv=true;name=FlatBackground,A0=0",
        "composite=MultiDomainFunction;(name=FlatBackground;name=FlatBackground,$domains=i);name=Gaussian",
        "composite=MultiDomainFunction;(name=FlatBackground;name=FlatBackground),$domains=\"0,1\";name=Gaussian",
        "name=FlatBackground;(composite=MultiDomainFunction;name=Gaussian,$domains=i;name=Gaussian)",
        "(composite=MultiDomainFunction;name=Gaussian;name=Gaussian,$domains=j);name=LinearBackground",
        "composite=MultiDomainFunction;(composite=MultiDomainFunction;name=Gaussian,$domains=i;name=Gaussian),$domains=j;name=Gaussian",
    ];
    for input in inputs {
        let f = create_initialized(input).unwrap();
        let text = f.as_string();
        let g = create_initialized(&text).unwrap();
        assert_eq!(g.as_string(), text, "{}", input);
        assert_eq!(g.n_params(), f.n_params());
    }
}

#[test]
fn test_nested_member_with_local_attribute_reads_back() {
    let f = create_initialized(
        "composite=MultiDomainFunction;(name=FlatBackground;name=FlatBackground,$domains=i);name=Gaussian",
    )
    .unwrap();
    let text = f.as_string();
    assert!(
        text.starts_with("composite=MultiDomainFunction;(name=FlatBackground,A0=0;name=FlatBackground,A0=0),$domains=\"i\";"),
        "{}",
        text
    );

    let g = create_initialized(&text).unwrap();
    let c = composite(g.as_ref());
    assert_eq!(c.n_functions(), 2);
    assert_eq!(
        c.get_local_attribute(0, "domains"),
        Ok(Attribute::Str("i".to_string()))
    );
    assert_eq!(g.as_string(), text);
}

#[test]
fn test_nested_member_attributes_override_inner_ones() {
    // The inner member's `$domains=i` bubbles up, the outer `$domains=j` is stated for the group
    let f = create_initialized(
        "composite=MultiDomainFunction;(name=FlatBackground,$domains=i;name=FlatBackground),$domains=j",
    )
    .unwrap();
    assert_eq!(
        composite(f.as_ref()).get_local_attribute(0, "domains"),
        Ok(Attribute::Str("j".to_string()))
    );
}

#[test]
fn test_nested_member_rejects_other_trailing_items() {
    let err = create_initialized(
        "composite=MultiDomainFunction;(name=FlatBackground;name=FlatBackground),A0=1",
    )
    .unwrap_err();
    assert_eq!(err, FactoryError::InvalidInput("A0=1".to_string()));
}

#[test]
fn test_composite_items_may_lead_the_chain() {
    let f = create_initialized(
        "ties=(f1.A0=f0.A0);name=FlatBackground,A0=5;name=FlatBackground",
    )
    .unwrap();
    assert_eq!(f.name(), "CompositeFunction");
    assert_eq!(composite(f.as_ref()).n_functions(), 2);
    assert_eq!(f.get_parameter("f1.A0"), Ok(5.0));

    let f = create_initialized("constraints=(f0.A0<1);name=FlatBackground").unwrap();
    assert!(f.get_constraint("f0.A0").is_some());

    let err = create_initialized("ties=(f3.A0=1);name=FlatBackground").unwrap_err();
    assert!(matches!(
        err,
        FactoryError::Function(FunctionError::UnknownParameter { parameter, .. }) if parameter == "f3.A0"
    ));
}
