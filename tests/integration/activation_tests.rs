use crate::common::{TestBed, DUMMY_CLASS};
use static_double::{CallableDescriptor, MockError, Modifiers, Value};

#[test]
fn test_round_trip_restores_original() {
    let bed = TestBed::new();
    let original_body = bed.body_of("publicStaticFunction");
    let original_names = bed.method_names();

    let mock = bed
        .session
        .mock(DUMMY_CLASS, "publicStaticFunction", Value::from("barrett is awesome"), true)
        .unwrap();
    assert_ne!(bed.body_of("publicStaticFunction"), original_body);
    assert_eq!(bed.method_names().len(), original_names.len() + 1);

    assert!(mock.deactivate());
    assert_eq!(bed.body_of("publicStaticFunction"), original_body);
    assert_eq!(bed.method_names(), original_names);
}

#[test]
fn test_deactivate_is_idempotent() {
    let bed = TestBed::new();
    let mock = bed
        .session
        .mock(DUMMY_CLASS, "publicStaticFunction", Value::Null, true)
        .unwrap();

    assert!(mock.deactivate());
    let calls_after_first = bed.rebinder_calls();
    assert!(!mock.deactivate());
    assert_eq!(bed.rebinder_calls(), calls_after_first);
}

#[test]
fn test_activation_uses_three_primitives_in_order() {
    let bed = TestBed::new();
    let _mock = bed
        .session
        .mock(DUMMY_CLASS, "publicStaticFunction", Value::Null, true)
        .unwrap();

    let host = bed.host.borrow();
    let operations: Vec<&str> = host
        .calls
        .iter()
        .filter_map(|c| c.split_whitespace().next())
        .collect();
    assert_eq!(operations, vec!["copy_method", "remove_method", "add_method"]);
    assert!(host.calls[0].contains("publicStaticFunction -> publicStaticFunctionoverride"));
}

#[test]
fn test_replacement_keeps_visibility_static_and_final() {
    let bed = TestBed::new();
    let _protected = bed
        .session
        .mock(DUMMY_CLASS, "protectedStaticFunction", CallableDescriptor::closure("echo"), true)
        .unwrap();
    let _final = bed
        .session
        .mock(DUMMY_CLASS, "withDefaults", CallableDescriptor::closure("echo"), true)
        .unwrap();

    let host = bed.host.borrow();
    let protected = host.table.method(DUMMY_CLASS, "protectedStaticFunction").unwrap();
    assert_eq!(protected.modifiers, Modifiers::PROTECTED | Modifiers::STATIC);
    assert_eq!(protected.parameters, "$user");
    assert!(protected.body.ends_with(" return $user; "));

    let with_defaults = host.table.method(DUMMY_CLASS, "withDefaults").unwrap();
    assert_eq!(
        with_defaults.modifiers,
        Modifiers::FINAL | Modifiers::PUBLIC | Modifiers::STATIC
    );
}

#[test]
fn test_arity_guard_makes_no_rebinder_calls() {
    let bed = TestBed::new();
    let err = bed
        .session
        .mock(DUMMY_CLASS, "protectedStaticFunction", CallableDescriptor::closure("pair"), true)
        .err()
        .unwrap();

    match err {
        MockError::Arity {
            target,
            parameters,
            replacement_required,
            target_required,
            location,
        } => {
            assert_eq!(target, "StaticDouble\\Tests\\dummy::protectedStaticFunction");
            assert_eq!(parameters, "$user");
            assert_eq!(replacement_required, 2);
            assert_eq!(target_required, 1);
            assert!(location.ends_with("dummy.php:9"));
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(bed.rebinder_calls(), 0);
    assert_eq!(bed.session.active_count(), 0);
}

#[test]
fn test_arity_guard_leaves_existing_mock_installed() {
    let bed = TestBed::new();
    let first = bed
        .session
        .mock(DUMMY_CLASS, "protectedStaticFunction", Value::from(1), true)
        .unwrap();
    let body = bed.body_of("protectedStaticFunction");
    let calls = bed.rebinder_calls();

    let second = bed.session.mock(
        DUMMY_CLASS,
        "protectedStaticFunction",
        CallableDescriptor::closure("pair"),
        true,
    );
    assert!(matches!(second, Err(MockError::Arity { .. })));
    assert_eq!(bed.rebinder_calls(), calls);
    assert_eq!(bed.body_of("protectedStaticFunction"), body);
    assert!(first.is_active());
}

#[test]
fn test_unknown_target_is_a_configuration_error() {
    let bed = TestBed::new();
    let err = bed
        .session
        .mock(DUMMY_CLASS, "nope", Value::Null, true)
        .err()
        .unwrap();
    assert!(matches!(err, MockError::Configuration(_)));
    assert_eq!(bed.rebinder_calls(), 0);
}

#[test]
fn test_target_names_are_case_insensitive() {
    let bed = TestBed::new();
    let _mock = bed
        .session
        .mock("staticdouble\\tests\\DUMMY", "PUBLICSTATICFUNCTION", Value::Null, true)
        .unwrap();
    assert!(bed.session.is_active(DUMMY_CLASS, "publicStaticFunction"));
    assert!(bed.method_names().contains(&"publicStaticFunction".to_string()));
}

#[test]
fn test_rebind_failure_during_activation_is_fatal() {
    let bed = TestBed::new();
    bed.host.borrow_mut().fail_on = Some("add_method");

    let err = bed
        .session
        .mock(DUMMY_CLASS, "publicStaticFunction", Value::Null, true)
        .err()
        .unwrap();
    match err {
        MockError::Rebind { operation, .. } => assert_eq!(operation, "add_method"),
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(bed.session.active_count(), 0);
}
