use crate::common::{TestBed, DUMMY_CLASS};
use static_double::{MockConfig, TargetId, Value};

#[test]
fn test_deactivate_all_restores_every_target() {
    let bed = TestBed::new();
    let before = bed.method_names();
    let public_body = bed.body_of("publicStaticFunction");

    let public = bed
        .session
        .mock(DUMMY_CLASS, "publicStaticFunction", Value::Null, true)
        .unwrap();
    let protected = bed
        .session
        .mock(DUMMY_CLASS, "protectedStaticFunction", Value::Null, true)
        .unwrap();
    bed.session.record_call(public.target(), &[]).unwrap();

    assert_eq!(bed.session.deactivate_all(), 2);
    assert_eq!(bed.method_names(), before);
    assert_eq!(bed.body_of("publicStaticFunction"), public_body);
    assert_eq!(public.num_calls(&[]), 0);
    assert!(!protected.is_active());
}

#[test]
fn test_dropping_the_handle_restores_the_method() {
    let bed = TestBed::new();
    let original = bed.body_of("withDefaults");
    {
        let _mock = bed
            .session
            .mock(DUMMY_CLASS, "withDefaults", Value::Int(3), true)
            .unwrap();
        assert_ne!(bed.body_of("withDefaults"), original);
    }
    assert_eq!(bed.body_of("withDefaults"), original);
    assert_eq!(bed.session.active_count(), 0);
}

#[test]
fn test_dropping_the_session_restores_everything() {
    let bed = TestBed::new();
    let host = bed.host.clone();
    let before = bed.method_names();

    let mock = bed
        .session
        .mock(DUMMY_CLASS, "publicStaticFunction", Value::Null, true)
        .unwrap();
    std::mem::forget(mock);
    drop(bed);

    assert_eq!(host.borrow().table.method_names(DUMMY_CLASS), before);
}

#[test]
fn test_rebind_failures_during_teardown_only_warn() {
    let bed = TestBed::new();
    let _mock = bed
        .session
        .mock(DUMMY_CLASS, "publicStaticFunction", Value::Null, true)
        .unwrap();
    bed.host.borrow_mut().fail_on = Some("copy_method");

    assert_eq!(bed.session.deactivate_all(), 1);
    assert_eq!(bed.session.active_count(), 0);
    assert!(bed
        .host
        .borrow()
        .calls
        .iter()
        .any(|c| c.starts_with("copy_method") && c.ends_with("-> publicStaticFunction")));
}

#[test]
fn test_strict_keys_reject_unencodable_calls() {
    let mut config = MockConfig::default();
    config.recorder.strict_keys = true;
    let bed = TestBed::with_config(config);
    let mock = bed
        .session
        .mock(DUMMY_CLASS, "publicStaticFunction", Value::Null, true)
        .unwrap();

    let target = TargetId::new(DUMMY_CLASS, "publicStaticFunction");
    assert!(bed
        .session
        .record_call(&target, &[Value::opaque("resource")])
        .is_err());
    assert_eq!(mock.num_calls(&[]), 0);
}

#[test]
fn test_lenient_keys_count_unencodable_calls_unkeyed() {
    let bed = TestBed::new();
    let mock = bed
        .session
        .mock(DUMMY_CLASS, "publicStaticFunction", Value::Null, true)
        .unwrap();

    bed.session
        .record_call(mock.target(), &[Value::opaque("resource")])
        .unwrap();
    assert_eq!(mock.num_calls(&[]), 1);
    assert_eq!(mock.arguments_called_with(), vec![Vec::<Value>::new()]);
}
