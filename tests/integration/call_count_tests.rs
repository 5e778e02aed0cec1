use crate::common::{TestBed, DUMMY_CLASS};
use static_double::{StaticMock, Value};

fn mocked(bed: &TestBed) -> StaticMock {
    bed.session
        .mock(DUMMY_CLASS, "publicStaticFunction", Value::from("barrett is awesome"), true)
        .unwrap()
}

/// What the recording statement does when the mocked method runs
fn call(bed: &TestBed, mock: &StaticMock, args: &[Value]) {
    bed.session.record_call(mock.target(), args).unwrap();
}

#[test]
fn test_counts_calls_with_and_without_arguments() {
    let bed = TestBed::new();
    let mock = mocked(&bed);

    for _ in 0..3 {
        call(&bed, &mock, &[Value::from("param1")]);
    }
    call(&bed, &mock, &[]);

    assert_eq!(mock.num_calls(&[Value::from("param1")]), 3);
    assert!(mock.num_calls(&[]) >= 3);
    assert_eq!(mock.num_calls(&[]), 4);
}

#[test]
fn test_called_once() {
    let bed = TestBed::new();
    let mock = mocked(&bed);
    assert!(!mock.called_once());

    call(&bed, &mock, &[]);
    assert!(mock.called_once());

    call(&bed, &mock, &[]);
    assert!(!mock.called_once());
}

#[test]
fn test_called_once_with_params() {
    let bed = TestBed::new();
    let mock = mocked(&bed);
    call(&bed, &mock, &[Value::from("param1"), Value::list(["param2"])]);

    assert!(mock.called_once_with_params(&[Value::from("param1"), Value::list(["param2"])]));
    assert!(!mock.called_once_with_params(&[Value::from("param1"), Value::from("param2")]));
}

#[test]
fn test_single_integer_bucket_is_independent_of_longer_lists() {
    let bed = TestBed::new();
    let mock = mocked(&bed);

    for _ in 0..5 {
        call(&bed, &mock, &[Value::Int(5)]);
    }
    call(&bed, &mock, &[Value::Int(5), Value::Int(6)]);

    assert_eq!(mock.num_calls(&[Value::Int(5)]), 5);
    assert_eq!(mock.num_calls(&[Value::Int(5), Value::Int(6)]), 1);
    assert_eq!(mock.num_calls(&[Value::from("5")]), 0);
}

#[test]
fn test_distinct_arguments_are_reported_once_each() {
    let bed = TestBed::new();
    let mock = mocked(&bed);

    for arg in ["param1", "param2", "param1", "param3"] {
        call(&bed, &mock, &[Value::from(arg)]);
    }

    assert_eq!(
        mock.arguments_called_with(),
        vec![
            vec![Value::from("param1")],
            vec![Value::from("param2")],
            vec![Value::from("param3")],
        ]
    );
    assert_eq!(mock.first_arguments_called_with(), Some(vec![Value::from("param1")]));
    assert_eq!(mock.last_arguments_called_with(), Some(vec![Value::from("param3")]));
}

#[test]
fn test_never_called() {
    let bed = TestBed::new();
    let mock = mocked(&bed);

    assert_eq!(mock.num_calls(&[]), 0);
    assert!(mock.arguments_called_with().is_empty());
    assert_eq!(mock.first_arguments_called_with(), None);
    assert_eq!(mock.last_arguments_called_with(), None);
}

#[test]
fn test_structured_arguments_decode_back() {
    let bed = TestBed::new();
    let mock = mocked(&bed);
    let args = vec![
        Value::assoc([("id", Value::Int(3)), ("tags", Value::list(["a", "b"]))]),
        Value::Float(1.5),
        Value::Null,
    ];
    call(&bed, &mock, &args);

    assert_eq!(mock.arguments_called_with(), vec![args.clone()]);
    assert_eq!(mock.num_calls(&args), 1);
}

#[test]
fn test_deactivation_clears_counts() {
    let bed = TestBed::new();
    let mut mock = mocked(&bed);
    call(&bed, &mock, &[Value::Int(1)]);

    mock.deactivate();
    assert_eq!(mock.num_calls(&[]), 0);

    mock.activate().unwrap();
    call(&bed, &mock, &[Value::Int(2)]);
    assert_eq!(mock.arguments_called_with(), vec![vec![Value::Int(2)]]);
}

#[test]
fn test_recording_statement_names_the_target() {
    let bed = TestBed::new();
    let _mock = mocked(&bed);
    assert!(bed.body_of("publicStaticFunction").starts_with(
        "    \\StaticDouble\\CallRecorder::record('staticdouble\\\\tests\\\\dummy::publicstaticfunction', func_get_args());\n"
    ));
}

#[test]
fn test_calls_after_restore_are_not_counted() {
    let bed = TestBed::new();
    let mock = mocked(&bed);
    call(&bed, &mock, &[Value::Int(1)]);
    assert_eq!(mock.num_calls(&[]), 1);

    assert!(mock.deactivate());
    let counted = bed
        .session
        .record_call(mock.target(), &[Value::Int(1)])
        .unwrap();
    assert!(!counted);
    assert_eq!(mock.num_calls(&[]), 0);
    assert!(mock.arguments_called_with().is_empty());
}

#[test]
fn test_set_return_value_keeps_gathered_counts() {
    let bed = TestBed::new();
    let mut mock = mocked(&bed);
    call(&bed, &mock, &[Value::from("param1")]);
    call(&bed, &mock, &[Value::from("param1")]);

    mock.set_return_value(Value::from("changed")).unwrap();
    assert!(bed.body_of("publicStaticFunction").contains("$value = 'changed';"));
    assert_eq!(mock.num_calls(&[Value::from("param1")]), 2);
}
