use static_double::{StaticMock, Value};

/// Panicking call assertions with readable failure messages
pub struct CallAssertions<'a> {
    mock: &'a StaticMock,
}

impl<'a> CallAssertions<'a> {
    pub fn new(mock: &'a StaticMock) -> Self {
        Self { mock }
    }

    pub fn assert_active(&self) {
        assert!(self.mock.is_active(), "{} is not mocked", self.mock.target());
    }

    pub fn assert_not_called(&self) {
        self.assert_called_times(0);
    }

    pub fn assert_called_times(&self, expected: u64) {
        let actual = self.mock.num_calls(&[]);
        assert_eq!(
            actual, expected,
            "{} was called {} times, expected {}. Calls: {:?}",
            self.mock.target(),
            actual,
            expected,
            self.mock.arguments_called_with()
        );
    }

    pub fn assert_called_with(&self, args: &[Value], expected: u64) {
        let actual = self.mock.num_calls(args);
        assert_eq!(
            actual, expected,
            "{} was called with {:?} {} times, expected {}",
            self.mock.target(),
            args,
            actual,
            expected
        );
    }

    pub fn assert_called_once_with(&self, args: &[Value]) {
        assert!(
            self.mock.called_once_with_params(args),
            "{} was not called exactly once with {:?}. Calls: {:?}",
            self.mock.target(),
            args,
            self.mock.arguments_called_with()
        );
    }

    pub fn assert_first_called_with(&self, args: &[Value]) {
        assert_eq!(
            self.mock.first_arguments_called_with().as_deref(),
            Some(args),
            "first call of {}",
            self.mock.target()
        );
    }

    pub fn assert_last_called_with(&self, args: &[Value]) {
        assert_eq!(
            self.mock.last_arguments_called_with().as_deref(),
            Some(args),
            "last call of {}",
            self.mock.target()
        );
    }
}
