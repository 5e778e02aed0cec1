pub mod assertions;
pub mod builder;
pub mod fixtures;

pub use assertions::CallAssertions;
pub use builder::{Harness, SessionBuilder};
pub use fixtures::CallFixture;

use static_double::MockError;

#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("fixture file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("fixture JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Mock(#[from] MockError),
}

pub type Result<T> = std::result::Result<T, HarnessError>;
