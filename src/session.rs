//! Test-facing surface: a session owns the registry, handles mock one target.

use crate::config::MockConfig;
use crate::registry::{MockRegistry, Replacement};
use crate::runtime::{HostRuntime, SourceLocator, TargetId};
use crate::value::Value;
use crate::Result;
use std::cell::RefCell;
use std::rc::Rc;

/// Mocking context for one test.
///
/// Dropping the session deactivates every mock it still has active.
pub struct MockSession {
    registry: Rc<RefCell<MockRegistry>>,
}

impl MockSession {
    pub fn new(
        runtime: Rc<RefCell<dyn HostRuntime>>,
        locator: Rc<dyn SourceLocator>,
        config: MockConfig,
    ) -> Self {
        Self {
            registry: Rc::new(RefCell::new(MockRegistry::new(runtime, locator, config))),
        }
    }

    /// Create a handle mocking `class::method`, activating it unless
    /// `auto_activate` is false.
    pub fn mock(
        &self,
        class: &str,
        method: &str,
        replacement: impl Into<Replacement>,
        auto_activate: bool,
    ) -> Result<StaticMock> {
        let owner = self.registry.borrow_mut().next_owner();
        let mut handle = StaticMock {
            registry: Rc::clone(&self.registry),
            class: class.to_string(),
            method: method.to_string(),
            target: TargetId::new(class, method),
            replacement: replacement.into(),
            owner,
        };
        if auto_activate {
            handle.activate()?;
        }
        Ok(handle)
    }

    /// Count one call of `target`; the host routes the recording hook here.
    ///
    /// Returns false when `target` is not mocked and nothing was counted.
    pub fn record_call(&self, target: &TargetId, args: &[Value]) -> Result<bool> {
        self.registry.borrow_mut().record_call(target, args)
    }

    /// Statement an installed mock of `class::method` reports its calls with
    pub fn recording_statement(&self, class: &str, method: &str) -> Result<String> {
        self.registry
            .borrow()
            .recording_statement(&TargetId::new(class, method))
    }

    /// Restore every mocked method and clear all counters
    pub fn deactivate_all(&self) -> usize {
        self.registry.borrow_mut().deactivate_all()
    }

    pub fn is_active(&self, class: &str, method: &str) -> bool {
        self.registry.borrow().is_active(&TargetId::new(class, method))
    }

    pub fn active_count(&self) -> usize {
        self.registry.borrow().active_count()
    }
}

impl Drop for MockSession {
    fn drop(&mut self) {
        if let Ok(mut registry) = self.registry.try_borrow_mut() {
            registry.deactivate_all();
        }
    }
}

/// Handle for one mocked method
#[must_use = "dropping a StaticMock deactivates it"]
pub struct StaticMock {
    registry: Rc<RefCell<MockRegistry>>,
    class: String,
    method: String,
    target: TargetId,
    replacement: Replacement,
    owner: u64,
}

impl StaticMock {
    pub fn target(&self) -> &TargetId {
        &self.target
    }

    /// Whether this handle's replacement is the one currently installed
    pub fn is_active(&self) -> bool {
        self.registry.borrow().is_owned_by(&self.target, self.owner)
    }

    /// Replace what the mock runs: a plain value or a callable.
    ///
    /// Reinstalls immediately when this handle is active; calls counted so
    /// far are kept.
    pub fn set_return_value(&mut self, replacement: impl Into<Replacement>) -> Result<()> {
        self.replacement = replacement.into();
        if self.is_active() {
            self.activate()?;
        }
        Ok(())
    }

    /// Name the unmocked method is saved under while this handle is active
    pub fn alias(&self) -> Option<String> {
        let registry = self.registry.borrow();
        registry
            .record(&self.target)
            .filter(|record| record.owner == self.owner)
            .map(|record| record.alias.clone())
    }

    /// Install the replacement, superseding any other mock of the target
    pub fn activate(&mut self) -> Result<()> {
        self.registry
            .borrow_mut()
            .activate(&self.class, &self.method, &self.replacement, self.owner)
    }

    /// Restore the original method if this handle's replacement is installed
    pub fn deactivate(&self) -> bool {
        self.registry
            .borrow_mut()
            .deactivate_owned(&self.target, self.owner)
    }

    /// All calls when `args` is empty, otherwise calls with exactly `args`
    pub fn num_calls(&self, args: &[Value]) -> u64 {
        self.registry.borrow().num_calls(&self.target, args)
    }

    pub fn arguments_called_with(&self) -> Vec<Vec<Value>> {
        self.registry.borrow().arguments_called_with(&self.target)
    }

    pub fn first_arguments_called_with(&self) -> Option<Vec<Value>> {
        self.registry.borrow().first_arguments_called_with(&self.target)
    }

    pub fn last_arguments_called_with(&self) -> Option<Vec<Value>> {
        self.registry.borrow().last_arguments_called_with(&self.target)
    }

    pub fn called_once(&self) -> bool {
        self.num_calls(&[]) == 1
    }

    pub fn called_once_with_params(&self, args: &[Value]) -> bool {
        self.num_calls(args) == 1
    }
}

impl Drop for StaticMock {
    fn drop(&mut self) {
        if let Ok(mut registry) = self.registry.try_borrow_mut() {
            registry.deactivate_owned(&self.target, self.owner);
        }
    }
}
