//! Activation and deactivation of method substitutions.
//!
//! A [`MockRegistry`] holds at most one [`MockRecord`] per target. Every
//! check that can fail (unknown target, unreadable or unparsable source,
//! arity, capture encoding) runs before the host's method tables are touched.

use crate::config::MockConfig;
use crate::logging;
use crate::recorder::CallRecorder;
use crate::rewrite::{CapturedVariable, FunctionRewriter};
use crate::runtime::{
    CallableDescriptor, CallableKind, HostRuntime, MethodDescriptor, RebindResult, SourceLocator,
    TargetId,
};
use crate::source::{ParameterList, SourceExtractor};
use crate::value::{to_literal, Value};
use crate::{MockError, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use uuid::Uuid;

/// Replacement synthesized for a plain return value
pub const RETURN_VALUE_STUB: &str = "function () use ($value) { return $value; }";

/// What an activated target should run instead
#[derive(Debug, Clone, PartialEq)]
pub enum Replacement {
    /// Always return this value
    Value(Value),
    /// Run a user-defined callable, with its captured values snapshotted
    Callable(CallableDescriptor),
}

impl From<Value> for Replacement {
    fn from(value: Value) -> Self {
        Replacement::Value(value)
    }
}

impl From<CallableDescriptor> for Replacement {
    fn from(callable: CallableDescriptor) -> Self {
        Replacement::Callable(callable)
    }
}

/// An active substitution
#[derive(Debug, Clone, PartialEq)]
pub struct MockRecord {
    pub target: TargetId,
    /// Declared class name, as the host reported it
    pub class: String,
    /// Declared method name, as the host reported it
    pub method: String,
    /// Name the unmocked method is saved under
    pub alias: String,
    /// Handle that installed this record
    pub owner: u64,
    pub original: MethodDescriptor,
    /// Values the replacement's capture clause was bound to
    pub captures: Vec<CapturedVariable>,
}

/// Registry of active substitutions plus their call counters
pub struct MockRegistry {
    runtime: Rc<RefCell<dyn HostRuntime>>,
    locator: Rc<dyn SourceLocator>,
    extractor: SourceExtractor,
    recorder: CallRecorder,
    records: HashMap<TargetId, MockRecord>,
    config: MockConfig,
    next_owner: u64,
}

impl MockRegistry {
    pub fn new(
        runtime: Rc<RefCell<dyn HostRuntime>>,
        locator: Rc<dyn SourceLocator>,
        config: MockConfig,
    ) -> Self {
        let recorder = CallRecorder::new().with_strict_keys(config.recorder.strict_keys);
        Self {
            runtime,
            locator,
            extractor: SourceExtractor::new(),
            recorder,
            records: HashMap::new(),
            config,
            next_owner: 1,
        }
    }

    pub fn config(&self) -> &MockConfig {
        &self.config
    }

    /// Fresh owner id for a new handle
    pub fn next_owner(&mut self) -> u64 {
        let owner = self.next_owner;
        self.next_owner += 1;
        owner
    }

    /// Install `replacement` for `class::method` on behalf of `owner`.
    ///
    /// An existing record for the target is deactivated first, but only once
    /// the new replacement has been built and validated. A rebinding failure
    /// after that point can leave the class without the method. When `owner`
    /// already holds the record, its call counts carry over.
    pub fn activate(
        &mut self,
        class: &str,
        method: &str,
        replacement: &Replacement,
        owner: u64,
    ) -> Result<()> {
        let target = TargetId::new(class, method);
        let original = match self.records.get(&target) {
            Some(record) => record.original.clone(),
            None => self
                .runtime
                .try_borrow()
                .ok()
                .and_then(|runtime| runtime.describe_method(class, method))
                .ok_or_else(|| {
                    MockError::Configuration(format!("{}::{} does not exist", class, method))
                })?,
        };

        let (rewriter, captures) = self.build_replacement(&target, &original, replacement)?;

        let reinstall = self.is_owned_by(&target, owner);
        self.release(&target, !reinstall);

        let alias = format!(
            "{}{}{}",
            original.name,
            self.config.mock.alias_infix,
            Uuid::new_v4().simple()
        );
        let flags = original.modifiers.rebind_flags();
        let class_name = original.class.clone();
        let method_name = original.name.clone();
        self.rebind(&target, "copy_method", |rt| {
            rt.copy_method(&class_name, &method_name, &alias)
        })?;
        self.rebind(&target, "remove_method", |rt| {
            rt.remove_method(&class_name, &method_name)
        })?;
        let parameters = rewriter.parameters().to_string();
        let body = rewriter.body();
        self.rebind(&target, "add_method", |rt| {
            rt.add_method(&class_name, &method_name, &parameters, &body, flags)
        })?;

        logging::log_activation(&target.to_string(), &alias);
        self.records.insert(
            target.clone(),
            MockRecord {
                target,
                class: class_name,
                method: method_name,
                alias,
                owner,
                original,
                captures,
            },
        );
        Ok(())
    }

    /// Extract, rewrite, instrument and validate a replacement without
    /// touching the host.
    fn build_replacement(
        &mut self,
        target: &TargetId,
        original: &MethodDescriptor,
        replacement: &Replacement,
    ) -> Result<(FunctionRewriter, Vec<CapturedVariable>)> {
        let (source, bound_values) = match replacement {
            Replacement::Value(value) => (
                RETURN_VALUE_STUB.to_string(),
                vec![("value".to_string(), value.clone())],
            ),
            Replacement::Callable(callable) => {
                if callable.kind == CallableKind::Internal {
                    return Err(MockError::Configuration(format!(
                        "{} is built into the runtime and has no source to copy",
                        callable.name
                    )));
                }
                let span = self.locator.locate(callable).ok_or_else(|| {
                    MockError::Configuration(format!(
                        "no source location known for {}",
                        callable.name
                    ))
                })?;
                (
                    self.extractor.extract(&callable.name, &span)?,
                    callable.bound_values.clone(),
                )
            }
        };

        let mut rewriter = FunctionRewriter::from_source(&source, Some(&original.name))?;
        let captures = rewriter.capture(&bound_values)?;

        let declared = ParameterList::parse(&original.parameters)?;
        let replacement_required = rewriter.required_parameters()?;
        let target_required = declared.required_count();
        if replacement_required > target_required {
            return Err(MockError::Arity {
                target: format!("{}::{}", original.class, original.name),
                parameters: declared.render(true),
                replacement_required,
                target_required,
                location: original.location(),
            });
        }

        rewriter.prepend(&self.recording_statement(target)?);
        if let Some(prefix) = &self.config.mock.instrumentation_prefix {
            rewriter.set_instrumentation_prefix(prefix);
        }
        Ok((rewriter, captures))
    }

    /// Statement an instrumented body runs to report a call of `target`
    pub fn recording_statement(&self, target: &TargetId) -> Result<String> {
        let target_literal = to_literal(&Value::Str(target.to_string()))?;
        Ok(format!(
            "{}({}, func_get_args());",
            self.config.mock.recorder_hook, target_literal
        ))
    }

    fn rebind<F>(&self, target: &TargetId, operation: &'static str, op: F) -> Result<()>
    where
        F: FnOnce(&mut (dyn HostRuntime + 'static)) -> RebindResult,
    {
        let outcome = match self.runtime.try_borrow_mut() {
            Ok(mut runtime) => op(&mut *runtime),
            Err(_) => Err("host runtime is already borrowed".to_string()),
        };
        outcome.map_err(|reason| MockError::Rebind {
            target: target.to_string(),
            operation,
            reason,
        })
    }

    /// Same as `rebind` but a failure only warns
    fn rebind_or_warn<F>(&self, target: &TargetId, operation: &'static str, op: F)
    where
        F: FnOnce(&mut (dyn HostRuntime + 'static)) -> RebindResult,
    {
        if let Err(MockError::Rebind { reason, .. }) = self.rebind(target, operation, op) {
            logging::log_rebind_warning(&target.to_string(), operation, &reason);
        }
    }

    /// Restore the unmocked method of `target`.
    ///
    /// Returns whether a record was active. Rebinding failures are logged,
    /// never returned.
    pub fn deactivate(&mut self, target: &TargetId) -> bool {
        self.release(target, true)
    }

    fn release(&mut self, target: &TargetId, clear_counts: bool) -> bool {
        let Some(record) = self.records.remove(target) else {
            return false;
        };
        self.rebind_or_warn(target, "remove_method", |rt| {
            rt.remove_method(&record.class, &record.method)
        });
        self.rebind_or_warn(target, "copy_method", |rt| {
            rt.copy_method(&record.class, &record.alias, &record.method)
        });
        self.rebind_or_warn(target, "remove_method", |rt| {
            rt.remove_method(&record.class, &record.alias)
        });
        if clear_counts {
            self.recorder.clear_target(target);
        }
        logging::log_deactivation(&target.to_string());
        true
    }

    /// Deactivate `target` only if `owner` installed its current record
    pub fn deactivate_owned(&mut self, target: &TargetId, owner: u64) -> bool {
        if self.is_owned_by(target, owner) {
            self.deactivate(target)
        } else {
            false
        }
    }

    /// Deactivate every record and forget every count
    pub fn deactivate_all(&mut self) -> usize {
        let targets: Vec<TargetId> = self.records.keys().cloned().collect();
        let deactivated = targets
            .iter()
            .filter(|target| self.deactivate(target))
            .count();
        self.records.clear();
        self.recorder.reset();
        logging::log_reset(deactivated);
        deactivated
    }

    pub fn is_active(&self, target: &TargetId) -> bool {
        self.records.contains_key(target)
    }

    pub fn is_owned_by(&self, target: &TargetId, owner: u64) -> bool {
        self.records
            .get(target)
            .map(|record| record.owner == owner)
            .unwrap_or(false)
    }

    pub fn record(&self, target: &TargetId) -> Option<&MockRecord> {
        self.records.get(target)
    }

    pub fn active_count(&self) -> usize {
        self.records.len()
    }

    /// Entry point for the instrumentation statement.
    ///
    /// Only an active target has a body that reports calls, so calls of any
    /// other target are ignored. Returns whether the call was counted.
    pub fn record_call(&mut self, target: &TargetId, args: &[Value]) -> Result<bool> {
        if !self.is_active(target) {
            logging::log_ignored_call(&target.to_string());
            return Ok(false);
        }
        self.recorder.record_call(target, args)?;
        Ok(true)
    }

    pub fn recorder(&self) -> &CallRecorder {
        &self.recorder
    }

    pub fn num_calls(&self, target: &TargetId, args: &[Value]) -> u64 {
        self.recorder.num_calls(target, args)
    }

    pub fn arguments_called_with(&self, target: &TargetId) -> Vec<Vec<Value>> {
        self.recorder.arguments_called_with(target)
    }

    pub fn first_arguments_called_with(&self, target: &TargetId) -> Option<Vec<Value>> {
        self.recorder.first_arguments_called_with(target)
    }

    pub fn last_arguments_called_with(&self, target: &TargetId) -> Option<Vec<Value>> {
        self.recorder.last_arguments_called_with(target)
    }
}

impl Drop for MockRegistry {
    fn drop(&mut self) {
        if !self.records.is_empty() {
            self.deactivate_all();
        }
    }
}
