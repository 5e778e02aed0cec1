//! Boundary with the host runtime that owns the class method tables.
//!
//! The engine never swaps implementations itself. It asks a
//! [`MethodRebinder`] to copy, remove and add methods, a [`MethodReflector`]
//! to describe the target, and a [`SourceLocator`] to find where a
//! replacement callable is declared.

pub mod table;

pub use table::{ClassTable, LocatorTable, MethodDefinition};

use crate::source::SourceSpan;
use crate::value::Value;
use bitflags::bitflags;
use std::cell::RefCell;
use std::fmt;
use std::path::PathBuf;

bitflags! {
    /// Method attributes carried across a rebind.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u32 {
        const PUBLIC = 1 << 0;
        const PROTECTED = 1 << 1;
        const PRIVATE = 1 << 2;
        const STATIC = 1 << 3;
        const FINAL = 1 << 4;
        const ABSTRACT = 1 << 5;
    }
}

impl Modifiers {
    /// Read a declaration keyword such as `protected` or `static`
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "public" => Some(Modifiers::PUBLIC),
            "protected" => Some(Modifiers::PROTECTED),
            "private" => Some(Modifiers::PRIVATE),
            "static" => Some(Modifiers::STATIC),
            "final" => Some(Modifiers::FINAL),
            "abstract" => Some(Modifiers::ABSTRACT),
            _ => None,
        }
    }

    /// Flags for a reinstalled method: one visibility (public when none is
    /// declared) plus the static and final attributes.
    pub fn rebind_flags(self) -> Self {
        let visibility = if self.contains(Modifiers::PRIVATE) {
            Modifiers::PRIVATE
        } else if self.contains(Modifiers::PROTECTED) {
            Modifiers::PROTECTED
        } else {
            Modifiers::PUBLIC
        };
        visibility | (self & (Modifiers::STATIC | Modifiers::FINAL))
    }

    /// Declaration keywords in source order, e.g. `final public static`
    pub fn keywords(self) -> String {
        let mut words = Vec::new();
        if self.contains(Modifiers::ABSTRACT) {
            words.push("abstract");
        }
        if self.contains(Modifiers::FINAL) {
            words.push("final");
        }
        if self.contains(Modifiers::PRIVATE) {
            words.push("private");
        } else if self.contains(Modifiers::PROTECTED) {
            words.push("protected");
        } else if self.contains(Modifiers::PUBLIC) {
            words.push("public");
        }
        if self.contains(Modifiers::STATIC) {
            words.push("static");
        }
        words.join(" ")
    }
}

/// Case-insensitive `class::method` identity of a mock target
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId {
    class: String,
    method: String,
}

impl TargetId {
    pub fn new(class: &str, method: &str) -> Self {
        Self {
            class: normalize_class(class),
            method: method.trim().to_ascii_lowercase(),
        }
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn method(&self) -> &str {
        &self.method
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.class, self.method)
    }
}

/// Lowercase, with any leading namespace separator removed
pub fn normalize_class(class: &str) -> String {
    class.trim().trim_start_matches('\\').to_ascii_lowercase()
}

/// What the host knows about a declared method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub class: String,
    pub name: String,
    /// Parameter list text, without the parentheses
    pub parameters: String,
    pub modifiers: Modifiers,
    pub file: Option<PathBuf>,
    pub start_line: Option<u32>,
}

impl MethodDescriptor {
    /// `file:line` of the declaration, or `unknown`
    pub fn location(&self) -> String {
        match (&self.file, self.start_line) {
            (Some(file), Some(line)) => format!("{}:{}", file.display(), line),
            (Some(file), None) => file.display().to_string(),
            _ => "unknown".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallableKind {
    Closure,
    Function,
    Method { class: String },
    /// Built into the host; has no source to extract
    Internal,
}

/// A replacement callable plus the values it closed over
#[derive(Debug, Clone, PartialEq)]
pub struct CallableDescriptor {
    pub name: String,
    pub kind: CallableKind,
    /// Captured values, snapshotted when bound
    pub bound_values: Vec<(String, Value)>,
}

impl CallableDescriptor {
    pub fn closure(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: CallableKind::Closure,
            bound_values: Vec::new(),
        }
    }

    pub fn function(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: CallableKind::Function,
            bound_values: Vec::new(),
        }
    }

    pub fn internal(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: CallableKind::Internal,
            bound_values: Vec::new(),
        }
    }

    /// Snapshot a captured variable's current value
    pub fn bind(mut self, name: &str, value: impl Into<Value>) -> Self {
        let name = name.trim_start_matches('$').to_string();
        let value = value.into();
        match self.bound_values.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.bound_values.push((name, value)),
        }
        self
    }
}

/// Outcome of one rebinding primitive; the error is the host's reason
pub type RebindResult = std::result::Result<(), String>;

/// Swaps method implementations in the host's method tables
pub trait MethodRebinder {
    fn copy_method(&mut self, class: &str, from: &str, to: &str) -> RebindResult;

    fn remove_method(&mut self, class: &str, name: &str) -> RebindResult;

    fn add_method(
        &mut self,
        class: &str,
        name: &str,
        parameters: &str,
        body: &str,
        flags: Modifiers,
    ) -> RebindResult;
}

/// Describes declared methods
pub trait MethodReflector {
    fn describe_method(&self, class: &str, method: &str) -> Option<MethodDescriptor>;
}

/// The two method-table capabilities a mock registry needs from its host
pub trait HostRuntime: MethodRebinder + MethodReflector {}

impl<T: MethodRebinder + MethodReflector> HostRuntime for T {}

/// Resolves where a callable is declared
pub trait SourceLocator {
    fn locate(&self, callable: &CallableDescriptor) -> Option<SourceSpan>;
}

/// Lets a locator stay writable after it is handed to a session
impl<T: SourceLocator + ?Sized> SourceLocator for RefCell<T> {
    fn locate(&self, callable: &CallableDescriptor) -> Option<SourceSpan> {
        self.try_borrow().ok()?.locate(callable)
    }
}
