//! Shared fixtures: a class table loaded from source on disk, replacement
//! callables in a second file, and a rebinder that logs every primitive.

#![allow(dead_code)]

use static_double::logging::{init_tracing, LogLevel};
use static_double::runtime::RebindResult;
use static_double::{
    ClassTable, LocatorTable, MethodDescriptor, MethodRebinder, MethodReflector, MockConfig,
    MockSession, Modifiers, SourceSpan,
};
use std::cell::RefCell;
use std::fs;
use std::rc::Rc;
use tempfile::TempDir;

pub const DUMMY_CLASS: &str = "\\StaticDouble\\Tests\\dummy";

pub const DUMMY_SOURCE: &str = "<?php
namespace StaticDouble\\Tests;

class dummy {
    public static function publicStaticFunction() {
        return 'dummy' . 'publicStaticFunction';
    }

    protected static function protectedStaticFunction($user) {
        return $user;
    }

    final public static function withDefaults($a, $b = 2) {
        return $a + $b;
    }
}
";

/// One replacement per line range, see `REPLACEMENT_SPANS`
pub const REPLACEMENTS_SOURCE: &str = "<?php
$awesome = function () {
    return 'barrett is awesome';
};
$echo = function ($user) { return $user; };
$pair = function ($a, $b) { return $a . $b; };
$greeter = function () use ($greeting, &$count) : string {
    return $greeting . ' #' . $count;
};
$point = function () use ($origin) { return $origin; };
";

pub const REPLACEMENT_SPANS: &[(&str, u32, u32)] = &[
    ("awesome", 2, 4),
    ("echo", 5, 5),
    ("pair", 6, 6),
    ("greeter", 7, 9),
    ("point", 10, 10),
];

/// Delegates to a `ClassTable`, logging each primitive and optionally
/// failing one of them.
#[derive(Default)]
pub struct RecordingRebinder {
    pub table: ClassTable,
    pub calls: Vec<String>,
    pub fail_on: Option<&'static str>,
}

impl RecordingRebinder {
    fn log(&mut self, operation: &'static str, detail: String) -> RebindResult {
        self.calls.push(format!("{} {}", operation, detail));
        if self.fail_on == Some(operation) {
            return Err(format!("{} refused", operation));
        }
        Ok(())
    }
}

impl MethodRebinder for RecordingRebinder {
    fn copy_method(&mut self, class: &str, from: &str, to: &str) -> RebindResult {
        self.log("copy_method", format!("{}::{} -> {}", class, from, to))?;
        self.table.copy_method(class, from, to)
    }

    fn remove_method(&mut self, class: &str, name: &str) -> RebindResult {
        self.log("remove_method", format!("{}::{}", class, name))?;
        self.table.remove_method(class, name)
    }

    fn add_method(
        &mut self,
        class: &str,
        name: &str,
        parameters: &str,
        body: &str,
        flags: Modifiers,
    ) -> RebindResult {
        self.log("add_method", format!("{}::{}", class, name))?;
        self.table.add_method(class, name, parameters, body, flags)
    }
}

impl MethodReflector for RecordingRebinder {
    fn describe_method(&self, class: &str, method: &str) -> Option<MethodDescriptor> {
        self.table.describe_method(class, method)
    }
}

pub struct TestBed {
    pub dir: TempDir,
    pub host: Rc<RefCell<RecordingRebinder>>,
    pub session: MockSession,
}

impl TestBed {
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    pub fn with_config(config: MockConfig) -> Self {
        init_tracing(LogLevel::Debug);
        let dir = tempfile::tempdir().unwrap();

        let class_path = dir.path().join("dummy.php");
        fs::write(&class_path, DUMMY_SOURCE).unwrap();
        let mut table = ClassTable::new();
        table
            .load_class_source(DUMMY_CLASS, DUMMY_SOURCE, Some(&class_path))
            .unwrap();

        let replacements_path = dir.path().join("replacements.php");
        fs::write(&replacements_path, REPLACEMENTS_SOURCE).unwrap();
        let mut locator = LocatorTable::new();
        for (name, start, end) in REPLACEMENT_SPANS {
            locator.register(name, SourceSpan::new(&replacements_path, *start, *end));
        }

        let host = Rc::new(RefCell::new(RecordingRebinder {
            table,
            ..RecordingRebinder::default()
        }));
        let session = MockSession::new(host.clone(), Rc::new(locator), config);
        Self { dir, host, session }
    }

    /// Body currently installed for a dummy method
    pub fn body_of(&self, method: &str) -> String {
        self.host
            .borrow()
            .table
            .method(DUMMY_CLASS, method)
            .map(|m| m.body.clone())
            .unwrap_or_default()
    }

    pub fn method_names(&self) -> Vec<String> {
        self.host.borrow().table.method_names(DUMMY_CLASS)
    }

    pub fn rebinder_calls(&self) -> usize {
        self.host.borrow().calls.len()
    }
}
