use crate::Result;
use static_double::runtime::MethodDefinition;
use static_double::{
    ClassTable, LocatorTable, MockConfig, MockSession, SourceSpan, TargetId, Value,
};
use std::cell::{Cell, Ref, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;

/// Collects classes and replacement callables, then wires them to a session.
#[derive(Default)]
pub struct SessionBuilder {
    class_sources: Vec<(String, String)>,
    methods: Vec<(String, MethodDefinition)>,
    callables: Vec<(String, String)>,
    config: MockConfig,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Class body source, written to disk and loaded into the class table
    pub fn with_class_source(mut self, class: &str, source: &str) -> Self {
        self.class_sources
            .push((class.to_string(), source.to_string()));
        self
    }

    pub fn with_method(mut self, class: &str, definition: MethodDefinition) -> Self {
        self.methods.push((class.to_string(), definition));
        self
    }

    /// A replacement callable, e.g. `function ($id) { return $id; }`
    pub fn with_callable(mut self, name: &str, source: &str) -> Self {
        self.callables.push((name.to_string(), source.to_string()));
        self
    }

    pub fn with_config(mut self, config: MockConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Harness> {
        let dir = tempfile::tempdir()?;

        let mut classes = ClassTable::new();
        for (class, source) in &self.class_sources {
            let path = dir.path().join(format!("{}.php", file_stem(class)));
            fs::write(&path, source)?;
            classes.load_class_source(class, source, Some(&path))?;
        }
        for (class, definition) in self.methods {
            classes.define_method(&class, definition);
        }

        let classes = Rc::new(RefCell::new(classes));
        let locator = Rc::new(RefCell::new(LocatorTable::new()));
        let session = MockSession::new(classes.clone(), locator.clone(), self.config);
        let harness = Harness {
            session,
            classes,
            locator,
            dir,
            next_callable: Cell::new(0),
        };
        for (name, source) in &self.callables {
            harness.add_callable(name, source)?;
        }
        Ok(harness)
    }
}

/// `App\Models\User` -> `App_Models_User`
fn file_stem(class: &str) -> String {
    class
        .trim_start_matches('\\')
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// A live session plus the fixtures backing it
pub struct Harness {
    session: MockSession,
    classes: Rc<RefCell<ClassTable>>,
    locator: Rc<RefCell<LocatorTable>>,
    dir: TempDir,
    next_callable: Cell<usize>,
}

impl Harness {
    pub fn session(&self) -> &MockSession {
        &self.session
    }

    pub fn classes(&self) -> Ref<'_, ClassTable> {
        self.classes.borrow()
    }

    pub fn fixture_dir(&self) -> &Path {
        self.dir.path()
    }

    /// Write a callable to its own file and make it locatable by `name`.
    ///
    /// Every callable gets a fresh file so cached sources never go stale.
    pub fn add_callable(&self, name: &str, source: &str) -> Result<PathBuf> {
        let index = self.next_callable.get();
        self.next_callable.set(index + 1);
        let path = self
            .dir
            .path()
            .join(format!("callable_{}_{}.php", index, file_stem(name)));
        fs::write(&path, format!("<?php\n${} = {};\n", file_stem(name), source))?;
        let end_line = 1 + source.lines().count().max(1) as u32;
        self.locator
            .borrow_mut()
            .register(name, SourceSpan::new(&path, 2, end_line));
        Ok(path)
    }

    /// Body currently installed for `class::method`
    pub fn body_of(&self, class: &str, method: &str) -> Option<String> {
        self.classes
            .borrow()
            .method(class, method)
            .map(|m| m.body.clone())
    }

    /// Invoke `class::method` the way the host would.
    ///
    /// The call is counted only when the installed body carries the recording
    /// statement for that target. Returns whether it was counted.
    pub fn call(&self, class: &str, method: &str, args: &[Value]) -> Result<bool> {
        let Some(body) = self.body_of(class, method) else {
            return Ok(false);
        };
        let statement = self.session.recording_statement(class, method)?;
        if !body.contains(&statement) {
            return Ok(false);
        }
        Ok(self
            .session
            .record_call(&TargetId::new(class, method), args)?)
    }
}
