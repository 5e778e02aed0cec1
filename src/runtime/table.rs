use super::{
    normalize_class, CallableDescriptor, MethodDescriptor, MethodRebinder, MethodReflector,
    Modifiers, RebindResult, SourceLocator,
};
use crate::rewrite::FunctionSource;
use crate::source::scanner::{self, is_ident_byte};
use crate::source::SourceSpan;
use crate::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One installed method implementation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDefinition {
    /// Declared name, case preserved
    pub name: String,
    pub parameters: String,
    pub body: String,
    pub modifiers: Modifiers,
    pub start_line: Option<u32>,
}

impl MethodDefinition {
    pub fn new(name: &str, parameters: &str, body: &str, modifiers: Modifiers) -> Self {
        Self {
            name: name.to_string(),
            parameters: parameters.to_string(),
            body: body.to_string(),
            modifiers,
            start_line: None,
        }
    }

    /// Declaration text, e.g. `public static function foo($a) {...}`
    pub fn render(&self) -> String {
        let keywords = self.modifiers.keywords();
        let lead = if keywords.is_empty() {
            String::new()
        } else {
            format!("{} ", keywords)
        };
        format!(
            "{}function {}({}) {{{}}}",
            lead, self.name, self.parameters, self.body
        )
    }
}

#[derive(Debug, Clone, Default)]
struct ClassEntry {
    name: String,
    file: Option<PathBuf>,
    /// Methods indexed by lowercase name
    methods: HashMap<String, MethodDefinition>,
}

/// In-memory method tables: an indirection table from `(class, method)` to
/// the implementation call sites should run.
///
/// Class and method lookups are case-insensitive. The rebinding primitives
/// fail rather than overwrite: copying onto or adding an existing name is an
/// error, as is touching a missing class or method.
#[derive(Debug, Clone, Default)]
pub struct ClassTable {
    classes: HashMap<String, ClassEntry>,
}

impl ClassTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a class, keeping any methods it already has
    pub fn define_class(&mut self, class: &str) {
        self.classes
            .entry(normalize_class(class))
            .or_insert_with(|| ClassEntry {
                name: class.trim_start_matches('\\').to_string(),
                ..ClassEntry::default()
            });
    }

    /// Install or overwrite a method
    pub fn define_method(&mut self, class: &str, definition: MethodDefinition) {
        self.define_class(class);
        if let Some(entry) = self.classes.get_mut(&normalize_class(class)) {
            entry
                .methods
                .insert(definition.name.to_ascii_lowercase(), definition);
        }
    }

    /// Load every method declared in a class body.
    ///
    /// Modifiers come from the keywords right before each `function`.
    /// Returns the number of methods loaded.
    pub fn load_class_source(&mut self, class: &str, source: &str, file: Option<&Path>) -> Result<usize> {
        self.define_class(class);
        let mut loaded = 0;
        for bounds in scanner::functions(source) {
            let fragment = &source[bounds.start..bounds.end()];
            let parsed = FunctionSource::parse(fragment)?;
            let name = declared_name(&parsed.signature);
            if name.is_empty() {
                continue;
            }
            let parameters = &source[bounds.params_open + 1..bounds.params_close];
            let mut definition = MethodDefinition::new(
                &name,
                parameters,
                &parsed.body,
                leading_modifiers(&source[..bounds.start]),
            );
            definition.start_line = Some(source[..bounds.start].matches('\n').count() as u32 + 1);
            self.define_method(class, definition);
            loaded += 1;
        }
        if let Some(entry) = self.classes.get_mut(&normalize_class(class)) {
            entry.file = file.map(Path::to_path_buf);
        }
        Ok(loaded)
    }

    pub fn method(&self, class: &str, name: &str) -> Option<&MethodDefinition> {
        self.classes
            .get(&normalize_class(class))?
            .methods
            .get(&name.to_ascii_lowercase())
    }

    pub fn has_method(&self, class: &str, name: &str) -> bool {
        self.method(class, name).is_some()
    }

    /// Declared method names of a class, sorted
    pub fn method_names(&self, class: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .classes
            .get(&normalize_class(class))
            .map(|entry| entry.methods.values().map(|m| m.name.clone()).collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    fn entry_mut(&mut self, class: &str) -> std::result::Result<&mut ClassEntry, String> {
        self.classes
            .get_mut(&normalize_class(class))
            .ok_or_else(|| format!("class {} does not exist", class))
    }
}

/// Identifier after `function`, skipping a by-reference `&`
fn declared_name(signature: &str) -> String {
    let rest = signature
        .trim_start()
        .trim_start_matches("function")
        .trim_start()
        .trim_start_matches('&')
        .trim_start();
    let end = rest
        .bytes()
        .position(|b| !is_ident_byte(b))
        .unwrap_or(rest.len());
    rest[..end].to_string()
}

/// Modifier keywords immediately preceding a `function` keyword
fn leading_modifiers(before: &str) -> Modifiers {
    before
        .split_whitespace()
        .rev()
        .map_while(Modifiers::from_keyword)
        .fold(Modifiers::empty(), |acc, m| acc | m)
}

impl MethodRebinder for ClassTable {
    fn copy_method(&mut self, class: &str, from: &str, to: &str) -> RebindResult {
        let entry = self.entry_mut(class)?;
        if entry.methods.contains_key(&to.to_ascii_lowercase()) {
            return Err(format!("{}::{} already exists", entry.name, to));
        }
        let mut copy = entry
            .methods
            .get(&from.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| format!("{}::{} does not exist", entry.name, from))?;
        copy.name = to.to_string();
        entry.methods.insert(to.to_ascii_lowercase(), copy);
        Ok(())
    }

    fn remove_method(&mut self, class: &str, name: &str) -> RebindResult {
        let entry = self.entry_mut(class)?;
        entry
            .methods
            .remove(&name.to_ascii_lowercase())
            .map(|_| ())
            .ok_or_else(|| format!("{}::{} does not exist", entry.name, name))
    }

    fn add_method(
        &mut self,
        class: &str,
        name: &str,
        parameters: &str,
        body: &str,
        flags: Modifiers,
    ) -> RebindResult {
        let entry = self.entry_mut(class)?;
        if entry.methods.contains_key(&name.to_ascii_lowercase()) {
            return Err(format!("{}::{} already exists", entry.name, name));
        }
        entry.methods.insert(
            name.to_ascii_lowercase(),
            MethodDefinition::new(name, parameters, body, flags),
        );
        Ok(())
    }
}

impl MethodReflector for ClassTable {
    fn describe_method(&self, class: &str, method: &str) -> Option<MethodDescriptor> {
        let entry = self.classes.get(&normalize_class(class))?;
        let definition = entry.methods.get(&method.to_ascii_lowercase())?;
        Some(MethodDescriptor {
            class: entry.name.clone(),
            name: definition.name.clone(),
            parameters: definition.parameters.clone(),
            modifiers: definition.modifiers,
            file: entry.file.clone(),
            start_line: definition.start_line,
        })
    }
}

/// In-memory source locations for callables, keyed by callable name
#[derive(Debug, Clone, Default)]
pub struct LocatorTable {
    spans: HashMap<String, SourceSpan>,
}

impl LocatorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, span: SourceSpan) {
        self.spans.insert(name.to_string(), span);
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

impl SourceLocator for LocatorTable {
    fn locate(&self, callable: &CallableDescriptor) -> Option<SourceSpan> {
        self.spans.get(&callable.name).cloned()
    }
}
