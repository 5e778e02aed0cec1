//! Source-to-source rewriting of function fragments
//!
//! A [`FunctionRewriter`] holds a function split into signature and body and
//! composes the final body as:
//!
//! 1. the instrumentation prefix, if one is set
//! 2. prepended statements, most recently prepended first
//! 3. capture initializers, one `$name = <literal>;` per captured variable
//! 4. the original body
//!
//! Prepended code therefore runs before the capture initializers, which may
//! overwrite anything it assigns to a captured name.

use crate::logging;
use crate::source::scanner::{self, is_ident_byte};
use crate::source::ParameterList;
use crate::value::{to_literal, Value};
use crate::{MockError, Result};
use regex::Regex;
use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^function\s*(&\s*)?(\w+)?").unwrap_or_else(|e| panic!("invalid name pattern: {e}"))
    })
}

/// A function split at its outermost body braces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSource {
    /// Everything before the body's `{`
    pub signature: String,
    /// Text strictly between the body braces
    pub body: String,
}

impl FunctionSource {
    /// Split extracted source, which must start at the `function` keyword.
    pub fn parse(source: &str) -> Result<Self> {
        let bounds = scanner::find_function(source, 0)
            .filter(|b| source[..b.start].trim().is_empty())
            .ok_or_else(|| MockError::SourceParse {
                name: "{fragment}".to_string(),
                path: PathBuf::new(),
                start_line: 1,
                end_line: source.lines().count() as u32,
                source_text: source.to_string(),
            })?;
        Ok(Self {
            signature: source[bounds.start..bounds.body_open].to_string(),
            body: source[bounds.body_open + 1..bounds.body_close].to_string(),
        })
    }
}

/// A name listed in a capture clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedName {
    /// Variable name without `$`
    pub name: String,
    pub by_reference: bool,
}

impl fmt::Display for CapturedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.by_reference {
            write!(f, "&${}", self.name)
        } else {
            write!(f, "${}", self.name)
        }
    }
}

/// A captured variable together with the value snapshotted for it
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedVariable {
    pub name: String,
    pub by_reference: bool,
    pub value: Value,
}

/// Rewrites a function's signature and body text
#[derive(Debug, Clone)]
pub struct FunctionRewriter {
    signature: String,
    body: String,
    prefix: Option<String>,
    prepended: String,
    capture_initializers: String,
    captures: Vec<CapturedName>,
}

impl FunctionRewriter {
    pub fn new(source: FunctionSource) -> Self {
        Self {
            signature: source.signature,
            body: source.body,
            prefix: None,
            prepended: String::new(),
            capture_initializers: String::new(),
            captures: Vec::new(),
        }
    }

    /// Parse extracted source and optionally rename the function
    pub fn from_source(source: &str, rename: Option<&str>) -> Result<Self> {
        let mut rewriter = Self::new(FunctionSource::parse(source)?);
        if let Some(name) = rename {
            rewriter.set_name(name);
        }
        Ok(rewriter)
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Rename the function, keeping a by-reference `&` on the name
    pub fn set_name(&mut self, name: &str) {
        let by_ref = name_pattern()
            .captures(&self.signature)
            .and_then(|c| c.get(1))
            .is_some();
        let replacement = format!("function {}{}", if by_ref { "&" } else { "" }, name);
        self.signature = name_pattern()
            .replace(&self.signature, regex::NoExpand(&replacement))
            .into_owned();
    }

    /// The function's name, empty for anonymous functions
    pub fn name(&self) -> String {
        name_pattern()
            .captures(&self.signature)
            .and_then(|c| c.get(2))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    }

    /// Offsets of the signature's outer parentheses
    fn parameter_bounds(&self) -> Option<(usize, usize)> {
        let open = self.signature.find('(')?;
        let close = scanner::find_closing(&self.signature, open)?;
        Some((open, close))
    }

    /// Exact text between the signature's outer parentheses
    pub fn parameters(&self) -> &str {
        match self.parameter_bounds() {
            Some((open, close)) => &self.signature[open + 1..close],
            None => "",
        }
    }

    /// Number of arguments a caller must pass
    pub fn required_parameters(&self) -> Result<usize> {
        Ok(ParameterList::parse(self.parameters())?.required_count())
    }

    /// Remove a trailing `use (...)` clause from the signature, keeping any
    /// return annotation after it, and return the captured names in order.
    pub fn extract_capture_clause(&mut self) -> Vec<CapturedName> {
        let Some((_, params_close)) = self.parameter_bounds() else {
            return Vec::new();
        };
        let tail_start = params_close + 1;
        let tail = &self.signature[tail_start..];
        let keyword_at = tail.len() - tail.trim_start().len();
        let rest = &tail[keyword_at..];
        let is_use = rest.starts_with("use")
            && !rest
                .as_bytes()
                .get(3)
                .copied()
                .map(is_ident_byte)
                .unwrap_or(false);
        if !is_use {
            return Vec::new();
        }

        let use_at = tail_start + keyword_at;
        let Some(open) = self.signature[use_at..].find('(').map(|i| use_at + i) else {
            return Vec::new();
        };
        let Some(close) = scanner::find_closing(&self.signature, open) else {
            return Vec::new();
        };

        let captures: Vec<CapturedName> = self.signature[open + 1..close]
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| {
                let by_reference = v.starts_with('&');
                let name = v.trim_start_matches('&').trim().trim_start_matches('$');
                CapturedName {
                    name: name.to_string(),
                    by_reference,
                }
            })
            .collect();

        let return_type = self.signature[close + 1..].trim().to_string();
        let mut head = self.signature[..use_at].trim_end().to_string();
        head.push(' ');
        if !return_type.is_empty() {
            head.push_str(&return_type);
            head.push(' ');
        }
        self.signature = head;
        self.captures = captures.clone();
        captures
    }

    /// Captured names found by the last `extract_capture_clause`
    pub fn captures(&self) -> &[CapturedName] {
        &self.captures
    }

    /// Emit one initializer per captured name from the snapshotted values.
    ///
    /// By-reference captures are imported by value with a warning. A
    /// captured name with no bound value is a configuration error.
    pub fn build_capture_initializers(&mut self, values: &[(String, Value)]) -> Result<()> {
        let mut initializers = String::new();
        for captured in &self.captures {
            if captured.by_reference {
                logging::log_reference_capture(&format!("${}", captured.name));
            }
            let value = values
                .iter()
                .find(|(name, _)| *name == captured.name)
                .map(|(_, value)| value)
                .ok_or_else(|| {
                    MockError::Configuration(format!(
                        "captured variable ${} has no bound value",
                        captured.name
                    ))
                })?;
            initializers.push_str(&format!("    ${} = {};\n", captured.name, to_literal(value)?));
        }
        self.capture_initializers = initializers;
        Ok(())
    }

    /// Extract the capture clause and bind its values in one step
    pub fn capture(&mut self, values: &[(String, Value)]) -> Result<Vec<CapturedVariable>> {
        self.extract_capture_clause();
        self.build_capture_initializers(values)?;
        Ok(self
            .captures
            .iter()
            .filter_map(|c| {
                values
                    .iter()
                    .find(|(name, _)| *name == c.name)
                    .map(|(_, value)| CapturedVariable {
                        name: c.name.clone(),
                        by_reference: c.by_reference,
                        value: value.clone(),
                    })
            })
            .collect())
    }

    /// Set the statement that always runs first
    pub fn set_instrumentation_prefix(&mut self, statement: &str) {
        self.prefix = Some(format!("    {}\n", statement));
    }

    pub fn clear_instrumentation_prefix(&mut self) {
        self.prefix = None;
    }

    /// Insert a statement ahead of everything prepended so far
    pub fn prepend(&mut self, statement: &str) {
        self.prepended = format!("    {}\n{}", statement, self.prepended);
    }

    /// Replace text in the original body only
    pub fn body_substitute(&mut self, search: &str, replacement: &str) {
        self.body = self.body.replace(search, replacement);
    }

    /// The composed body, without the surrounding braces
    pub fn body(&self) -> String {
        let mut body = String::new();
        if let Some(prefix) = &self.prefix {
            body.push_str(prefix);
        }
        body.push_str(&self.prepended);
        body.push_str(&self.capture_initializers);
        body.push_str(&self.body);
        body
    }

    /// The entire function source
    pub fn render(&self) -> String {
        format!("{}{{\n{}}}\n", self.signature, self.body())
    }
}

impl fmt::Display for FunctionRewriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
