use super::scanner::{is_ident_byte, split_top_level};
use crate::{MockError, Result};
use std::fmt;
use std::path::PathBuf;

/// One declared parameter, e.g. `?array &...$rows = null`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub type_hint: Option<String>,
    pub by_reference: bool,
    pub variadic: bool,
    pub name: String,
    /// Default value source text, without the `=`
    pub default: Option<String>,
}

impl Parameter {
    pub fn is_optional(&self) -> bool {
        self.variadic || self.default.is_some()
    }

    fn parse(text: &str) -> std::result::Result<Self, String> {
        let parts = split_top_level(text, b'=');
        let declaration = parts[0].trim();
        let default = if parts.len() > 1 {
            // `==` cannot occur in a default at top level, so rejoin the rest
            Some(parts[1..].join("=").trim().to_string())
        } else {
            None
        };

        let dollar = declaration
            .rfind('$')
            .ok_or_else(|| format!("parameter '{}' has no variable name", text.trim()))?;
        let rest = &declaration[dollar + 1..];
        let name_end = rest
            .bytes()
            .position(|b| !is_ident_byte(b))
            .unwrap_or(rest.len());
        let name = rest[..name_end].to_string();
        if name.is_empty() {
            return Err(format!("parameter '{}' has an empty name", text.trim()));
        }

        let mut head = declaration[..dollar].trim_end();
        let mut variadic = false;
        let mut by_reference = false;
        if let Some(rest) = head.strip_suffix("...") {
            variadic = true;
            head = rest.trim_end();
        }
        if let Some(rest) = head.strip_suffix('&') {
            by_reference = true;
            head = rest.trim_end();
        }
        let type_hint = if head.is_empty() {
            None
        } else {
            Some(head.to_string())
        };

        Ok(Self {
            type_hint,
            by_reference,
            variadic,
            name,
            default,
        })
    }

    /// Declaration text using either the real name or `$arg{position}`
    pub fn render(&self, position: usize, use_name: bool) -> String {
        let mut out = String::new();
        if let Some(type_hint) = &self.type_hint {
            out.push_str(type_hint);
            out.push(' ');
        }
        if self.by_reference {
            out.push('&');
        }
        if self.variadic {
            out.push_str("...");
        }
        out.push('$');
        if use_name {
            out.push_str(&self.name);
        } else {
            out.push_str(&format!("arg{}", position));
        }
        if let Some(default) = &self.default {
            out.push_str(" = ");
            out.push_str(default);
        }
        out
    }
}

/// A parsed parameter list, the text between a signature's parentheses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterList {
    params: Vec<Parameter>,
}

impl ParameterList {
    pub fn parse(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let params = split_top_level(text, b',')
            .into_iter()
            .filter(|p| !p.trim().is_empty())
            .map(Parameter::parse)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|reason| MockError::SourceParse {
                name: format!("({})", text.trim()),
                path: PathBuf::new(),
                start_line: 0,
                end_line: 0,
                source_text: reason,
            })?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Parameters a caller must pass: everything up to the last parameter
    /// that has no default and is not variadic.
    pub fn required_count(&self) -> usize {
        self.params
            .iter()
            .rposition(|p| !p.is_optional())
            .map(|i| i + 1)
            .unwrap_or(0)
    }

    /// Comma separated declaration text
    pub fn render(&self, use_names: bool) -> String {
        self.params
            .iter()
            .enumerate()
            .map(|(i, p)| p.render(i + 1, use_names))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ParameterList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(true))
    }
}
