pub mod params;
pub mod scanner;

pub use params::{Parameter, ParameterList};
pub use scanner::FunctionBounds;

use crate::logging;
use crate::{MockError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Where a callable is declared: file plus inclusive 1-based line range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub path: PathBuf,
    pub start_line: u32,
    pub end_line: u32,
}

impl SourceSpan {
    pub fn new(path: impl Into<PathBuf>, start_line: u32, end_line: u32) -> Self {
        Self {
            path: path.into(),
            start_line,
            end_line,
        }
    }
}

/// File contents plus the byte offset of every line start
struct CachedFile {
    text: String,
    line_starts: Vec<usize>,
}

impl CachedFile {
    fn new(text: String) -> Self {
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .filter(|&i| i < text.len())
            .collect();
        Self { text, line_starts }
    }

    /// Text of lines `start..=end` (1-based), clamped to the file
    fn lines(&self, start: u32, end: u32) -> Option<&str> {
        let first = (start.max(1) - 1) as usize;
        let from = *self.line_starts.get(first)?;
        let to = self
            .line_starts
            .get(end as usize)
            .copied()
            .unwrap_or(self.text.len());
        (from <= to).then(|| &self.text[from..to])
    }
}

/// Pulls the exact source of a callable out of its declaring file
pub struct SourceExtractor {
    /// Cache of source file contents
    file_cache: HashMap<PathBuf, CachedFile>,
}

impl SourceExtractor {
    /// Create an extractor with an empty cache
    pub fn new() -> Self {
        Self {
            file_cache: HashMap::new(),
        }
    }

    /// Return the text from the `function` keyword through the closing brace
    /// of the first function declared within `span`.
    pub fn extract(&mut self, name: &str, span: &SourceSpan) -> Result<String> {
        let file = self.cached(&span.path)?;
        let searched = file
            .lines(span.start_line, span.end_line)
            .unwrap_or_default();
        match scanner::find_function(searched, 0) {
            Some(bounds) => Ok(searched[bounds.start..bounds.end()].to_string()),
            None => Err(MockError::SourceParse {
                name: name.to_string(),
                path: span.path.clone(),
                start_line: span.start_line,
                end_line: span.end_line,
                source_text: searched.to_string(),
            }),
        }
    }

    /// Same scan over text that is already in memory
    pub fn extract_from_text(name: &str, text: &str) -> Result<String> {
        match scanner::find_function(text, 0) {
            Some(bounds) => Ok(text[bounds.start..bounds.end()].to_string()),
            None => Err(MockError::SourceParse {
                name: name.to_string(),
                path: PathBuf::new(),
                start_line: 1,
                end_line: text.lines().count() as u32,
                source_text: text.to_string(),
            }),
        }
    }

    fn cached(&mut self, path: &Path) -> Result<&CachedFile> {
        if !self.file_cache.contains_key(path) {
            let text = fs::read_to_string(path).map_err(|e| MockError::SourceRead {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
            logging::log_source_cache_miss(&path.display().to_string(), text.len());
            self.file_cache
                .insert(path.to_path_buf(), CachedFile::new(text));
        }
        self.file_cache.get(path).ok_or_else(|| MockError::SourceRead {
            path: path.to_path_buf(),
            reason: "cache entry vanished".to_string(),
        })
    }

    /// Number of files currently cached
    pub fn cached_files(&self) -> usize {
        self.file_cache.len()
    }

    /// Clear the source cache
    pub fn clear_cache(&mut self) {
        self.file_cache.clear();
    }
}

impl Default for SourceExtractor {
    fn default() -> Self {
        Self::new()
    }
}
