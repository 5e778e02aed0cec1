//! Delimiter scanning over function-shaped source fragments.
//!
//! All positions are byte offsets. Only ASCII bytes are ever compared, so
//! every offset returned lands on a UTF-8 character boundary.

const KEYWORD: &[u8] = b"function";

/// Byte offsets of one `function ... ( ... ) ... { ... }` occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionBounds {
    /// Offset of the `function` keyword
    pub start: usize,
    pub params_open: usize,
    pub params_close: usize,
    pub body_open: usize,
    pub body_close: usize,
}

impl FunctionBounds {
    /// Offset just past the closing brace
    pub fn end(&self) -> usize {
        self.body_close + 1
    }
}

pub(crate) fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}

/// If a string literal or comment starts at `pos`, return the offset just
/// past it. Unterminated literals run to the end of input.
pub(crate) fn skip_literal(bytes: &[u8], pos: usize) -> Option<usize> {
    let next = bytes.get(pos + 1).copied();
    match bytes[pos] {
        quote @ (b'\'' | b'"' | b'`') => {
            let mut i = pos + 1;
            while i < bytes.len() {
                match bytes[i] {
                    b'\\' => i += 2,
                    c if c == quote => return Some(i + 1),
                    _ => i += 1,
                }
            }
            Some(bytes.len())
        }
        b'/' if next == Some(b'/') => Some(line_end(bytes, pos)),
        b'#' if next != Some(b'[') => Some(line_end(bytes, pos)),
        b'/' if next == Some(b'*') => {
            let mut i = pos + 2;
            while i + 1 < bytes.len() {
                if bytes[i] == b'*' && bytes[i + 1] == b'/' {
                    return Some(i + 2);
                }
                i += 1;
            }
            Some(bytes.len())
        }
        _ => None,
    }
}

fn line_end(bytes: &[u8], pos: usize) -> usize {
    bytes[pos..]
        .iter()
        .position(|&b| b == b'\n')
        .map(|p| pos + p)
        .unwrap_or(bytes.len())
}

fn closing_for(open: u8) -> Option<u8> {
    match open {
        b'(' => Some(b')'),
        b'[' => Some(b']'),
        b'{' => Some(b'}'),
        _ => None,
    }
}

/// Find the delimiter that closes the one at `open`, skipping string
/// literals and comments.
pub fn find_closing(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let open_byte = *bytes.get(open)?;
    let close_byte = closing_for(open_byte)?;
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        if let Some(after) = skip_literal(bytes, i) {
            i = after;
            continue;
        }
        let b = bytes[i];
        if b == open_byte {
            depth += 1;
        } else if b == close_byte {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}

/// Split `text` on top-level occurrences of `separator`, ignoring those
/// nested in brackets or literals.
pub fn split_top_level(text: &str, separator: u8) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut last = 0;
    let mut i = 0;
    while i < bytes.len() {
        if let Some(after) = skip_literal(bytes, i) {
            i = after;
            continue;
        }
        match bytes[i] {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth -= 1,
            b if b == separator && depth == 0 => {
                parts.push(&text[last..i]);
                last = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    parts.push(&text[last..]);
    parts
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Try to read a function header whose keyword starts at `start`.
fn function_at(text: &str, start: usize) -> Option<FunctionBounds> {
    let bytes = text.as_bytes();
    let mut i = skip_whitespace(bytes, start + KEYWORD.len());
    if bytes.get(i) == Some(&b'&') {
        i = skip_whitespace(bytes, i + 1);
    }
    while i < bytes.len() && is_ident_byte(bytes[i]) {
        i += 1;
    }
    i = skip_whitespace(bytes, i);
    if bytes.get(i) != Some(&b'(') {
        return None;
    }
    let params_open = i;
    let params_close = find_closing(text, params_open)?;
    // `use (...)` and the return annotation sit between the parameter list
    // and the body; a `;` first means a bodiless declaration.
    let mut j = params_close + 1;
    let body_open = loop {
        if j >= bytes.len() {
            return None;
        }
        if let Some(after) = skip_literal(bytes, j) {
            j = after;
            continue;
        }
        match bytes[j] {
            b'{' => break j,
            b'(' => j = find_closing(text, j)? + 1,
            b';' | b'}' | b')' => return None,
            _ => j += 1,
        }
    };
    let body_close = find_closing(text, body_open)?;
    Some(FunctionBounds {
        start,
        params_open,
        params_close,
        body_open,
        body_close,
    })
}

/// Find the first function-shaped fragment at or after `from`.
pub fn find_function(text: &str, from: usize) -> Option<FunctionBounds> {
    let bytes = text.as_bytes();
    let mut i = from;
    while i < bytes.len() {
        if let Some(after) = skip_literal(bytes, i) {
            i = after;
            continue;
        }
        let at_boundary = i == 0 || !(is_ident_byte(bytes[i - 1]) || bytes[i - 1] == b'$');
        if at_boundary
            && bytes[i..].starts_with(KEYWORD)
            && !bytes
                .get(i + KEYWORD.len())
                .copied()
                .map(is_ident_byte)
                .unwrap_or(false)
        {
            if let Some(bounds) = function_at(text, i) {
                return Some(bounds);
            }
        }
        i += 1;
    }
    None
}

/// Iterate over top-level functions: nested closures inside a body are
/// skipped along with it.
pub fn functions(text: &str) -> impl Iterator<Item = FunctionBounds> + '_ {
    let mut from = 0;
    std::iter::from_fn(move || {
        let bounds = find_function(text, from)?;
        from = bounds.end();
        Some(bounds)
    })
}
