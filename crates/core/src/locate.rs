//! Class discovery over a preprocessed buffer.
//!
//! [`ClassLocator`] walks the buffer left to right. Each step finds the next
//! class header, balances braces from there to isolate the body, extracts the
//! class name, and resumes scanning after the closing brace. Nested classes are
//! consumed together with their enclosing class and never yielded on their own.

use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::preprocess::{opens_literal, skip_literal};
use crate::types::GenConfig;

// ---------------------------------------------------------------------------
// Located class
// ---------------------------------------------------------------------------

/// One class declaration isolated from the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDecl<'a> {
    pub name: String,
    /// Header text from the class keyword up to and including the opening brace.
    pub header: &'a str,
    /// Header plus body, through the matching closing brace.
    pub body: &'a str,
    /// Byte offset of the header within the full buffer.
    pub offset: usize,
}

// ---------------------------------------------------------------------------
// Brace balancing
// ---------------------------------------------------------------------------

/// Return the offset just past the brace that closes the first `{` at or after `start`.
///
/// Braces inside string and character literals are ignored. `None` when the
/// text ends before the nesting count returns to zero.
pub fn find_close_brace(src: &str, start: usize) -> Option<usize> {
    let bytes = src.as_bytes();
    let mut depth: i32 = 0;
    let mut opened = false;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' if opens_literal(bytes, i) => {
                i = skip_literal(bytes, i);
                continue;
            }
            b'{' => {
                depth += 1;
                opened = true;
            }
            b'}' => depth -= 1,
            _ => {}
        }
        if opened && depth == 0 {
            return Some(i + 1);
        }
        i += 1;
    }
    None
}

// ---------------------------------------------------------------------------
// Name extraction
// ---------------------------------------------------------------------------

/// Position of the first `:` that is not half of a `::`.
fn inheritance_colon(header: &str) -> Option<usize> {
    let bytes = header.as_bytes();
    (0..bytes.len()).find(|&i| {
        bytes[i] == b':'
            && (i == 0 || bytes[i - 1] != b':')
            && bytes.get(i + 1).map_or(true, |&b| b != b':')
    })
}

/// Any `[[...]]` attribute, removed before the name is read.
pub fn attribute_regex() -> Regex {
    Regex::new(r"\[\[[^\]]*\]\]").expect("attribute pattern is valid")
}

/// Extract the declared class name from a header such as
/// `class [[refl]] Foo : public Bar {`.
///
/// With an inheritance clause the name is the last token before the colon;
/// otherwise it is the last token before the opening brace.
pub fn class_name(header: &str, attributes: &Regex, keywords: &[String]) -> Result<String> {
    let cleaned = attributes.replace_all(header, " ");
    let head = match inheritance_colon(&cleaned) {
        Some(colon) => &cleaned[..colon],
        None => cleaned.trim_end().trim_end_matches('{'),
    };

    match head.split_whitespace().last() {
        Some(tok) if !keywords.iter().any(|k| k == tok) => Ok(tok.to_string()),
        _ => Err(Error::AmbiguousClassName { header: header.trim().to_string() }),
    }
}

// ---------------------------------------------------------------------------
// Locator
// ---------------------------------------------------------------------------

/// Build the header pattern: a class keyword, any run without `{` or `;`, then `{`.
pub fn header_regex(config: &GenConfig) -> Regex {
    let keywords: Vec<String> = config.class_keywords.iter().map(|k| regex::escape(k)).collect();
    let pattern = format!(r"\b(?:{})\b[^{{;]*\{{", keywords.join("|"));
    Regex::new(&pattern).expect("class header pattern is valid")
}

/// Iterator over the class declarations of a preprocessed buffer.
pub struct ClassLocator<'a> {
    buf: &'a str,
    /// Offset where the unconsumed suffix begins.
    cursor: usize,
    header_re: Regex,
    attribute_re: Regex,
    keywords: Vec<String>,
    done: bool,
}

impl<'a> ClassLocator<'a> {
    pub fn new(buf: &'a str, config: &GenConfig) -> Self {
        ClassLocator {
            buf,
            cursor: 0,
            header_re: header_regex(config),
            attribute_re: attribute_regex(),
            keywords: config.class_keywords.clone(),
            done: false,
        }
    }
}

impl<'a> Iterator for ClassLocator<'a> {
    type Item = Result<ClassDecl<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let buf = self.buf;
        let rest = &buf[self.cursor..];
        let Some(m) = self.header_re.find(rest) else {
            self.done = true;
            return None;
        };

        let offset = self.cursor + m.start();
        let Some(end) = find_close_brace(buf, offset) else {
            debug!(offset, "Unbalanced braces after class header, stopping scan");
            self.done = true;
            return None;
        };
        self.cursor = end;

        let header = &buf[offset..offset + m.len()];
        let body = &buf[offset..end];
        match class_name(header, &self.attribute_re, &self.keywords) {
            Ok(name) => Some(Ok(ClassDecl { name, header, body, offset })),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
