//! Section extraction from generated pitch text
//!
//! Splits a numbered list of headings into named chunks. A heading is a line
//! of the form `<digits>.<whitespace><title>`; every non-blank line that is not
//! a heading belongs to the body of the most recent heading. Text before the
//! first heading is dropped.
//!
//! ```text
//! intro text            <- dropped
//! 1. Problem            <- heading "Problem"
//! Line A                <- body
//!
//! 2. Solution           <- heading "Solution"
//! Line C                <- body
//! ```

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

/// Ordered title -> body mapping
///
/// Iteration order is the order in which titles were first seen. Assigning to
/// an existing title replaces its body but keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SectionMap {
    entries: IndexMap<String, String>,
}

impl SectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a section, returning the previous body if any
    pub fn insert(&mut self, title: impl Into<String>, body: impl Into<String>) -> Option<String> {
        self.entries.insert(title.into(), body.into())
    }

    pub fn get(&self, title: &str) -> Option<&str> {
        self.entries.get(title).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Section titles in deck order
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// (title, body) pairs in deck order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(t, b)| (t.as_str(), b.as_str()))
    }
}

impl<'a> IntoIterator for &'a SectionMap {
    type Item = (&'a String, &'a String);
    type IntoIter = indexmap::map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Match a numbered heading line, returning its trimmed title
///
/// Grammar: `DIGIT+ "." WS+ TITLE` where TITLE is non-empty after trimming.
/// The line is matched as-is, so indented lines are never headings.
pub fn parse_heading(line: &str) -> Option<&str> {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }

    let rest = line[digits..].strip_prefix('.')?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let title = rest.trim();
    if title.is_empty() {
        return None;
    }

    Some(title)
}

/// Single-pass splitter state
struct Splitter {
    sections: SectionMap,
    title: Option<String>,
    buffer: Vec<String>,
}

impl Splitter {
    fn new() -> Self {
        Self {
            sections: SectionMap::new(),
            title: None,
            buffer: Vec::new(),
        }
    }

    fn feed(&mut self, line: &str) {
        if let Some(title) = parse_heading(line) {
            self.flush();
            self.title = Some(title.to_string());
            return;
        }

        let trimmed = line.trim();
        if !trimmed.is_empty() {
            self.buffer.push(trimmed.to_string());
        }
    }

    fn flush(&mut self) {
        let lines = std::mem::take(&mut self.buffer);
        let Some(title) = self.title.take() else {
            if !lines.is_empty() {
                debug!(line_count = lines.len(), "Splitter::flush: dropping preamble");
            }
            return;
        };

        let body = lines.join("\n").trim().to_string();
        if self.sections.insert(title.clone(), body).is_some() {
            warn!(%title, "Duplicate section heading; later body replaces earlier one");
        }
    }

    fn finish(mut self) -> SectionMap {
        self.flush();
        self.sections
    }
}

/// Split pitch text into an ordered title -> body mapping
pub fn extract_sections(text: &str) -> SectionMap {
    debug!(text_len = text.len(), "extract_sections: called");

    let mut splitter = Splitter::new();
    for line in text.lines() {
        splitter.feed(line);
    }

    let sections = splitter.finish();
    debug!(section_count = sections.len(), "extract_sections: done");
    sections
}
