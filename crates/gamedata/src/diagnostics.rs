//! Ordered diagnostic trail produced while loading a document.
//!
//! Nested causes follow an indentation convention: a parent line is followed
//! by its child lines, each prefixed with one tab per nesting level.

use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    lines: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Append `header` followed by every line of `children`, indented one level.
    pub fn nest(&mut self, header: impl Into<String>, children: Diagnostics) {
        self.lines.push(header.into());
        self.lines
            .extend(children.lines.into_iter().map(|line| format!("\t{}", line)));
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.lines.extend(other.lines);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, line) in self.lines.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            f.write_str(line)?;
        }
        Ok(())
    }
}
