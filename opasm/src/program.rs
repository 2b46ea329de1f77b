//! # Programs
//! A [`Program`] is the tokenized form of a source text: trimmed, non-empty
//! [`Line`]s along with the [`Dialect`] they were cut with.
//!
//! Blank lines are dropped *before* indices are assigned, so jump targets and
//! disassembly listings refer to this compacted numbering rather than to lines of
//! the original text.

use alloc::{string::String, vec::Vec};
use either::Either;

use crate::{decode::Instruction, disasm, labels::LabelTable, Dialect};

/// A single trimmed, non-empty line of a program.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Line {
    /// Position in the program once blank lines are removed.
    pub index: usize,
    pub text: String,
    pub is_label: bool,
}
impl Line {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            index,
            is_label: text.ends_with(':'),
            text,
        }
    }

    /// Returns the uppercase name declared by this line, if it is a label.
    /// # Example
    /// ```rust
    /// # use opasm::Line;
    /// assert_eq!(Line::new(0, "loop:").label_name().as_deref(), Some("LOOP"));
    /// assert_eq!(Line::new(0, "JMP loop").label_name(), None);
    /// ```
    pub fn label_name(&self) -> Option<String> {
        self.text
            .strip_suffix(':')
            .filter(|_| self.is_label)
            .map(str::to_uppercase)
    }

    /// Decodes this line as an instruction.
    pub fn decode(&self, dialect: &Dialect) -> Instruction<'_> {
        Instruction::decode(&self.text, dialect)
    }
}

/// Cuts a source text into lines, numbering them after blank ones were dropped.
/// # Example
/// ```rust
/// # use opasm::*;
/// let lines = tokenize("A:\n\n   B  \nC:,D", &Dialect::STACK);
/// let texts: Vec<_> = lines.iter().map(|line| line.text.as_str()).collect();
/// assert_eq!(texts, ["A:", "B", "C:", "D"]);
/// assert_eq!(lines[3].index, 3);
/// ```
pub fn tokenize(source: &str, dialect: &Dialect) -> Vec<Line> {
    let pieces = if dialect.comma_separates_lines {
        Either::Left(source.split(|c: char| c == '\n' || c == ','))
    } else {
        Either::Right(source.split('\n'))
    };
    pieces
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .enumerate()
        .map(|(index, text)| Line::new(index, text))
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Program {
    pub(crate) lines: Vec<Line>,
    dialect: Dialect,
}
impl Program {
    /// Tokenizes a source text using the given dialect.
    pub fn parse(source: &str, dialect: Dialect) -> Self {
        Self {
            lines: tokenize(source, &dialect),
            dialect,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn get(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// First pass over the program, collecting its labels.
    pub fn labels(&self) -> LabelTable {
        LabelTable::resolve(&self.lines, self.dialect.label_target)
    }

    /// Human readable listing of the program, see [`disassemble`](crate::disassemble).
    pub fn disassemble(&self) -> String {
        disasm::disassemble(&self.lines, &self.dialect)
    }

    /// Source text of the program, one line per instruction or label.
    ///
    /// Parsing it again with the same dialect gives back the same program.
    pub fn source(&self) -> String {
        let mut source = String::new();
        for (i, line) in self.lines.iter().enumerate() {
            if i != 0 {
                source.push('\n');
            }
            source.push_str(&line.text);
        }
        source
    }

    /// Renumbers every line after an insertion.
    pub(crate) fn reindex(&mut self) {
        self.lines
            .iter_mut()
            .enumerate()
            .for_each(|(index, line)| line.index = index);
    }
}
