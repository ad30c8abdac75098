//! # Line record
//!
//! Per-line state threaded from the first pass into the encoder: one record
//! per source line, carrying whichever command/operand data that line
//! turned out to parse as. The raw text is kept so later diagnostics can
//! reference it.

use crate::operand::{CommandDescriptor, Operand};

/// What a line turned out to be, once its first token is classified.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LineKind {
    #[default]
    Empty,
    Comment,
    Directive,
    Command,
}

#[derive(Debug, Clone)]
pub struct LineRecord {
    /// 1-based line number.
    pub line_number: usize,
    /// Starting address: `FIRST_ADDRESS + IC` before this line was parsed.
    pub start_address: u32,
    /// The raw source text, unmodified, for diagnostics.
    pub text: String,
    /// Whether this line has a parse-time error and should suppress
    /// further passes over it.
    pub is_error: bool,
    /// The label defined on this line, if any (the symbol already lives in
    /// the unit's symbol table; this is just the name for cross-reference).
    pub label: Option<String>,
    pub kind: LineKind,
    /// The command this line encodes, if `kind == Command`.
    pub command: Option<&'static CommandDescriptor>,
    /// Source operand (parsed first, emitted first).
    pub source_operand: Option<Operand>,
    /// Destination operand.
    pub dest_operand: Option<Operand>,
    /// Memory addresses of this line's operand words, in source-then-dest
    /// order, filled in by the encoder. Used by the extern emitter.
    pub source_operand_address: Option<u32>,
    pub dest_operand_address: Option<u32>,
}

impl LineRecord {
    pub fn new(line_number: usize, start_address: u32, text: &str) -> Self {
        Self {
            line_number,
            start_address,
            text: text.to_string(),
            is_error: false,
            label: None,
            kind: LineKind::Empty,
            command: None,
            source_operand: None,
            dest_operand: None,
            source_operand_address: None,
            dest_operand_address: None,
        }
    }
}
