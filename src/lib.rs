//! # b4asm
//!
//! A two-pass assembler for a small fictional 10-bit word machine. It reads
//! one source line at a time, resolves symbols across two passes, and
//! serializes the result as three text artifacts — object, entries and
//! externs — using a base-4 "letters" numeral system (`a b c d` for
//! digits `0 1 2 3`).
//!
//! ## Pipeline
//!
//! 1. [`first_pass`] walks the source lines once, building the symbol
//!    table, the data segment and a [`line_record::LineRecord`] per line.
//! 2. [`encoder`] walks those records a second time, now that every symbol
//!    is known, and produces a flat memory image plus the extern
//!    reference sites.
//! 3. [`emitter`] serializes the memory image and reference lists as the
//!    three output artifacts.
//!
//! Everything above is threaded through one [`context::TranslationUnit`]
//! per source file; there is no process-wide state to reset between files.
//!
//! ```rust
//! use b4asm::context::TranslationUnit;
//! use b4asm::{encoder, first_pass};
//!
//! let source = ["MAIN: stop"];
//! let mut unit = TranslationUnit::new();
//! let _ = first_pass::run(&mut unit, &source);
//! let encoded = encoder::run(&mut unit);
//! assert!(!unit.diagnostics.has_errors());
//! assert_eq!(encoded.words.len(), 1);
//! ```

pub mod context;
pub mod emitter;
pub mod encoder;
pub mod error;
pub mod first_pass;
pub mod lex;
pub mod line_record;
pub mod numeral;
pub mod operand;
pub mod symbol_table;

use std::ops::ControlFlow;

use context::TranslationUnit;
use encoder::EncodedUnit;

/// The result of assembling one translation unit: the finished context
/// (symbol table, diagnostics) and, when pass 1 didn't abort on a capacity
/// limit, the encoded memory image. Artifact emission is gated on
/// `unit.diagnostics.has_errors()` regardless of whether `encoded` is
/// present.
pub struct AssembledUnit {
    pub unit: TranslationUnit,
    pub encoded: Option<EncodedUnit>,
}

/// Assemble one file's worth of source lines end to end: first pass, then
/// (unless pass 1 aborted on a capacity limit) the second pass.
///
/// Each source line longer than [`context::MAX_LINE_LEN`] is rejected by
/// the first pass itself. Splitting text into lines and opening the file
/// are driver concerns, not the core's.
#[must_use]
pub fn assemble_unit(source_lines: &[&str]) -> AssembledUnit {
    let mut unit = TranslationUnit::new();
    let encoded = match first_pass::run(&mut unit, source_lines) {
        ControlFlow::Continue(()) => Some(encoder::run(&mut unit)),
        ControlFlow::Break(()) => None,
    };
    AssembledUnit { unit, encoded }
}
