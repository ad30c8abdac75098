//! # Artifact emitters
//!
//! Writes the three output artifacts: the object file (`.ob`), the entry
//! file (`.ent`) and the extern file (`.ext`). Each writer takes
//! `impl std::io::Write` instead of a path, so the core crate stays
//! testable without touching the filesystem — file creation is the
//! driver's job, not the emitter's.

use std::io::{self, Write};

use crate::context::FIRST_ADDRESS;
use crate::encoder::{EncodedUnit, ExternRef};
use crate::numeral;
use crate::symbol_table::SymbolTable;

/// Width of the `IC`/`DC` header fields and every `.ent`/`.ext` address.
const HEADER_WIDTH: usize = 1;

/// Width of each `.ob` body line's address and word fields.
const WORD_WIDTH: usize = 3;

/// Write the `.ob` artifact: a header line of `IC\t\tDC`, followed by one
/// `address\t\tword` line per memory word. No trailing newline — newline
/// is a line separator here, not a terminator.
pub fn write_object(out: &mut impl Write, ic: u32, dc: u32, encoded: &EncodedUnit) -> io::Result<()> {
    write!(
        out,
        "{}\t\t{}",
        numeral::encode(ic, HEADER_WIDTH),
        numeral::encode(dc, HEADER_WIDTH)
    )?;
    for (offset, word) in encoded.words.iter().enumerate() {
        let address = FIRST_ADDRESS + offset as u32;
        write!(
            out,
            "\n{}\t\t{}",
            numeral::encode(address, WORD_WIDTH),
            numeral::encode_signed_word(word.as_word10(), WORD_WIDTH)
        )?;
    }
    Ok(())
}

/// Write the `.ent` artifact: one `name\t\taddress` line per `.entry`
/// declaration, in declaration order. Callers should skip creating this
/// file entirely when `symbols.entries()` is empty.
pub fn write_entries(out: &mut impl Write, symbols: &SymbolTable) -> io::Result<()> {
    let mut first = true;
    for entry in symbols.entries() {
        let Some(sym) = symbols.get_label(&entry.name) else { continue };
        if !first {
            write!(out, "\n")?;
        }
        first = false;
        write!(out, "{}\t\t{}", entry.name, numeral::encode(sym.address, HEADER_WIDTH))?;
    }
    Ok(())
}

/// Write the `.ext` artifact: one `name\t\taddress` line per extern
/// reference, in the order they were encountered during the second pass
/// (source operand before destination operand, file order across lines).
/// Callers should skip creating this file entirely when `externs` is
/// empty.
pub fn write_externs(out: &mut impl Write, externs: &[ExternRef]) -> io::Result<()> {
    for (i, ext) in externs.iter().enumerate() {
        if i > 0 {
            write!(out, "\n")?;
        }
        write!(out, "{}\t\t{}", ext.name, numeral::encode(ext.address, HEADER_WIDTH))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TranslationUnit;
    use crate::{encoder, first_pass};

    fn build(lines: &[&str]) -> (TranslationUnit, EncodedUnit) {
        let mut unit = TranslationUnit::new();
        let _ = first_pass::run(&mut unit, lines);
        let encoded = encoder::run(&mut unit);
        (unit, encoded)
    }

    #[test]
    fn object_header_matches_worked_example() {
        let (unit, encoded) = build(&["stop"]);
        let mut buf = Vec::new();
        write_object(&mut buf, unit.ic, unit.dc, &encoded).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let first_line = text.lines().next().unwrap();
        assert_eq!(
            first_line,
            format!("{}\t\t{}", numeral::encode(1, HEADER_WIDTH), numeral::encode(0, HEADER_WIDTH))
        );
        assert_eq!(first_line, "b\t\ta");
    }

    #[test]
    fn object_body_line_uses_width_three() {
        let (unit, encoded) = build(&["stop"]);
        let mut buf = Vec::new();
        write_object(&mut buf, unit.ic, unit.dc, &encoded).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let body_line = text.lines().nth(1).unwrap();
        // address 100 -> base-4 "1210" -> "bcba" (already 4 digits, width 3 adds no padding)
        assert_eq!(body_line, format!("bcba\t\t{}", numeral::encode_signed_word(15 << 4, WORD_WIDTH)));
    }

    #[test]
    fn object_artifact_has_no_trailing_newline() {
        let (unit, encoded) = build(&["stop", "D: .data 1, 2"]);
        let mut buf = Vec::new();
        write_object(&mut buf, unit.ic, unit.dc, &encoded).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(!text.ends_with('\n'));
        assert_eq!(text.lines().count(), 1 + encoded.words.len());
    }

    #[test]
    fn entries_skip_declarations_without_a_matching_label() {
        let (unit, _encoded) = build(&[".entry LBL", "LBL: stop"]);
        let mut buf = Vec::new();
        write_entries(&mut buf, &unit.symbols).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("LBL\t\t"));
        assert!(!text.ends_with('\n'));
    }

    #[test]
    fn externs_preserve_encounter_order() {
        let (unit, encoded) = build(&[".extern A", ".extern B", "mov A, B"]);
        assert!(!unit.diagnostics.has_errors());
        let mut buf = Vec::new();
        write_externs(&mut buf, &encoded.externs).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("A\t\t"));
        assert!(lines[1].starts_with("B\t\t"));
    }
}
