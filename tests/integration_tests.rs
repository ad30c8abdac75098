//! End-to-end tests exercising the public pipeline (`assemble_unit` plus
//! the emitter functions) against representative programs and boundary
//! conditions.

use b4asm::emitter;

fn object_text(lines: &[&str]) -> (b4asm::AssembledUnit, String) {
    let assembled = b4asm::assemble_unit(lines);
    assert!(
        !assembled.unit.diagnostics.has_errors(),
        "unexpected errors: {:?}",
        assembled.unit.diagnostics.iter().collect::<Vec<_>>()
    );
    let encoded = assembled.encoded.as_ref().expect("pass 1 did not abort");
    let mut buf = Vec::new();
    emitter::write_object(&mut buf, assembled.unit.ic, assembled.unit.dc, encoded).unwrap();
    let text = String::from_utf8(buf).unwrap();
    (assembled, text)
}

#[test]
fn empty_program_has_a_single_header_line() {
    let (assembled, text) = object_text(&["; nothing"]);
    assert_eq!(assembled.unit.ic, 0);
    assert_eq!(assembled.unit.dc, 0);
    assert_eq!(text, "a\t\ta");
}

#[test]
fn stop_only_program_emits_one_code_word() {
    let (assembled, text) = object_text(&["MAIN: stop"]);
    assert_eq!(assembled.unit.ic, 1);
    assert_eq!(assembled.unit.dc, 0);
    let mut lines = text.lines();
    assert_eq!(lines.next().unwrap(), "b\t\ta");
    assert_eq!(lines.next().unwrap().split("\t\t").next().unwrap(), "bcba");
    assert!(lines.next().is_none());

    let mut ent_buf = Vec::new();
    emitter::write_entries(&mut ent_buf, &assembled.unit.symbols).unwrap();
    assert!(ent_buf.is_empty());
}

#[test]
fn extern_reference_is_recorded_with_its_operand_address() {
    let assembled = b4asm::assemble_unit(&[".extern X", "jmp X"]);
    assert!(!assembled.unit.diagnostics.has_errors());
    assert_eq!(assembled.unit.ic, 2);
    let encoded = assembled.encoded.unwrap();
    assert_eq!(encoded.externs.len(), 1);
    assert_eq!(encoded.externs[0].name, "X");
    assert_eq!(encoded.externs[0].address, 101);

    let mut buf = Vec::new();
    emitter::write_externs(&mut buf, &encoded.externs).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert_eq!(text, format!("X\t\t{}", b4asm::numeral::encode(101, 1)));
}

#[test]
fn entry_resolves_to_first_address() {
    let assembled = b4asm::assemble_unit(&[".entry LBL", "LBL: stop"]);
    assert!(!assembled.unit.diagnostics.has_errors());
    assert_eq!(assembled.unit.ic, 1);

    let mut buf = Vec::new();
    emitter::write_entries(&mut buf, &assembled.unit.symbols).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert_eq!(text, format!("LBL\t\t{}", b4asm::numeral::encode(100, 1)));
}

#[test]
fn data_segment_is_rebased_after_the_code_segment() {
    let assembled = b4asm::assemble_unit(&["mov r1, r2", "D: .data 5, -3"]);
    assert!(!assembled.unit.diagnostics.has_errors());
    assert_eq!(assembled.unit.ic, 1, "two register operands share one word");
    assert_eq!(assembled.unit.dc, 2);
    assert_eq!(assembled.unit.symbols.get_label("D").unwrap().address, 101);

    let encoded = assembled.encoded.unwrap();
    assert_eq!(encoded.words.len(), 3);
}

#[test]
fn arity_error_gates_all_artifacts() {
    let lines = ["MAIN: stop", "mov r1", "X: stop"];
    let assembled = b4asm::assemble_unit(&lines);
    assert!(assembled.unit.diagnostics.has_errors());
    let message = assembled
        .unit
        .diagnostics
        .iter()
        .find(|d| d.line == 2)
        .map(ToString::to_string)
        .expect("line 2 should have a diagnostic");
    assert_eq!(message, "[Error] At line 2: not enough operands");
}

#[test]
fn eighty_char_line_is_accepted_eighty_one_is_rejected() {
    let ok_line = format!("; {}", "a".repeat(78));
    let too_long_line = format!("; {}", "a".repeat(79));
    assert_eq!(ok_line.len(), 80);
    assert_eq!(too_long_line.len(), 81);

    let good = b4asm::assemble_unit(&[ok_line.as_str()]);
    assert!(!good.unit.diagnostics.has_errors());

    let bad = b4asm::assemble_unit(&[too_long_line.as_str()]);
    assert!(bad.unit.diagnostics.has_errors());
}

#[test]
fn data_boundary_values_511_accepted_512_rejected() {
    let ok = b4asm::assemble_unit(&["D: .data 511, -511"]);
    assert!(!ok.unit.diagnostics.has_errors());

    let bad = b4asm::assemble_unit(&["D: .data 512"]);
    assert!(bad.unit.diagnostics.has_errors());

    let bad_neg = b4asm::assemble_unit(&["D: .data -512"]);
    assert!(bad_neg.unit.diagnostics.has_errors());
}

#[test]
fn immediate_boundary_values_127_accepted_128_rejected() {
    let ok = b4asm::assemble_unit(&["prn #127", "prn #-127"]);
    assert!(!ok.unit.diagnostics.has_errors());

    let bad = b4asm::assemble_unit(&["prn #128"]);
    assert!(bad.unit.diagnostics.has_errors());
}

#[test]
fn two_register_operands_share_one_word() {
    let assembled = b4asm::assemble_unit(&["mov r3, r5"]);
    assert!(!assembled.unit.diagnostics.has_errors());
    let encoded = assembled.encoded.unwrap();
    assert_eq!(encoded.words.len(), 2);
    assert_eq!(encoded.words[1].bits & 0xF, 5);
    assert_eq!((encoded.words[1].bits >> 4) & 0xF, 3);
}

#[test]
fn idempotence_across_files() {
    let file_a: Vec<&str> = vec!["A: stop", ".entry A"];
    let file_b: Vec<&str> = vec![".extern Z", "jmp Z"];

    let a1 = b4asm::assemble_unit(&file_a);
    let b1 = b4asm::assemble_unit(&file_b);

    // Re-run in the opposite order; a freshly constructed TranslationUnit
    // per call means neither run can observe the other's state.
    let b2 = b4asm::assemble_unit(&file_b);
    let a2 = b4asm::assemble_unit(&file_a);

    assert_eq!(a1.unit.ic, a2.unit.ic);
    assert_eq!(a1.unit.dc, a2.unit.dc);
    assert_eq!(b1.unit.ic, b2.unit.ic);
    assert_eq!(b1.unit.dc, b2.unit.dc);

    let mut buf_a1 = Vec::new();
    emitter::write_object(&mut buf_a1, a1.unit.ic, a1.unit.dc, a1.encoded.as_ref().unwrap()).unwrap();
    let mut buf_a2 = Vec::new();
    emitter::write_object(&mut buf_a2, a2.unit.ic, a2.unit.dc, a2.encoded.as_ref().unwrap()).unwrap();
    assert_eq!(buf_a1, buf_a2);
}

#[test]
fn undefined_symbol_is_a_hard_error() {
    let assembled = b4asm::assemble_unit(&["jmp NOPE"]);
    assert!(assembled.unit.diagnostics.has_errors());
}

#[test]
fn matrix_operand_reserves_base_plus_subscript_word() {
    let lines = ["M: .mat [2][2] 1, 2, 3, 4", "mov M[r1][r2], r0"];
    let assembled = b4asm::assemble_unit(&lines);
    assert!(!assembled.unit.diagnostics.has_errors());
    // mov has two operands: Mat (2 words) + Register (1 word) + the command word itself.
    assert_eq!(assembled.unit.ic, 4);
}

#[test]
fn label_before_extern_is_discarded_and_does_not_leak_into_the_table() {
    let assembled = b4asm::assemble_unit(&["X: .extern Y"]);
    assert!(assembled.unit.symbols.get_label("X").is_none());
    assert!(assembled.unit.symbols.get_label("Y").unwrap().is_extern);
}
