use std::env;
use std::fs;
use std::fs::File;

use b4asm::error::Severity;

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("Usage: b4asm <file-base-name>...");
        std::process::exit(1);
    }

    for base_name in &args {
        process_file(base_name);
    }
}

/// Read `<base_name>.as`, assemble it, and write whichever of
/// `<base_name>.ob` / `.ent` / `.ext` the result earns.
fn process_file(base_name: &str) {
    let source_path = format!("{base_name}.as");
    let source = match fs::read_to_string(&source_path) {
        Ok(text) => text,
        Err(_) => {
            println!("[Info] Can't open the file \"{source_path}\".");
            return;
        }
    };
    println!("[Info] Successfully opened \"{source_path}\".");

    let lines: Vec<&str> = source.lines().collect();
    let assembled = b4asm::assemble_unit(&lines);

    for diag in assembled.unit.diagnostics.iter() {
        match diag.severity {
            Severity::Error => eprintln!("{diag}"),
            Severity::Warning | Severity::Info => println!("{diag}"),
        }
    }

    if assembled.unit.diagnostics.has_errors() {
        println!("[Info] Errors found, no output files created for \"{base_name}\".");
        return;
    }

    let Some(encoded) = assembled.encoded else {
        return;
    };

    if let Err(err) = write_object_file(base_name, &assembled.unit, &encoded) {
        eprintln!("[Error] Could not write output files for \"{base_name}\": {err}");
        return;
    }
    if assembled.unit.symbols.entries().next().is_some() {
        if let Err(err) = write_entries_file(base_name, &assembled.unit) {
            eprintln!("[Error] Could not write \"{base_name}.ent\": {err}");
            return;
        }
    }
    if !encoded.externs.is_empty() {
        if let Err(err) = write_externs_file(base_name, &encoded) {
            eprintln!("[Error] Could not write \"{base_name}.ext\": {err}");
            return;
        }
    }
    println!("[Info] Created output files for \"{base_name}\".");
}

fn write_object_file(
    base_name: &str,
    unit: &b4asm::context::TranslationUnit,
    encoded: &b4asm::encoder::EncodedUnit,
) -> std::io::Result<()> {
    let mut file = File::create(format!("{base_name}.ob"))?;
    b4asm::emitter::write_object(&mut file, unit.ic, unit.dc, encoded)
}

fn write_entries_file(base_name: &str, unit: &b4asm::context::TranslationUnit) -> std::io::Result<()> {
    let mut file = File::create(format!("{base_name}.ent"))?;
    b4asm::emitter::write_entries(&mut file, &unit.symbols)
}

fn write_externs_file(base_name: &str, encoded: &b4asm::encoder::EncodedUnit) -> std::io::Result<()> {
    let mut file = File::create(format!("{base_name}.ext"))?;
    b4asm::emitter::write_externs(&mut file, &encoded.externs)
}
