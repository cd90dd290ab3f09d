//! CLI driver: macro-expand then assemble one or more base filenames, reporting per-file
//! failures without letting one bad file stop the rest of the run.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use asm24::assembler::{self, emit};
use asm24::logging;
use asm24::macro_expander;

/// Build the path for one of a base filename's sibling files (`<base>.as`, `<base>.am`, ...).
fn sibling_path(base: &str, extension: &str) -> PathBuf {
    PathBuf::from(format!("{base}{extension}"))
}

/// Run the full pipeline for one base filename. Returns `false` if anything about this file
/// failed, in which case the failure has already been reported to stderr.
fn process_file(base: &str) -> bool {
    let as_path = sibling_path(base, ".as");
    let source = match fs::read_to_string(&as_path) {
        Ok(text) => text,
        Err(e) => {
            logging::error(format!("could not open \"{}\": {e}", as_path.display()));
            return false;
        }
    };
    let lines: Vec<String> = source.lines().map(str::to_string).collect();

    let Some(expanded) = macro_expander::expand(&lines) else {
        return false;
    };

    let am_path = sibling_path(base, ".am");
    let am_contents = expanded.iter().map(|line| format!("{line}\n")).collect::<String>();
    if let Err(e) = fs::write(&am_path, am_contents) {
        logging::error(format!("could not write \"{}\": {e}", am_path.display()));
        return false;
    }

    let Some(assembly) = assembler::assemble(&expanded) else {
        return false;
    };

    let obj_path = sibling_path(base, ".obj");
    let ent_path = sibling_path(base, ".ent");
    let ext_path = sibling_path(base, ".ext");
    for (path, result) in [
        (&obj_path, emit::write_obj(&obj_path, &assembly)),
        (&ent_path, emit::write_ent(&ent_path, &assembly)),
        (&ext_path, emit::write_ext(&ext_path, &assembly)),
    ] {
        if let Err(e) = result {
            logging::error(format!("could not write \"{}\": {e}", path.display()));
            return false;
        }
    }

    true
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <file1> [file2] ...", args[0]);
        return ExitCode::FAILURE;
    }

    let mut any_failed = false;
    for base in &args[1..] {
        if !process_file(base) {
            any_failed = true;
        }
    }

    if any_failed { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}
