//! Pretty-printing messages to the console

use colored::Colorize;

/// Pretty-print an error message to the console
pub fn error(error_message: String) {
    let error_title = "error:".red().bold();
    eprintln!("{} {}", error_title, error_message);
}

/// Pretty-print a warning message to the console
pub fn warning(message: String, line_number: usize) {
    let warning = "warning:".yellow().bold();
    eprintln!("{} line {}: {}", warning, line_number, message);
}

/// Build a line of carets underlining the given byte ranges of `line`.
///
/// Shared by the macro expander's and the assembler's diagnostic rendering so both stages
/// point at the exact offending token instead of just naming a line number.
pub fn underline_spans(line: &str, spans: &[(usize, usize)]) -> String {
    let mut underline = vec![' '; line.chars().count()];
    for &(start, end) in spans {
        for slot in underline.iter_mut().take(end.min(underline.len())).skip(start) {
            *slot = '^';
        }
    }
    underline.into_iter().collect()
}
