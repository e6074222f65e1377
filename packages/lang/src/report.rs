//! Pretty terminal rendering of parse errors via ariadne.

use ariadne::{Color, Label, Report, ReportKind, Source};

use crate::error::ParseError;

/// Render parse errors as annotated source snippets. Errors without a
/// position (end-of-input, assembly failures) fall back to their
/// `Display` text.
pub fn format_errors(source: &str, filename: &str, errors: &[ParseError]) -> String {
    let mut output = Vec::new();
    for error in errors {
        match error.pos() {
            Some(pos) => {
                let end = match error {
                    ParseError::UnexpectedToken { found, .. } => pos.offset + found.len(),
                    _ => (pos.offset + 1).min(source.len()),
                };
                let _ = Report::build(ReportKind::Error, filename, pos.offset)
                    .with_message(error.to_string())
                    .with_label(
                        Label::new((filename, pos.offset..end))
                            .with_color(Color::Red)
                            .with_message(error.to_string()),
                    )
                    .finish()
                    .write((filename, Source::from(source)), &mut output);
            }
            None => {
                output.extend_from_slice(format!("error: {}\n", error).as_bytes());
            }
        }
    }
    String::from_utf8_lossy(&output).into_owned()
}
