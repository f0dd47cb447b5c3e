//! Terminal text helpers.

use std::sync::LazyLock;

use regex::Regex;

static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1B\[[0-?]*[ -/]*[@-~]").expect("valid ANSI regex"));

/// Remove CSI escape sequences (colors, cursor movement).
pub fn strip_ansi(input: &str) -> String {
    ANSI_ESCAPE.replace_all(input, "").into_owned()
}

/// Translate what a terminal widget sends into what the server reads.
///
/// CRLF and lone CR become LF; DEL becomes backspace.
pub fn normalize_terminal_input(input: &str) -> String {
    input
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\x7f', "\x08")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_color_codes() {
        assert_eq!(
            strip_ansi("\x1b[32m[INFO]\x1b[0m No server tokens configured."),
            "[INFO] No server tokens configured."
        );
        assert_eq!(strip_ansi("plain"), "plain");
    }

    #[test]
    fn normalizes_line_endings_and_delete() {
        assert_eq!(normalize_terminal_input("stop\r\n"), "stop\n");
        assert_eq!(normalize_terminal_input("stop\r"), "stop\n");
        assert_eq!(normalize_terminal_input("ab\x7f"), "ab\x08");
    }
}
