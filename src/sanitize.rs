use regex::Regex;
use std::sync::OnceLock;

/// Prefix for identifiers that would otherwise start with a digit.
pub const DIGIT_PREFIX: &str = "my_";
/// Identifier used when the input has nothing to keep.
pub const EMPTY_IDENTIFIER: &str = "unnamed";

const RESERVED_WORDS: &[&str] = &[
    "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del", "elif",
    "else", "except", "false", "finally", "for", "from", "global", "if", "import", "in", "is",
    "lambda", "none", "nonlocal", "not", "or", "pass", "raise", "return", "true", "try", "while",
    "with", "yield", "print", "vn", "character",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quote {
    Single,
    Double,
}

impl Quote {
    fn as_char(self) -> char {
        match self {
            Quote::Single => '\'',
            Quote::Double => '"',
        }
    }
}

pub fn quote_literal(text: &str) -> String {
    quote_literal_with(text, Quote::Double)
}

pub fn quote_literal_with(text: &str, quote: Quote) -> String {
    let q = quote.as_char();
    let mut out = String::with_capacity(text.len() + 2);
    out.push(q);
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == q => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(q);
    out
}

/// Maps arbitrary text to a lower-case bare identifier. Idempotent.
pub fn sanitize_identifier(text: &str) -> String {
    let replaced = invalid_identifier_char_regex().replace_all(text, "_");
    let mut name = replaced.to_lowercase();
    if name.is_empty() {
        return EMPTY_IDENTIFIER.to_string();
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert_str(0, DIGIT_PREFIX);
    }
    if RESERVED_WORDS.contains(&name.as_str()) {
        name.push('_');
    }
    name
}

/// Label and scene names keep only `[A-Za-z0-9_]`; everything else is dropped.
pub fn strip_label(text: &str) -> String {
    invalid_identifier_char_regex()
        .replace_all(text.trim(), "")
        .into_owned()
}

/// Turns a user-typed variable value into a safe call argument.
pub fn render_value(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return "None".to_string();
    }
    if matches!(trimmed, "True" | "False" | "None") || number_regex().is_match(trimmed) {
        return trimmed.to_string();
    }
    if let Some(decoded) = crate::parser::parse_string_literal(trimmed) {
        return quote_literal(&decoded);
    }
    quote_literal(trimmed)
}

fn invalid_identifier_char_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"[^A-Za-z0-9_]").expect("identifier regex"))
}

fn number_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        // Integers may not carry leading zeros; floats and exponents may.
        Regex::new(r"^-?(?:0+|[1-9]\d*|(?:\d+\.\d*|\.\d+)(?:[eE][+-]?\d+)?|\d+[eE][+-]?\d+)$")
            .expect("number regex")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_string_literal;

    #[test]
    fn identifiers_are_lowercase_and_idempotent() {
        let samples = [
            "Monika",
            "moni aff",
            "9lives",
            "",
            "héllo wörld",
            "class",
            "VN",
            "a-b.c",
            "___",
        ];
        let shape = Regex::new(r"^[a-z_][a-z0-9_]*$").unwrap();
        for sample in samples {
            let once = sanitize_identifier(sample);
            assert!(shape.is_match(&once), "{:?} -> {:?}", sample, once);
            assert_eq!(sanitize_identifier(&once), once, "not idempotent for {:?}", sample);
        }
        assert_eq!(sanitize_identifier("Monika"), "monika");
        assert_eq!(sanitize_identifier("9lives"), "my_9lives");
        assert_eq!(sanitize_identifier(""), "unnamed");
        assert_eq!(sanitize_identifier("class"), "class_");
        assert_eq!(sanitize_identifier("a-b.c"), "a_b_c");
    }

    #[test]
    fn quoted_literals_read_back_exactly() {
        let samples = [
            "",
            "Hello there!",
            "She said \"hi\"",
            "it's",
            "back\\slash",
            "line one\nline two\r\n",
            "tab\there",
            "bell\u{7}",
            "日本語 テキスト",
            "trailing backslash \\",
        ];
        for sample in samples {
            for quote in [Quote::Double, Quote::Single] {
                let literal = quote_literal_with(sample, quote);
                assert_eq!(
                    parse_string_literal(&literal).as_deref(),
                    Some(sample),
                    "literal {}",
                    literal
                );
            }
        }
    }

    #[test]
    fn labels_drop_invalid_characters() {
        assert_eq!(strip_label("knows monika!"), "knowsmonika");
        assert_eq!(strip_label("  start "), "start");
        assert_eq!(strip_label("???"), "");
    }

    #[test]
    fn values_are_rendered_as_safe_arguments() {
        assert_eq!(render_value("5"), "5");
        assert_eq!(render_value("-2.5"), "-2.5");
        assert_eq!(render_value("True"), "True");
        assert_eq!(render_value("\"happy\""), "\"happy\"");
        assert_eq!(render_value("'happy'"), "\"happy\"");
        assert_eq!(render_value("happy"), "\"happy\"");
        assert_eq!(render_value("1); import os"), "\"1); import os\"");
        assert_eq!(render_value("  "), "None");
        assert_eq!(render_value("007"), "\"007\"");
        assert_eq!(render_value("-01"), "\"-01\"");
        assert_eq!(render_value("0"), "0");
        assert_eq!(render_value("07.5"), "07.5");
        assert_eq!(render_value("1e3"), "1e3");
    }
}
