//! String-quoting collaborator (§4.7): renders a JS string literal that the
//! target parser can re-read.

use std::fmt::Write as _;

/// Writes a JS string-literal form of `s`, picking `'...'` unless the string
/// contains `'` but not `"` (in which case `"..."`).
///
/// Escapes: `\\`, `\n`, `\r`, `\t`, the chosen quote character, and any other
/// control character as `\xNN` (or `\uNNNN` above one byte).
pub fn quote_js_string(s: &str) -> String {
    let has_single = s.contains('\'');
    let has_double = s.contains('"');
    let quote = if has_single && !has_double { '"' } else { '\'' };

    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || (c as u32) == 0x7f => {
                write!(out, "\\x{:02x}", c as u32).expect("write! to String never fails");
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_string_uses_single_quotes() {
        assert_eq!(quote_js_string("hello"), "'hello'");
    }

    #[test]
    fn string_with_single_quote_switches_to_double() {
        assert_eq!(quote_js_string("it's"), "\"it's\"");
    }

    #[test]
    fn string_with_both_quote_kinds_keeps_single_and_escapes() {
        assert_eq!(quote_js_string("it's \"ok\""), "'it\\'s \"ok\"'");
    }

    #[test]
    fn control_characters_are_escaped() {
        assert_eq!(quote_js_string("a\nb\tc"), "'a\\nb\\tc'");
        assert_eq!(quote_js_string("\u{1}"), "'\\x01'");
    }
}
