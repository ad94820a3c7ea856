//! ShellCheck-style diagnostic pre-scan.
//!
//! Run once over the raw source text before tokenization proper. Catches
//! classes of mistakes that are cheapest to spot as a flat character scan:
//! shebang mistakes, Unicode characters that look like ASCII shell syntax
//! but aren't, and HTML entities pasted in from a web page. Each check
//! aborts tokenization with a positioned diagnostic, mirroring how
//! `LexerError` already reports `(line, column)`.
//!
//! Bracket-shape diagnostics (`SC1033` and friends) are reported by the
//! parser itself, where the token stream already distinguishes `]` from
//! `]]`; see `parser::parser::parse_conditional_command`.

use super::lexer::LexerError;

/// Unicode code points that are easy to mistake for ASCII shell syntax.
/// Each maps to the SC code and message bash would emit for that specific
/// lookalike.
const LOOKALIKES: &[(char, &str, &str)] = &[
    ('\u{2018}', "SC1015", "this is a unicode left single quote, not an ASCII apostrophe"),
    ('\u{2019}', "SC1015", "this is a unicode right single quote, not an ASCII apostrophe"),
    ('\u{201C}', "SC1016", "this is a unicode left double quote, not an ASCII quote"),
    ('\u{201D}', "SC1016", "this is a unicode right double quote, not an ASCII quote"),
    ('\u{2013}', "SC1017", "this is a unicode en-dash, not an ASCII hyphen"),
    ('\u{2014}', "SC1018", "this is a unicode em-dash, not an ASCII hyphen"),
    ('\u{00A0}', "SC1077", "this is a unicode non-breaking space, not a regular space"),
    ('\u{00B4}', "SC1100", "this is a unicode acute accent, not an ASCII backtick"),
];

const HTML_ENTITIES: &[&str] = &[
    "&amp;", "&lt;", "&gt;", "&quot;", "&#39;", "&apos;", "&nbsp;",
];

/// Run all pre-scan checks against the source. Returns the first
/// diagnostic found, if any; `None` means the source is clean and
/// tokenization should proceed normally.
pub fn prescan(source: &str) -> Option<LexerError> {
    if let Some(err) = check_shebang(source) {
        return Some(err);
    }
    check_char_scan(source)
}

fn check_shebang(source: &str) -> Option<LexerError> {
    if let Some(stripped) = source.strip_prefix('\u{feff}') {
        let _ = stripped;
        return Some(LexerError::with_code(
            "SC1082",
            "this file has a UTF-8 BOM; remove it so `#!` is recognized as a shebang",
            1,
            1,
        ));
    }

    let first_line = source.lines().next().unwrap_or("");

    if first_line.starts_with("!#") {
        return Some(LexerError::with_code(
            "SC1084",
            "the shebang is reversed: use `#!`, not `!#`",
            1,
            1,
        ));
    }
    if first_line.starts_with(' ') || first_line.starts_with('\t') {
        if first_line.trim_start().starts_with("#!") {
            return Some(LexerError::with_code(
                "SC1114",
                "the shebang must be the first thing in the file; remove leading whitespace",
                1,
                1,
            ));
        }
    }
    if first_line.starts_with("# !") {
        return Some(LexerError::with_code(
            "SC1115",
            "there is a space between `#` and `!` in the shebang",
            1,
            1,
        ));
    }
    if first_line.starts_with("#/") && !first_line.starts_with("#!") {
        return Some(LexerError::with_code(
            "SC1113",
            "the shebang is missing its `!`: use `#!/...`",
            1,
            1,
        ));
    }
    if first_line.starts_with("!/") {
        return Some(LexerError::with_code(
            "SC1104",
            "the shebang is missing its `#`: use `#!/...`",
            1,
            1,
        ));
    }
    None
}

fn check_char_scan(source: &str) -> Option<LexerError> {
    let mut line = 1usize;
    let mut col = 1usize;
    let chars: Vec<char> = source.chars().collect();
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];

        if c == '\n' {
            line += 1;
            col = 1;
            i += 1;
            continue;
        }

        if let Some(&(_, code, msg)) = LOOKALIKES.iter().find(|(lc, _, _)| *lc == c) {
            return Some(LexerError::with_code(code, msg, line, col));
        }

        if c == '&' {
            let rest: String = chars[i..].iter().take(8).collect();
            for entity in HTML_ENTITIES {
                if rest.starts_with(entity) {
                    return Some(LexerError::with_code(
                        "SC1109",
                        format!("found HTML entity `{}`; did you mean the literal character?", entity),
                        line,
                        col,
                    ));
                }
            }
        }

        col += 1;
        i += 1;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_curly_quote() {
        let err = prescan("echo \u{2018}hello\u{2019}").unwrap();
        assert_eq!(err.code, Some("SC1015"));
    }

    #[test]
    fn detects_html_entity() {
        let err = prescan("echo foo &amp; bar").unwrap();
        assert_eq!(err.code, Some("SC1109"));
    }

    #[test]
    fn detects_reversed_shebang() {
        let err = prescan("!#/bin/bash\necho hi").unwrap();
        assert_eq!(err.code, Some("SC1084"));
    }

    #[test]
    fn detects_missing_bang_shebang() {
        let err = prescan("#/bin/bash\necho hi").unwrap();
        assert_eq!(err.code, Some("SC1113"));
    }

    #[test]
    fn clean_script_has_no_diagnostics() {
        assert!(prescan("#!/bin/bash\necho hello world\n").is_none());
    }
}
