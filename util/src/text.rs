/// Escape a string into a single line, C style.
///
/// Newlines, tabs, backslashes and double quotes become two-character escape
/// sequences, so multi-paragraph text can live in a line-oriented file.
pub fn escape(text: &str) -> String {
    let mut ret = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' => ret.push_str("\\n"),
            '\r' => ret.push_str("\\r"),
            '\t' => ret.push_str("\\t"),
            '\\' => ret.push_str("\\\\"),
            '"' => ret.push_str("\\\""),
            c => ret.push(c),
        }
    }
    ret
}

/// Undo `escape`. An unrecognized escape sequence yields the escaped
/// character itself, a trailing lone backslash is kept as is.
pub fn unescape(text: &str) -> String {
    let mut ret = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            ret.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => ret.push('\n'),
            Some('r') => ret.push('\r'),
            Some('t') => ret.push('\t'),
            Some(c) => ret.push(c),
            None => ret.push('\\'),
        }
    }
    ret
}
