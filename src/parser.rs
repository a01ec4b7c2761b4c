//! Script parser (§4.1): turns one or more expressions into a typed
//! [`Command`] pipeline.

use crate::command::{Address, Command, Kind, LineRef, PatternKind, SubstFlags};
use crate::error::ScriptError;

/// Parse a full script — one or more expressions, newline-separated —
/// into a command pipeline, in encounter order.
pub fn parse_script(script: &str) -> Result<Vec<Command>, ScriptError> {
    parse_script_with_dialect(script, false)
}

/// Same as [`parse_script`], but `default_extended` picks the regex
/// dialect for any substitute expression that doesn't set its own `E`
/// flag — the effect of the CLI's `-E`/`-r` switch (§6).
pub fn parse_script_with_dialect(script: &str, default_extended: bool) -> Result<Vec<Command>, ScriptError> {
    let mut commands = Vec::new();
    for expr in script.split('\n') {
        let expr = expr.trim_matches('\r');
        if expr.trim().is_empty() {
            continue;
        }
        commands.push(parse_expression_with_dialect(expr, default_extended)?);
    }
    Ok(commands)
}

/// Parse one expression (one line of script, or one `-e` argument).
pub fn parse_expression(expr: &str) -> Result<Command, ScriptError> {
    parse_expression_with_dialect(expr, false)
}

pub fn parse_expression_with_dialect(expr: &str, default_extended: bool) -> Result<Command, ScriptError> {
    let bytes = expr.as_bytes();
    let mut i = 0;
    let (address, addr_given) = parse_address(bytes, &mut i)?;

    if i >= bytes.len() {
        return Err(ScriptError::MalformedExpression(expr.to_string()));
    }

    match bytes[i] {
        b's' => {
            i += 1;
            parse_substitute(bytes, i, expr, address, default_extended)
        }
        b'y' => {
            i += 1;
            parse_transliterate(bytes, i, expr, address)
        }
        b'/' => parse_slash_form(bytes, i, expr, address, default_extended),
        b'd' if addr_given && i + 1 == bytes.len() => {
            Ok(Command { address, kind: Kind::Delete })
        }
        b'p' if addr_given && i + 1 == bytes.len() => {
            Ok(Command { address, kind: Kind::Print })
        }
        b'd' | b'p' if !addr_given => Err(ScriptError::EmptyPatternWithNoAddress),
        _ => Err(ScriptError::MalformedExpression(expr.to_string())),
    }
}

fn parse_address(bytes: &[u8], i: &mut usize) -> Result<(Address, bool), ScriptError> {
    let first = parse_line_ref(bytes, i);
    let Some(first) = first else {
        return Ok((Address::Absent, false));
    };
    if *i < bytes.len() && bytes[*i] == b',' {
        *i += 1;
        let second = parse_line_ref(bytes, i)
            .ok_or_else(|| ScriptError::MalformedExpression(lossy(bytes)))?;
        let addr = match (first, second) {
            (LineRef::Number(a), LineRef::Number(b)) if a > b => {
                return Err(ScriptError::MalformedExpression(lossy(bytes)));
            }
            (a, b) => Address::Range(a, b),
        };
        return Ok((addr, true));
    }
    let addr = match first {
        LineRef::Number(n) => Address::Line(n),
        LineRef::Last => Address::Last,
    };
    Ok((addr, true))
}

fn parse_line_ref(bytes: &[u8], i: &mut usize) -> Option<LineRef> {
    if *i < bytes.len() && bytes[*i] == b'$' {
        *i += 1;
        return Some(LineRef::Last);
    }
    let start = *i;
    while *i < bytes.len() && bytes[*i].is_ascii_digit() {
        *i += 1;
    }
    if *i == start {
        return None;
    }
    let n: usize = std::str::from_utf8(&bytes[start..*i]).unwrap().parse().ok()?;
    Some(LineRef::Number(n))
}

fn parse_substitute(
    bytes: &[u8],
    mut i: usize,
    expr: &str,
    address: Address,
    default_extended: bool,
) -> Result<Command, ScriptError> {
    if i >= bytes.len() {
        return Err(ScriptError::MalformedExpression(expr.to_string()));
    }
    let delim = bytes[i];
    i += 1;

    let (pattern, next) = extract_delimited(bytes, i, delim)
        .ok_or_else(|| ScriptError::MalformedExpression(expr.to_string()))?;
    i = next + 1;

    let (replacement, next) = extract_replacement_field(bytes, i, delim)
        .ok_or_else(|| ScriptError::MalformedExpression(expr.to_string()))?;
    i = next + 1;

    if pattern.is_empty() {
        return Err(ScriptError::MalformedExpression(expr.to_string()));
    }

    let mut flags = SubstFlags::default();
    let mut extended = default_extended;
    while i < bytes.len() {
        match bytes[i] {
            b'g' => flags.global = true,
            b'i' => flags.case_insensitive = true,
            b'I' => flags.case_insensitive = true,
            b'1' => flags.first_only = true,
            b'E' => extended = true,
            _ => {} // unknown flags are silently ignored (§4.1)
        }
        i += 1;
    }

    let pattern_kind = if extended { PatternKind::RegexExtended } else { PatternKind::RegexBasic };
    let pattern_kind = if looks_literal(&pattern) { PatternKind::Literal } else { pattern_kind };

    Ok(Command {
        address,
        kind: Kind::Substitute { pattern, pattern_kind, replacement, flags },
    })
}

/// A pattern with no unescaped regex metacharacter is treated as a
/// literal so it takes the fast BMH path (§2's literal-matcher share
/// exists precisely for this common case).
fn looks_literal(pattern: &[u8]) -> bool {
    let mut i = 0;
    while i < pattern.len() {
        match pattern[i] {
            b'\\' => i += 1, // escaped char, never meta on its own
            b'.' | b'*' | b'^' | b'$' | b'[' | b']' | b'+' | b'?' | b'|' | b'(' | b')' | b'{' | b'}' => {
                return false;
            }
            _ => {}
        }
        i += 1;
    }
    true
}

fn parse_transliterate(
    bytes: &[u8],
    mut i: usize,
    expr: &str,
    address: Address,
) -> Result<Command, ScriptError> {
    if i >= bytes.len() {
        return Err(ScriptError::MalformedExpression(expr.to_string()));
    }
    let delim = bytes[i];
    i += 1;

    let (from, next) = extract_delimited(bytes, i, delim)
        .ok_or_else(|| ScriptError::MalformedExpression(expr.to_string()))?;
    i = next + 1;

    let (to, next) = extract_delimited(bytes, i, delim)
        .ok_or_else(|| ScriptError::MalformedExpression(expr.to_string()))?;
    let _ = next;

    if from.len() != to.len() {
        return Err(ScriptError::MalformedTransliterate { src_len: from.len(), dst_len: to.len() });
    }

    Ok(Command { address, kind: Kind::Transliterate { from, to } })
}

fn parse_slash_form(
    bytes: &[u8],
    mut i: usize,
    expr: &str,
    _address: Address,
    default_extended: bool,
) -> Result<Command, ScriptError> {
    if i >= bytes.len() {
        return Err(ScriptError::MalformedExpression(expr.to_string()));
    }
    let delim = bytes[i];
    i += 1;
    let (pattern, next) = extract_delimited(bytes, i, delim)
        .ok_or_else(|| ScriptError::MalformedExpression(expr.to_string()))?;
    if pattern.is_empty() {
        return Err(ScriptError::EmptyPatternWithNoAddress);
    }
    i = next + 1;
    if i >= bytes.len() {
        return Err(ScriptError::MalformedExpression(expr.to_string()));
    }
    let regex_kind = if default_extended { PatternKind::RegexExtended } else { PatternKind::RegexBasic };
    let kind = if looks_literal(&pattern) { PatternKind::Literal } else { regex_kind };
    let pattern_address = Address::Pattern { pattern, kind };
    match bytes[i] {
        b'd' if i + 1 == bytes.len() => Ok(Command { address: pattern_address, kind: Kind::Delete }),
        b'p' if i + 1 == bytes.len() => Ok(Command { address: pattern_address, kind: Kind::Print }),
        _ => Err(ScriptError::MalformedExpression(expr.to_string())),
    }
}

/// Extract bytes up to the next unescaped `delim`, honoring the
/// two-character escapes from §4.1. Returns the unescaped pattern bytes
/// and the index of the terminating delimiter.
fn extract_delimited(bytes: &[u8], start: usize, delim: u8) -> Option<(Vec<u8>, usize)> {
    let mut out = Vec::new();
    let mut i = start;
    while i < bytes.len() {
        let b = bytes[i];
        if b == delim {
            return Some((out, i));
        }
        if b == b'\\' && i + 1 < bytes.len() {
            let next = bytes[i + 1];
            match next {
                b'n' => out.push(b'\n'),
                b't' => out.push(b'\t'),
                b'\\' => out.push(b'\\'),
                b'&' => out.push(b'&'),
                d if d == delim => out.push(delim),
                _ => {
                    out.push(b'\\');
                    out.push(next);
                }
            }
            i += 2;
            continue;
        }
        out.push(b);
        i += 1;
    }
    None
}

/// Extract the REPL field of an `s///` command up to the next unescaped
/// `delim`, resolving only the `\D` (escaped delimiter) case. Every other
/// backslash escape (`\n`, `\t`, `\\`, `\&`) is left untouched, raw, in the
/// returned bytes: [`crate::replace::expand_into`] is the single place that
/// resolves the replacement mini-language, and it needs the original
/// two-character escapes to tell `\&` (literal ampersand) apart from `&`
/// (the match) and `\\&` (a literal backslash followed by the match) from
/// `\&` — resolving them here first would destroy that distinction.
fn extract_replacement_field(bytes: &[u8], start: usize, delim: u8) -> Option<(Vec<u8>, usize)> {
    let mut out = Vec::new();
    let mut i = start;
    while i < bytes.len() {
        let b = bytes[i];
        if b == delim {
            return Some((out, i));
        }
        if b == b'\\' && i + 1 < bytes.len() {
            let next = bytes[i + 1];
            if next == delim {
                out.push(delim);
            } else {
                out.push(b'\\');
                out.push(next);
            }
            i += 2;
            continue;
        }
        out.push(b);
        i += 1;
    }
    None
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitute_basic() {
        let cmd = parse_expression("s/world/universe/").unwrap();
        assert_eq!(cmd.address, Address::Absent);
        match cmd.kind {
            Kind::Substitute { pattern, replacement, .. } => {
                assert_eq!(pattern, b"world");
                assert_eq!(replacement, b"universe");
            }
            _ => panic!("expected substitute"),
        }
    }

    #[test]
    fn substitute_with_address_and_flags() {
        let cmd = parse_expression("2s/line/LINE/g").unwrap();
        assert_eq!(cmd.address, Address::Line(2));
        match cmd.kind {
            Kind::Substitute { flags, .. } => assert!(flags.global),
            _ => panic!(),
        }
    }

    #[test]
    fn substitute_custom_delimiter() {
        let cmd = parse_expression("s#a/b#c#").unwrap();
        match cmd.kind {
            Kind::Substitute { pattern, replacement, .. } => {
                assert_eq!(pattern, b"a/b");
                assert_eq!(replacement, b"c");
            }
            _ => panic!(),
        }
    }

    #[test]
    fn range_address() {
        let cmd = parse_expression("2,4d").unwrap();
        assert_eq!(cmd.address, Address::Range(LineRef::Number(2), LineRef::Number(4)));
        assert_eq!(cmd.kind, Kind::Delete);
    }

    #[test]
    fn range_with_last() {
        let cmd = parse_expression("2,$d").unwrap();
        assert_eq!(cmd.address, Address::Range(LineRef::Number(2), LineRef::Last));
    }

    #[test]
    fn backwards_range_is_malformed() {
        assert!(parse_expression("4,2d").is_err());
    }

    #[test]
    fn slash_pattern_delete() {
        let cmd = parse_expression("/bar/d").unwrap();
        match cmd.address {
            Address::Pattern { pattern, .. } => assert_eq!(pattern, b"bar"),
            _ => panic!(),
        }
        assert_eq!(cmd.kind, Kind::Delete);
    }

    #[test]
    fn transliterate() {
        let cmd = parse_expression("y/abc/xyz/").unwrap();
        match cmd.kind {
            Kind::Transliterate { from, to } => {
                assert_eq!(from, b"abc");
                assert_eq!(to, b"xyz");
            }
            _ => panic!(),
        }
    }

    #[test]
    fn transliterate_length_mismatch_is_malformed() {
        let err = parse_expression("y/abc/xy/").unwrap_err();
        assert_eq!(err, ScriptError::MalformedTransliterate { src_len: 3, dst_len: 2 });
    }

    #[test]
    fn bare_delete_with_address() {
        let cmd = parse_expression("3d").unwrap();
        assert_eq!(cmd.address, Address::Line(3));
        assert_eq!(cmd.kind, Kind::Delete);
    }

    #[test]
    fn bare_delete_without_address_is_rejected() {
        assert!(parse_expression("d").is_err());
    }

    #[test]
    fn script_with_multiple_expressions() {
        let cmds = parse_script("s/foo/X/\ns/bar/Y/").unwrap();
        assert_eq!(cmds.len(), 2);
    }

    #[test]
    fn replacement_field_keeps_escapes_raw_for_expand_into() {
        // The REPL field is left with its backslash escapes intact; only
        // `replace::expand_into` resolves `\&` into a literal ampersand.
        let cmd = parse_expression(r"s/a/\&/").unwrap();
        match cmd.kind {
            Kind::Substitute { replacement, .. } => assert_eq!(replacement, br"\&"),
            _ => panic!(),
        }
    }

    #[test]
    fn replacement_field_resolves_escaped_delimiter_only() {
        let cmd = parse_expression(r"s#a#x\#y#").unwrap();
        match cmd.kind {
            Kind::Substitute { replacement, .. } => assert_eq!(replacement, b"x#y"),
            _ => panic!(),
        }
    }
}
