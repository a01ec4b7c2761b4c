//! Command executor (§4.8): each command in the pipeline consumes the
//! *whole buffer* produced by the previous command and produces a whole
//! buffer in turn — B_out becomes the next command's B_in. A command's
//! own line numbering, ranges, and `$` are resolved against the line
//! count of the buffer it receives, not the original input, so a
//! command that changes the line count (chiefly `d`) is fully visible
//! to every command after it. This is pure functional composition: no
//! command observes another's intermediate state.

use crate::buffer::ByteBuffer;
use crate::command::{Address, Command, Kind, LineRef};
use crate::compute::{self, backend::BackendPreference, cpu};
use crate::error::RegexError;
use crate::replace;

#[derive(Debug, Clone, Copy)]
pub struct ExecutionOptions {
    /// `-n`/`--quiet`/`--silent`: suppress the automatic emission of the
    /// final buffer, leaving only explicit `p` commands to produce
    /// output.
    pub suppress_auto_print: bool,
    pub backend: BackendPreference,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        ExecutionOptions { suppress_auto_print: false, backend: BackendPreference::Auto }
    }
}

/// One line of the buffer threaded between commands: content plus
/// whether it was `\n`-terminated in the buffer it came from.
struct Line {
    bytes: Vec<u8>,
    has_newline: bool,
}

pub fn run(commands: &[Command], input: &ByteBuffer, opts: ExecutionOptions) -> Result<Vec<u8>, RegexError> {
    let mut lines: Vec<Line> = (1..=input.line_count())
        .map(|n| Line {
            bytes: input.line_bytes(n).unwrap_or(&[]).to_vec(),
            has_newline: input.line_has_newline(n),
        })
        .collect();

    let mut printed = Vec::new();
    for command in commands {
        lines = apply_command(command, lines, opts, &mut printed)?;
    }

    let mut out = printed;
    if !opts.suppress_auto_print {
        out.reserve(lines.iter().map(|l| l.bytes.len() + 1).sum());
        for line in &lines {
            out.extend_from_slice(&line.bytes);
            if line.has_newline {
                out.push(b'\n');
            }
        }
    }
    Ok(out)
}

/// Applies one command to the whole of `lines`, returning the buffer the
/// next command will see. `last_line` (for `$` and open-ended ranges) is
/// recomputed from `lines.len()` here, not carried over from the
/// original input.
fn apply_command(command: &Command, lines: Vec<Line>, opts: ExecutionOptions, printed: &mut Vec<u8>) -> Result<Vec<Line>, RegexError> {
    let last_line = lines.len();
    match &command.kind {
        Kind::Substitute { pattern, pattern_kind, replacement, flags } => {
            let mut out = Vec::with_capacity(lines.len());
            for (i, mut line) in lines.into_iter().enumerate() {
                if address_matches(&command.address, i + 1, last_line, &line.bytes)? {
                    let matches = compute::find_matches(&line.bytes, pattern, *pattern_kind, *flags, opts.backend)?;
                    if !matches.is_empty() {
                        line.bytes = apply_substitution(&line.bytes, &matches, replacement);
                    }
                }
                out.push(line);
            }
            Ok(out)
        }
        Kind::Delete => {
            let mut out = Vec::with_capacity(lines.len());
            for (i, line) in lines.into_iter().enumerate() {
                if !address_matches(&command.address, i + 1, last_line, &line.bytes)? {
                    out.push(line);
                }
            }
            Ok(out)
        }
        Kind::Print => {
            for (i, line) in lines.iter().enumerate() {
                if address_matches(&command.address, i + 1, last_line, &line.bytes)? {
                    printed.extend_from_slice(&line.bytes);
                    printed.push(b'\n');
                }
            }
            Ok(lines)
        }
        Kind::Transliterate { from, to } => {
            let mut out = Vec::with_capacity(lines.len());
            for (i, mut line) in lines.into_iter().enumerate() {
                if address_matches(&command.address, i + 1, last_line, &line.bytes)? {
                    transliterate_in_place(&mut line.bytes, from, to);
                }
                out.push(line);
            }
            Ok(out)
        }
    }
}

fn address_matches(address: &Address, line_no: usize, last_line: usize, pattern_space: &[u8]) -> Result<bool, RegexError> {
    Ok(match address {
        Address::Absent => true,
        Address::Line(n) => line_no == *n,
        Address::Last => line_no == last_line,
        Address::Range(start, end) => {
            let lo = resolve_line_ref(start, last_line);
            let hi = resolve_line_ref(end, last_line);
            line_no >= lo && line_no <= hi
        }
        Address::Pattern { pattern, kind } => {
            !cpu::find_matches(pattern_space, pattern, *kind, Default::default())?.is_empty()
        }
    })
}

fn resolve_line_ref(line_ref: &LineRef, last_line: usize) -> usize {
    match line_ref {
        LineRef::Number(n) => *n,
        LineRef::Last => last_line,
    }
}

fn apply_substitution(pattern_space: &[u8], matches: &[crate::literal::MatchRecord], replacement: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(pattern_space.len());
    let mut last = 0usize;
    for m in matches {
        out.extend_from_slice(&pattern_space[last..m.start]);
        replace::expand_into(&mut out, replacement, &pattern_space[m.start..m.end]);
        last = m.end;
    }
    out.extend_from_slice(&pattern_space[last..]);
    out
}

fn transliterate_in_place(pattern_space: &mut [u8], from: &[u8], to: &[u8]) {
    let mut table: [u8; 256] = [0; 256];
    for (i, slot) in table.iter_mut().enumerate() {
        *slot = i as u8;
    }
    for (&f, &t) in from.iter().zip(to.iter()) {
        table[f as usize] = t;
    }
    for b in pattern_space.iter_mut() {
        *b = table[*b as usize];
    }
}
