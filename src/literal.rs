//! Boyer-Moore-Horspool literal matcher with wide-vector verification
//! (§4.2).
//!
//! The skip table drives candidate selection; once a candidate position
//! survives the skip heuristic, verification compares 16 bytes at a time
//! against the pattern using a `u128` load so the comparison is a single
//! integer equality instead of a byte loop for the common case of short
//! patterns fully covered by one chunk.

use crate::command::SubstFlags;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchRecord {
    pub start: usize,
    pub end: usize,
    /// 0-based line number, per the crate-wide convention for match
    /// records (§3).
    pub line: usize,
}

const VECTOR_WIDTH: usize = 16;

/// A compiled Boyer-Moore-Horspool searcher over `pattern`.
pub struct LiteralMatcher<'p> {
    pattern: &'p [u8],
    case_insensitive: bool,
    skip: [usize; 256],
}

impl<'p> LiteralMatcher<'p> {
    pub fn new(pattern: &'p [u8], case_insensitive: bool) -> Self {
        let m = pattern.len();
        let mut skip = [m.max(1); 256];
        if m > 0 {
            for (i, &b) in pattern[..m - 1].iter().enumerate() {
                let dist = m - 1 - i;
                skip[b as usize] = dist;
                if case_insensitive {
                    skip[swap_case(b) as usize] = dist;
                }
            }
        }
        LiteralMatcher { pattern, case_insensitive, skip }
    }

    /// Find every match of `self.pattern` in `text`, honoring the
    /// traversal policy in §4.2: per-line first-match gating, global
    /// advancement, and anchor-at-line-start.
    pub fn find_all(&self, text: &[u8], flags: SubstFlags) -> Vec<MatchRecord> {
        let mut out = Vec::new();
        let m = self.pattern.len();
        if m == 0 {
            return self.find_all_empty(text, flags);
        }
        if m > text.len() {
            return out;
        }

        let mut line = 0usize;
        let mut line_start = 0usize;
        let mut pos = 0usize;
        // Index of the next '\n' at or after `pos`, recomputed lazily.
        let mut next_nl = memchr::memchr(b'\n', text);

        while pos + m <= text.len() {
            if flags.anchor_start && pos != line_start {
                // Skip straight to the next line start.
                match next_nl {
                    Some(nl) if nl < pos => {
                        next_nl = memchr::memchr(b'\n', &text[pos..]).map(|i| i + pos);
                    }
                    _ => {}
                }
                match next_nl {
                    Some(nl) => {
                        pos = nl + 1;
                        line += 1;
                        line_start = pos;
                        next_nl = memchr::memchr(b'\n', &text[pos..]).map(|i| i + pos);
                        continue;
                    }
                    None => break,
                }
            }

            if self.matches_at(text, pos) {
                let rec_line = line_of(text, pos, &mut line, &mut line_start, &mut next_nl);
                out.push(MatchRecord { start: pos, end: pos + m, line: rec_line });

                if flags.first_only {
                    // first_only collapses with the non-global policy
                    // even when global is also set (§4.2).
                    advance_to_next_line(text, pos, &mut pos, &mut line, &mut line_start, &mut next_nl);
                    continue;
                }
                if flags.global {
                    pos += m;
                    while let Some(nl) = next_nl {
                        if nl < pos {
                            line += 1;
                            line_start = nl + 1;
                            next_nl = memchr::memchr(b'\n', &text[line_start..]).map(|i| i + line_start);
                        } else {
                            break;
                        }
                    }
                    continue;
                }
                // Neither global nor first_only set: behaves like
                // first-only (at most one match per line) per §4.2's
                // "this encodes first per line" note.
                advance_to_next_line(text, pos, &mut pos, &mut line, &mut line_start, &mut next_nl);
                continue;
            }

            let bad = text[pos + m - 1];
            let key = if self.case_insensitive { to_lower(bad) } else { bad };
            pos += self.skip[key as usize];
        }
        out
    }

    fn find_all_empty(&self, _text: &[u8], _flags: SubstFlags) -> Vec<MatchRecord> {
        // The parser rejects an empty pattern for `substitute` (§3's
        // invariant), so this path only guards against a matcher built
        // directly with one: report a single zero-length match at the
        // start, same as the regex engine's empty-pattern rule (§8
        // invariant 5), leaving "advance at least one byte" to the
        // executor.
        vec![MatchRecord { start: 0, end: 0, line: 0 }]
    }

    fn matches_at(&self, text: &[u8], pos: usize) -> bool {
        let m = self.pattern.len();
        let window = &text[pos..pos + m];
        let mut chunks = m / VECTOR_WIDTH;
        let mut off = 0;
        while chunks > 0 {
            let a: [u8; VECTOR_WIDTH] = window[off..off + VECTOR_WIDTH].try_into().unwrap();
            let b: [u8; VECTOR_WIDTH] = self.pattern[off..off + VECTOR_WIDTH].try_into().unwrap();
            if !chunk_eq(a, b, self.case_insensitive) {
                return false;
            }
            off += VECTOR_WIDTH;
            chunks -= 1;
        }
        for i in off..m {
            let (a, b) = (window[i], self.pattern[i]);
            let eq = if self.case_insensitive { to_lower(a) == to_lower(b) } else { a == b };
            if !eq {
                return false;
            }
        }
        true
    }
}

#[inline]
fn chunk_eq(a: [u8; VECTOR_WIDTH], b: [u8; VECTOR_WIDTH], case_insensitive: bool) -> bool {
    if case_insensitive {
        let mut folded_a = a;
        let mut folded_b = b;
        for i in 0..VECTOR_WIDTH {
            folded_a[i] = to_lower(a[i]);
            folded_b[i] = to_lower(b[i]);
        }
        u128::from_ne_bytes(folded_a) == u128::from_ne_bytes(folded_b)
    } else {
        u128::from_ne_bytes(a) == u128::from_ne_bytes(b)
    }
}

#[inline]
fn to_lower(b: u8) -> u8 {
    if b.is_ascii_uppercase() {
        b + 32
    } else {
        b
    }
}

#[inline]
fn swap_case(b: u8) -> u8 {
    if b.is_ascii_uppercase() {
        b + 32
    } else if b.is_ascii_lowercase() {
        b - 32
    } else {
        b
    }
}

fn line_of(
    text: &[u8],
    pos: usize,
    line: &mut usize,
    line_start: &mut usize,
    next_nl: &mut Option<usize>,
) -> usize {
    while let Some(nl) = *next_nl {
        if nl < pos {
            *line += 1;
            *line_start = nl + 1;
            *next_nl = memchr::memchr(b'\n', &text[*line_start..]).map(|i| i + *line_start);
        } else {
            break;
        }
    }
    *line
}

fn advance_to_next_line(
    text: &[u8],
    _pos: usize,
    pos_out: &mut usize,
    line: &mut usize,
    line_start: &mut usize,
    next_nl: &mut Option<usize>,
) {
    match *next_nl {
        Some(nl) => {
            *pos_out = nl + 1;
            *line += 1;
            *line_start = *pos_out;
            *next_nl = memchr::memchr(b'\n', &text[*pos_out..]).map(|i| i + *pos_out);
        }
        None => *pos_out = text.len() + 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(text: &str, pat: &str, flags: SubstFlags) -> Vec<(usize, usize, usize)> {
        let m = LiteralMatcher::new(pat.as_bytes(), flags.case_insensitive);
        m.find_all(text.as_bytes(), flags)
            .into_iter()
            .map(|r| (r.start, r.end, r.line))
            .collect()
    }

    #[test]
    fn global_finds_all_nonoverlapping() {
        let flags = SubstFlags { global: true, ..Default::default() };
        assert_eq!(find("aaa", "a", flags), vec![(0, 1, 0), (1, 2, 0), (2, 3, 0)]);
    }

    #[test]
    fn non_global_finds_first_per_line() {
        let flags = SubstFlags::default();
        assert_eq!(find("foo\nfoo\n", "foo", flags), vec![(0, 3, 0), (4, 7, 1)]);
    }

    #[test]
    fn case_insensitive_matches_mixed_case() {
        let flags = SubstFlags { global: true, case_insensitive: true, ..Default::default() };
        assert_eq!(find("Hello HELLO hello", "hello", flags).len(), 3);
    }

    #[test]
    fn pattern_longer_than_text_yields_no_matches() {
        let flags = SubstFlags { global: true, ..Default::default() };
        assert!(find("hi", "hello", flags).is_empty());
    }

    #[test]
    fn match_at_start_and_end_both_reported() {
        let flags = SubstFlags { global: true, ..Default::default() };
        let got = find("aXXXXa", "a", flags);
        assert_eq!(got.first().unwrap().0, 0);
        assert_eq!(got.last().unwrap().0, 5);
    }

    #[test]
    fn anchor_start_only_matches_line_heads() {
        let flags = SubstFlags { global: true, anchor_start: true, ..Default::default() };
        assert_eq!(find("foobar\nbarfoo\n", "foo", flags), vec![(0, 3, 0)]);
    }
}
