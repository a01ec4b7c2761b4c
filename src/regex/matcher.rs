//! Host NFA simulation (§4.4): a single continuous forward scan per line
//! that seeds the epsilon closure with the start state at every byte
//! position (unless the search is anchored to one offset) rather than
//! restarting a fresh simulation per candidate start, so one line is
//! scanned once instead of once per start position. Leftmost-longest (not
//! leftmost-first) match semantics: the smallest start that ever reaches
//! an accept wins outright, and among threads sharing that start the
//! longest reachable end wins.
//!
//! Matching happens per line (the sed "pattern space"), so `^`/`$`/`\b`
//! anchor to line boundaries rather than to embedded newlines — the same
//! boundary [`crate::literal`] uses for its own traversal.

use super::nfa::{Nfa, State};
use crate::command::SubstFlags;
use crate::literal::MatchRecord;

pub struct RegexMatcher<'n> {
    nfa: &'n Nfa,
}

/// A live byte-consuming state, tagged with the position it started
/// matching from.
#[derive(Clone, Copy)]
struct Thread {
    state: usize,
    start: usize,
}

impl<'n> RegexMatcher<'n> {
    pub fn new(nfa: &'n Nfa) -> Self {
        RegexMatcher { nfa }
    }

    pub fn find_all(&self, text: &[u8], flags: SubstFlags) -> Vec<MatchRecord> {
        let mut out = Vec::new();
        let mut line_start = 0usize;
        let mut line_no = 0usize;
        loop {
            let nl = memchr::memchr(b'\n', &text[line_start..]).map(|i| i + line_start);
            let line_end = nl.unwrap_or(text.len());
            let line = &text[line_start..line_end];
            self.find_in_line(line, line_start, line_no, flags, &mut out);
            line_no += 1;
            match nl {
                Some(n) => line_start = n + 1,
                None => break,
            }
        }
        out
    }

    fn find_in_line(
        &self,
        line: &[u8],
        line_offset: usize,
        line_no: usize,
        flags: SubstFlags,
        out: &mut Vec<MatchRecord>,
    ) {
        let mut search_from = 0usize;
        loop {
            if search_from > line.len() {
                break;
            }
            match self.scan_from(line, search_from, flags.anchor_start) {
                Some((start, end)) => {
                    out.push(MatchRecord { start: line_offset + start, end: line_offset + end, line: line_no });
                    if flags.first_only {
                        break;
                    }
                    if flags.global {
                        search_from = if end > start { end } else { start + 1 };
                        if flags.anchor_start {
                            break;
                        }
                        continue;
                    }
                    break;
                }
                None => break,
            }
        }
    }

    /// Scans forward from `from` to the end of `line` in one pass, merging
    /// every candidate start into a single running thread list. Returns the
    /// leftmost-longest match reachable from any start at or after `from`,
    /// or `None`. When `anchor_start` is set, only `from` itself is tried.
    fn scan_from(&self, line: &[u8], from: usize, anchor_start: bool) -> Option<(usize, usize)> {
        let mut best: Option<(usize, usize)> = None;
        let mut current: Vec<Thread> = Vec::new();
        let mut visited = vec![false; self.nfa.states.len()];
        self.add_state(self.nfa.start, from, line, from, &mut visited, &mut current, &mut best);

        let mut pos = from;
        while pos < line.len() {
            if current.is_empty() {
                break;
            }
            let byte = line[pos];
            let mut next = Vec::new();
            let mut next_visited = vec![false; self.nfa.states.len()];
            for t in &current {
                if let Some((best_start, _)) = best {
                    if t.start > best_start {
                        continue; // can never outrank the already-committed start
                    }
                }
                match &self.nfa.states[t.state] {
                    State::Char(spec, nxt) => {
                        if spec.matches(byte) {
                            self.add_state(*nxt, pos + 1, line, t.start, &mut next_visited, &mut next, &mut best);
                        }
                    }
                    State::Any(nxt) => {
                        self.add_state(*nxt, pos + 1, line, t.start, &mut next_visited, &mut next, &mut best);
                    }
                    _ => {}
                }
            }
            if best.is_none() && !anchor_start {
                self.add_state(self.nfa.start, pos + 1, line, pos + 1, &mut next_visited, &mut next, &mut best);
            }
            current = next;
            pos += 1;
        }
        best
    }

    /// Follows epsilon transitions from `idx`, evaluating zero-width
    /// assertions against `pos`/`line` and collecting byte-consuming
    /// states (tagged with `start`) into `out`. Whenever `Match` becomes
    /// reachable, updates `best` under leftmost-longest priority: a
    /// smaller `start` always overrides a larger one outright, and a tied
    /// `start` keeps the larger `pos` (the longer match).
    #[allow(clippy::too_many_arguments)]
    fn add_state(
        &self,
        idx: usize,
        pos: usize,
        line: &[u8],
        start: usize,
        visited: &mut [bool],
        out: &mut Vec<Thread>,
        best: &mut Option<(usize, usize)>,
    ) {
        if idx == usize::MAX || visited[idx] {
            return;
        }
        visited[idx] = true;
        match &self.nfa.states[idx] {
            State::Split(a, b) => {
                self.add_state(*a, pos, line, start, visited, out, best);
                self.add_state(*b, pos, line, start, visited, out, best);
            }
            State::StartAnchor(next) => {
                if pos == 0 {
                    self.add_state(*next, pos, line, start, visited, out, best);
                }
            }
            State::EndAnchor(next) => {
                if pos == line.len() {
                    self.add_state(*next, pos, line, start, visited, out, best);
                }
            }
            State::WordBoundary(next) => {
                let before = pos > 0 && is_word_byte(line[pos - 1]);
                let after = pos < line.len() && is_word_byte(line[pos]);
                if before != after {
                    self.add_state(*next, pos, line, start, visited, out, best);
                }
            }
            State::Match => match *best {
                Some((best_start, _)) if start < best_start => {
                    *best = Some((start, pos));
                }
                Some((best_start, best_end)) if start == best_start => {
                    if pos > best_end {
                        *best = Some((start, pos));
                    }
                }
                Some(_) => {} // a strictly earlier start already won
                None => *best = Some((start, pos)),
            },
            State::Char(..) | State::Any(_) => out.push(Thread { state: idx, start }),
        }
    }
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::nfa::compile;
    use super::super::syntax::parse;

    fn matches(pattern: &[u8], extended: bool, ci: bool, text: &str, flags: SubstFlags) -> Vec<(usize, usize, usize)> {
        let ast = parse(pattern, extended).unwrap();
        let nfa = compile(&ast, ci).unwrap();
        let m = RegexMatcher::new(&nfa);
        m.find_all(text.as_bytes(), flags)
            .into_iter()
            .map(|r| (r.start, r.end, r.line))
            .collect()
    }

    #[test]
    fn literal_via_regex_engine() {
        let flags = SubstFlags { global: true, ..Default::default() };
        assert_eq!(matches(b"ab", true, false, "xabxab", flags), vec![(1, 3, 0), (4, 6, 0)]);
    }

    #[test]
    fn star_matches_zero_or_more() {
        let flags = SubstFlags::default();
        assert_eq!(matches(b"ab*c", true, false, "ac xx abbbc", flags), vec![(0, 2, 0)]);
    }

    #[test]
    fn leftmost_longest_over_alternation() {
        let flags = SubstFlags::default();
        assert_eq!(matches(b"a|ab", true, false, "ab", flags), vec![(0, 2, 0)]);
    }

    #[test]
    fn start_and_end_anchors_bind_to_line() {
        let flags = SubstFlags { global: true, ..Default::default() };
        assert_eq!(matches(b"^ab$", true, false, "ab\nxab\nab", flags), vec![(0, 2, 0), (6, 8, 2)]);
    }

    #[test]
    fn word_boundary_excludes_substring_hits() {
        let flags = SubstFlags { global: true, ..Default::default() };
        assert_eq!(matches(br"\bcat\b", true, false, "cat concatenate cat", flags), vec![(0, 3, 0), (16, 19, 0)]);
    }

    #[test]
    fn case_insensitive_class_widens_both_cases() {
        let flags = SubstFlags { global: true, case_insensitive: true, ..Default::default() };
        assert_eq!(matches(b"[a-c]+", true, true, "ABC abc", flags).len(), 2);
    }

    #[test]
    fn first_only_collapses_with_global() {
        let flags = SubstFlags { global: true, first_only: true, ..Default::default() };
        assert_eq!(matches(b"a", true, false, "aaa", flags), vec![(0, 1, 0)]);
    }

    #[test]
    fn no_match_returns_empty() {
        let flags = SubstFlags::default();
        assert!(matches(b"zzz", true, false, "abc", flags).is_empty());
    }

    #[test]
    fn global_matches_every_occurrence_across_a_long_line() {
        let mut text = String::new();
        for i in 0..500 {
            text.push_str(if i % 7 == 0 { "needle " } else { "hay " });
        }
        let flags = SubstFlags { global: true, ..Default::default() };
        let got = matches(b"needle", true, false, &text, flags);
        assert_eq!(got.len(), (0..500).filter(|i| i % 7 == 0).count());
    }
}
