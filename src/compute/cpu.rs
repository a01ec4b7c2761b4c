//! Host fallback path: the same [`LiteralMatcher`]/[`RegexMatcher`] used
//! whenever the backend policy picks a host variant, wrapped behind one
//! function so the executor doesn't care which backend ran.

use crate::command::{PatternKind, SubstFlags};
use crate::error::RegexError;
use crate::literal::{LiteralMatcher, MatchRecord};
use crate::regex::matcher::RegexMatcher;
use crate::regex::Regex;

pub fn find_matches(
    text: &[u8],
    pattern: &[u8],
    kind: PatternKind,
    flags: SubstFlags,
) -> Result<Vec<MatchRecord>, RegexError> {
    match kind {
        PatternKind::Literal => {
            let matcher = LiteralMatcher::new(pattern, flags.case_insensitive);
            Ok(matcher.find_all(text, flags))
        }
        PatternKind::RegexBasic | PatternKind::RegexExtended => {
            let regex = Regex::compile(pattern, kind, flags.case_insensitive)?;
            let matcher = RegexMatcher::new(&regex.nfa);
            Ok(matcher.find_all(text, flags))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_literal_patterns_to_the_bmh_matcher() {
        let got = find_matches(b"aXaXa", b"a", PatternKind::Literal, SubstFlags { global: true, ..Default::default() }).unwrap();
        assert_eq!(got.len(), 3);
    }

    #[test]
    fn dispatches_regex_patterns_to_the_nfa_matcher() {
        let got = find_matches(b"aaab", b"a+b", PatternKind::RegexExtended, SubstFlags::default()).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].start, 0);
        assert_eq!(got[0].end, 4);
    }
}
