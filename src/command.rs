//! Typed command pipeline (§3): the parser's output and the executor's
//! input.

/// How a command's pattern bytes should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    Literal,
    RegexBasic,
    RegexExtended,
}

/// An address selecting which lines a command applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    /// Applies to every line.
    Absent,
    /// A single 1-based line number.
    Line(usize),
    /// An inclusive range; either end may be [`LineRef::Last`].
    Range(LineRef, LineRef),
    /// The last line (`$`).
    Last,
    /// Lines where `pattern` matches (the `/PAT/d` and `/PAT/p` forms).
    Pattern { pattern: Vec<u8>, kind: PatternKind },
}

/// One endpoint of an [`Address::Range`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRef {
    Number(usize),
    Last,
}

/// Substitution flags (§3). `first_only` collapses with a non-global
/// policy; `anchor_start` restricts matching to line-start positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubstFlags {
    pub global: bool,
    pub case_insensitive: bool,
    pub first_only: bool,
    pub anchor_start: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    Substitute {
        pattern: Vec<u8>,
        pattern_kind: PatternKind,
        replacement: Vec<u8>,
        flags: SubstFlags,
    },
    Delete,
    Print,
    Transliterate { from: Vec<u8>, to: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub address: Address,
    pub kind: Kind,
}

impl Command {
    /// Pattern used for address gating (distinct from a substitute
    /// command's own pattern): only [`Address::Pattern`] carries one.
    pub fn address_pattern(&self) -> Option<(&[u8], PatternKind)> {
        match &self.address {
            Address::Pattern { pattern, kind } => Some((pattern, *kind)),
            _ => None,
        }
    }
}
