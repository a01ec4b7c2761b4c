//! The regular-expression engine (§4.3-§4.5): a Thompson NFA compiler for
//! both basic and extended dialects, a host matcher, and a flat encoding
//! consumable by the GPU dispatch layer.

pub mod device;
pub mod matcher;
pub mod nfa;
pub mod syntax;

use crate::command::PatternKind;
use crate::error::RegexError;
use nfa::Nfa;

/// A compiled regular expression, ready for the host matcher or for
/// flattening into a device encoding.
pub struct Regex {
    pub nfa: Nfa,
}

impl Regex {
    pub fn compile(pattern: &[u8], kind: PatternKind, case_insensitive: bool) -> Result<Self, RegexError> {
        let extended = matches!(kind, PatternKind::RegexExtended);
        let ast = syntax::parse(pattern, extended)?;
        let nfa = nfa::compile(&ast, case_insensitive)?;
        Ok(Regex { nfa })
    }
}
