//! Thompson NFA construction (§4.4) from a parsed [`super::syntax::Ast`].
//!
//! Bounded repetition (`{n}`, `{n,m}`, `{n,}`) is desugared into
//! concatenations of `Star`/`Plus`/`Question` before construction, so the
//! Thompson compiler itself only ever handles the classic primitive set —
//! this is also what bounds the 256-state limit against a pathological
//! `{0,100000}`.

use super::syntax::{Ast, ClassSpec};
use crate::error::RegexError;

pub const MAX_STATES: usize = 256;

#[derive(Debug, Clone)]
pub enum State {
    /// Matches one byte against a (possibly negated) set of ranges.
    Char(ClassSpec, usize),
    Any(usize),
    Split(usize, usize),
    StartAnchor(usize),
    EndAnchor(usize),
    WordBoundary(usize),
    Match,
}

const NONE: usize = usize::MAX;

#[derive(Debug, Clone)]
pub struct Nfa {
    pub states: Vec<State>,
    pub start: usize,
}

struct Frag {
    start: usize,
    /// Dangling `(state, slot)` pairs still to be patched to the next
    /// fragment's start; slot 0 is the primary/only successor, slot 1 is
    /// a `Split`'s second arm.
    out: Vec<(usize, u8)>,
}

struct Builder {
    states: Vec<State>,
}

impl Builder {
    fn push(&mut self, state: State) -> Result<usize, RegexError> {
        if self.states.len() >= MAX_STATES {
            return Err(RegexError::StateLimitExceeded(self.states.len()));
        }
        self.states.push(state);
        Ok(self.states.len() - 1)
    }

    fn patch(&mut self, out: &[(usize, u8)], target: usize) {
        for &(idx, slot) in out {
            match (&mut self.states[idx], slot) {
                (State::Char(_, next), 0) => *next = target,
                (State::Any(next), 0) => *next = target,
                (State::StartAnchor(next), 0) => *next = target,
                (State::EndAnchor(next), 0) => *next = target,
                (State::WordBoundary(next), 0) => *next = target,
                (State::Split(next, _), 0) => *next = target,
                (State::Split(_, next), 1) => *next = target,
                _ => unreachable!("invalid patch slot"),
            }
        }
    }
}

pub fn compile(ast: &Ast, case_insensitive: bool) -> Result<Nfa, RegexError> {
    let desugared = desugar(ast);
    let mut b = Builder { states: Vec::new() };
    let frag = compile_ast(&mut b, &desugared, case_insensitive)?;
    let matched = b.push(State::Match)?;
    b.patch(&frag.out, matched);
    Ok(Nfa { states: b.states, start: frag.start })
}

/// Expand `Repeat` nodes into concatenations of the primitive repetition
/// operators; every other node is recursed into structurally unchanged.
fn desugar(ast: &Ast) -> Ast {
    match ast {
        Ast::Empty
        | Ast::Literal(_)
        | Ast::AnyByte
        | Ast::Class(_)
        | Ast::StartAnchor
        | Ast::EndAnchor
        | Ast::WordBoundary => ast.clone(),
        Ast::Concat(parts) => Ast::Concat(parts.iter().map(desugar).collect()),
        Ast::Alternate(branches) => Ast::Alternate(branches.iter().map(desugar).collect()),
        Ast::Star(inner) => Ast::Star(Box::new(desugar(inner))),
        Ast::Plus(inner) => Ast::Plus(Box::new(desugar(inner))),
        Ast::Question(inner) => Ast::Question(Box::new(desugar(inner))),
        Ast::Group(inner, idx) => Ast::Group(Box::new(desugar(inner)), *idx),
        Ast::Repeat(inner, lo, hi) => {
            let inner = desugar(inner);
            let mut parts: Vec<Ast> = (0..*lo).map(|_| inner.clone()).collect();
            match hi {
                Some(hi) => {
                    for _ in *lo..*hi {
                        parts.push(Ast::Question(Box::new(inner.clone())));
                    }
                }
                None if *lo == 0 => parts.push(Ast::Star(Box::new(inner.clone()))),
                None => {
                    parts.pop();
                    parts.push(Ast::Plus(Box::new(inner.clone())));
                }
            }
            match parts.len() {
                0 => Ast::Empty,
                1 => parts.into_iter().next().unwrap(),
                _ => Ast::Concat(parts),
            }
        }
    }
}

fn compile_ast(b: &mut Builder, ast: &Ast, ci: bool) -> Result<Frag, RegexError> {
    match ast {
        Ast::Empty => {
            // An empty fragment with no states: represented as a dangling
            // "out" list with no start state of its own is awkward, so we
            // emit a zero-width split that both patches to the same place.
            let idx = b.push(State::Split(NONE, NONE))?;
            Ok(Frag { start: idx, out: vec![(idx, 0), (idx, 1)] })
        }
        Ast::Literal(byte) => {
            let spec = literal_class(*byte, ci);
            let idx = b.push(State::Char(spec, NONE))?;
            Ok(Frag { start: idx, out: vec![(idx, 0)] })
        }
        Ast::AnyByte => {
            let idx = b.push(State::Any(NONE))?;
            Ok(Frag { start: idx, out: vec![(idx, 0)] })
        }
        Ast::Class(spec) => {
            let spec = if ci { widen_class_case(spec) } else { spec.clone() };
            let idx = b.push(State::Char(spec, NONE))?;
            Ok(Frag { start: idx, out: vec![(idx, 0)] })
        }
        Ast::StartAnchor => {
            let idx = b.push(State::StartAnchor(NONE))?;
            Ok(Frag { start: idx, out: vec![(idx, 0)] })
        }
        Ast::EndAnchor => {
            let idx = b.push(State::EndAnchor(NONE))?;
            Ok(Frag { start: idx, out: vec![(idx, 0)] })
        }
        Ast::WordBoundary => {
            let idx = b.push(State::WordBoundary(NONE))?;
            Ok(Frag { start: idx, out: vec![(idx, 0)] })
        }
        Ast::Group(inner, _) => compile_ast(b, inner, ci),
        Ast::Concat(parts) => {
            let mut iter = parts.iter();
            let Some(first) = iter.next() else {
                return compile_ast(b, &Ast::Empty, ci);
            };
            let mut frag = compile_ast(b, first, ci)?;
            for part in iter {
                let next = compile_ast(b, part, ci)?;
                b.patch(&frag.out, next.start);
                frag = Frag { start: frag.start, out: next.out };
            }
            Ok(frag)
        }
        Ast::Alternate(branches) => {
            let mut iter = branches.iter();
            let Some(first) = iter.next() else {
                return compile_ast(b, &Ast::Empty, ci);
            };
            let mut acc = compile_ast(b, first, ci)?;
            for branch in iter {
                let next = compile_ast(b, branch, ci)?;
                let split = b.push(State::Split(acc.start, next.start))?;
                let mut out = acc.out;
                out.extend(next.out);
                acc = Frag { start: split, out };
            }
            Ok(acc)
        }
        Ast::Star(inner) => {
            let inner_frag = compile_ast(b, inner, ci)?;
            let split = b.push(State::Split(inner_frag.start, NONE))?;
            b.patch(&inner_frag.out, split);
            Ok(Frag { start: split, out: vec![(split, 1)] })
        }
        Ast::Plus(inner) => {
            let inner_frag = compile_ast(b, inner, ci)?;
            let split = b.push(State::Split(inner_frag.start, NONE))?;
            b.patch(&inner_frag.out, split);
            Ok(Frag { start: inner_frag.start, out: vec![(split, 1)] })
        }
        Ast::Question(inner) => {
            let inner_frag = compile_ast(b, inner, ci)?;
            let split = b.push(State::Split(inner_frag.start, NONE))?;
            let mut out = inner_frag.out;
            out.push((split, 1));
            Ok(Frag { start: split, out })
        }
        Ast::Repeat(..) => unreachable!("desugared before compilation"),
    }
}

fn literal_class(byte: u8, case_insensitive: bool) -> ClassSpec {
    if case_insensitive && byte.is_ascii_alphabetic() {
        let lower = byte.to_ascii_lowercase();
        let upper = byte.to_ascii_uppercase();
        ClassSpec { negated: false, ranges: vec![(lower, lower), (upper, upper)] }
    } else {
        ClassSpec { negated: false, ranges: vec![(byte, byte)] }
    }
}

/// Widen every alphabetic endpoint of a class to include its other case,
/// so `[a-c]` under `-i` also accepts `A-C`. Non-alphabetic ranges pass
/// through unchanged.
fn widen_class_case(spec: &ClassSpec) -> ClassSpec {
    let mut ranges = spec.ranges.clone();
    let mut extra = Vec::new();
    for &(lo, hi) in &spec.ranges {
        if lo.is_ascii_alphabetic() || hi.is_ascii_alphabetic() {
            extra.push((swap_case_byte(lo), swap_case_byte(hi)));
        }
    }
    ranges.extend(extra);
    ClassSpec { negated: spec.negated, ranges }
}

fn swap_case_byte(b: u8) -> u8 {
    if b.is_ascii_uppercase() {
        b.to_ascii_lowercase()
    } else if b.is_ascii_lowercase() {
        b.to_ascii_uppercase()
    } else {
        b
    }
}

impl ClassSpec {
    pub fn matches(&self, byte: u8) -> bool {
        let hit = self.ranges.iter().any(|&(lo, hi)| byte >= lo && byte <= hi);
        hit != self.negated
    }
}
