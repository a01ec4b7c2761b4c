//! Flattens a compiled [`Nfa`] into the flat, index-based layout the GPU
//! dispatch layer uploads as storage buffers (§4.5, §6): a `states`
//! array of fixed-width records plus one 256-bit class bitmap per
//! `Char` state, so the compute shader never needs to evaluate range
//! lists — only a single bit test per byte.

use super::nfa::{Nfa, State};
use bytemuck::{Pod, Zeroable};

pub const BITMAP_WORDS: usize = 8;

pub const KIND_CHAR: u32 = 0;
pub const KIND_ANY: u32 = 1;
pub const KIND_SPLIT: u32 = 2;
pub const KIND_START_ANCHOR: u32 = 3;
pub const KIND_END_ANCHOR: u32 = 4;
pub const KIND_WORD_BOUNDARY: u32 = 5;
pub const KIND_MATCH: u32 = 6;

/// One NFA state packed into three `u32` words, matching the `states`
/// storage buffer's element layout the compute shader indexes into.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct DeviceState {
    pub kind: u32,
    /// `Char`: index into `bitmaps`. `Split`: the first branch target.
    /// Otherwise unused (`0`).
    pub a: u32,
    /// The successor state index (`Split`'s second branch for `Split`).
    pub b: u32,
}

/// A 256-bit membership bitmap for one `Char` state, one bit per byte
/// value, with negation already folded in so device-side matching is a
/// single `(bitmap[byte / 32] >> (byte % 32)) & 1` test.
pub type Bitmap = [u32; BITMAP_WORDS];

pub struct DeviceProgram {
    pub states: Vec<DeviceState>,
    pub bitmaps: Vec<Bitmap>,
    pub start: u32,
}

pub fn flatten(nfa: &Nfa) -> DeviceProgram {
    let mut bitmaps = Vec::new();
    let mut states = Vec::with_capacity(nfa.states.len());
    for state in &nfa.states {
        let device_state = match state {
            State::Char(spec, next) => {
                let idx = bitmaps.len() as u32;
                bitmaps.push(class_bitmap(spec));
                DeviceState { kind: KIND_CHAR, a: idx, b: *next as u32 }
            }
            State::Any(next) => DeviceState { kind: KIND_ANY, a: 0, b: *next as u32 },
            State::Split(a, b) => DeviceState { kind: KIND_SPLIT, a: *a as u32, b: *b as u32 },
            State::StartAnchor(next) => DeviceState { kind: KIND_START_ANCHOR, a: 0, b: *next as u32 },
            State::EndAnchor(next) => DeviceState { kind: KIND_END_ANCHOR, a: 0, b: *next as u32 },
            State::WordBoundary(next) => DeviceState { kind: KIND_WORD_BOUNDARY, a: 0, b: *next as u32 },
            State::Match => DeviceState { kind: KIND_MATCH, a: 0, b: 0 },
        };
        states.push(device_state);
    }
    DeviceProgram { states, bitmaps, start: nfa.start as u32 }
}

fn class_bitmap(spec: &super::syntax::ClassSpec) -> Bitmap {
    let mut bits = [0u32; BITMAP_WORDS];
    for byte in 0u16..=255 {
        if spec.matches(byte as u8) {
            let b = byte as usize;
            bits[b / 32] |= 1 << (b % 32);
        }
    }
    bits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regex::nfa::compile;
    use crate::regex::syntax::parse;

    #[test]
    fn literal_flattens_to_single_char_state_and_match() {
        let ast = parse(b"a", true).unwrap();
        let nfa = compile(&ast, false).unwrap();
        let program = flatten(&nfa);
        assert_eq!(program.states.len(), 2);
        assert_eq!(program.states[0].kind, KIND_CHAR);
        assert_eq!(program.states[1].kind, KIND_MATCH);
        assert_eq!(program.bitmaps.len(), 1);
        let bit = b'a' as usize;
        assert_ne!(program.bitmaps[0][bit / 32] & (1 << (bit % 32)), 0);
    }

    #[test]
    fn negated_class_bitmap_excludes_listed_bytes() {
        let ast = parse(b"[^a]", true).unwrap();
        let nfa = compile(&ast, false).unwrap();
        let program = flatten(&nfa);
        let bit = b'a' as usize;
        assert_eq!(program.bitmaps[0][bit / 32] & (1 << (bit % 32)), 0);
        let other = b'b' as usize;
        assert_ne!(program.bitmaps[0][other / 32] & (1 << (other % 32)), 0);
    }

    #[test]
    fn split_state_carries_both_branch_targets() {
        let ast = parse(b"a*", true).unwrap();
        let nfa = compile(&ast, false).unwrap();
        let program = flatten(&nfa);
        assert!(program.states.iter().any(|s| s.kind == KIND_SPLIT));
    }
}
