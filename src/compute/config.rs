//! The device-visible configuration record (§6): a fixed 32-byte uniform
//! buffer describing one dispatch, shared by both the literal and regex
//! compute shaders.

use crate::command::SubstFlags;
use bytemuck::{Pod, Zeroable};

pub const FLAG_GLOBAL: u32 = 1 << 0;
pub const FLAG_CASE_INSENSITIVE: u32 = 1 << 1;
pub const FLAG_FIRST_ONLY: u32 = 1 << 2;
pub const FLAG_ANCHOR_START: u32 = 1 << 3;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct DeviceConfig {
    pub text_len: u32,
    pub pattern_len: u32,
    pub replacement_len: u32,
    pub flags: u32,
    pub max_matches: u32,
    pub num_threads: u32,
    _padding: [u32; 2],
}

impl DeviceConfig {
    pub fn new(
        text_len: u32,
        pattern_len: u32,
        replacement_len: u32,
        flags: SubstFlags,
        max_matches: u32,
        num_threads: u32,
    ) -> Self {
        let mut bits = 0u32;
        if flags.global {
            bits |= FLAG_GLOBAL;
        }
        if flags.case_insensitive {
            bits |= FLAG_CASE_INSENSITIVE;
        }
        if flags.first_only {
            bits |= FLAG_FIRST_ONLY;
        }
        if flags.anchor_start {
            bits |= FLAG_ANCHOR_START;
        }
        DeviceConfig {
            text_len,
            pattern_len,
            replacement_len,
            flags: bits,
            max_matches,
            num_threads,
            _padding: [0; 2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_is_32_bytes() {
        assert_eq!(std::mem::size_of::<DeviceConfig>(), 32);
    }

    #[test]
    fn flag_bits_round_trip() {
        let flags = SubstFlags { global: true, case_insensitive: false, first_only: true, anchor_start: true };
        let cfg = DeviceConfig::new(10, 3, 3, flags, 256, 64);
        assert_eq!(cfg.flags & FLAG_GLOBAL, FLAG_GLOBAL);
        assert_eq!(cfg.flags & FLAG_CASE_INSENSITIVE, 0);
        assert_eq!(cfg.flags & FLAG_FIRST_ONLY, FLAG_FIRST_ONLY);
        assert_eq!(cfg.flags & FLAG_ANCHOR_START, FLAG_ANCHOR_START);
    }
}
