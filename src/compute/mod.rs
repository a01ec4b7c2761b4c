//! Backend selection and dispatch (§4.6-§4.7): picks a host or device
//! path per [`backend::select`], and falls back to the host matcher
//! whenever the device path reports an [`crate::error::EngineError`]
//! rather than propagating it — a GPU hiccup degrades gracefully instead
//! of aborting the run.

pub mod backend;
pub mod config;
pub mod cpu;
pub mod gpu;

use crate::command::{PatternKind, SubstFlags};
use crate::error::RegexError;
use crate::literal::MatchRecord;
use crate::regex::{device, Regex};
use backend::{Backend, BackendPreference};

pub fn find_matches(
    text: &[u8],
    pattern: &[u8],
    kind: PatternKind,
    flags: SubstFlags,
    pref: BackendPreference,
) -> Result<Vec<MatchRecord>, RegexError> {
    let device_available = match pref {
        BackendPreference::ForceCpu => false,
        _ => gpu::is_available(),
    };
    let chosen = backend::select(text.len(), kind, device_available, pref);

    if chosen.is_device() {
        let result = match chosen {
            Backend::DeviceLiteral => gpu::find_matches_literal(text, pattern, flags),
            Backend::DeviceRegex => {
                let regex = Regex::compile(pattern, kind, flags.case_insensitive)?;
                let program = device::flatten(&regex.nfa);
                gpu::find_matches_regex(text, &program, flags)
            }
            Backend::HostLiteral | Backend::HostRegex => unreachable!(),
        };
        match result {
            Ok(matches) => return Ok(matches),
            Err(err) => log::warn!("device backend unavailable ({err}), falling back to host matcher"),
        }
    }

    cpu::find_matches(text, pattern, kind, flags)
}
