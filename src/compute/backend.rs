//! Backend selection (§4.7): a pure function of input shape and device
//! availability, so the policy is exercised in tests without touching a
//! real GPU.

use super::gpu;
use crate::command::PatternKind;

/// Below this size, dispatch overhead outweighs any parallelism win (§4.7).
pub const AUTO_GPU_MIN_BYTES: usize = 64 * 1024;

/// Above this size, `Auto` stays on host regardless of device availability
/// (§4.7) — the same ceiling `gpu`'s dispatch-time size check enforces, so
/// the two never drift apart.
pub const AUTO_GPU_MAX_BYTES: usize = gpu::MAX_TEXT_BYTES;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendPreference {
    Auto,
    ForceCpu,
    /// `--gpu`, `--metal`, and `--vulkan` all resolve to this; the
    /// specific graphics API is an `wgpu` backend-bits choice, not a
    /// separate preference (§4.7).
    ForceGpu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    HostLiteral,
    HostRegex,
    DeviceLiteral,
    DeviceRegex,
}

impl Backend {
    pub fn is_device(self) -> bool {
        matches!(self, Backend::DeviceLiteral | Backend::DeviceRegex)
    }
}

/// Choose a backend for one substitution dispatch. Never fails: a
/// `ForceGpu`/`Auto` choice that turns out to have no device available
/// surfaces as `EngineError::BackendUnavailable` at dispatch time, not
/// here — this function only encodes the policy, not device probing.
pub fn select(
    text_len: usize,
    kind: PatternKind,
    device_available: bool,
    pref: BackendPreference,
) -> Backend {
    let want_device = match pref {
        BackendPreference::ForceCpu => false,
        BackendPreference::ForceGpu => true,
        BackendPreference::Auto => {
            device_available && text_len >= AUTO_GPU_MIN_BYTES && text_len <= AUTO_GPU_MAX_BYTES
        }
    };
    let literal = matches!(kind, PatternKind::Literal);
    match (want_device, literal) {
        (true, true) => Backend::DeviceLiteral,
        (true, false) => Backend::DeviceRegex,
        (false, true) => Backend::HostLiteral,
        (false, false) => Backend::HostRegex,
    }
}
