//! Error taxonomy for the script parser, regex compiler, matcher dispatch,
//! and the CLI driving them. Each layer gets its own `thiserror` enum so
//! callers can match on the failure without string-sniffing; [`CliError`]
//! is the flattening point that assigns the exit codes from the external
//! interface table.

use std::path::PathBuf;

use thiserror::Error;

/// Failures from [`crate::parser`] turning a script into a command pipeline.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ScriptError {
    #[error("malformed expression: {0}")]
    MalformedExpression(String),

    #[error("malformed transliterate: source and destination sets have different lengths ({src_len} != {dst_len})")]
    MalformedTransliterate { src_len: usize, dst_len: usize },

    #[error("command requires a pattern or an address")]
    EmptyPatternWithNoAddress,
}

/// Failures from [`crate::regex::syntax`] and [`crate::regex::nfa`].
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum RegexError {
    #[error("unbalanced group at byte {0}")]
    UnbalancedGroup(usize),

    #[error("unbalanced character class at byte {0}")]
    UnbalancedClass(usize),

    #[error("invalid range in character class at byte {0}")]
    InvalidRange(usize),

    #[error("compiled NFA would need {0} states, exceeding the 256-state limit")]
    StateLimitExceeded(usize),
}

/// Recoverable matcher-dispatch failures (§4.6/§4.7). Neither variant is
/// fatal: [`crate::compute::backend`] catches both and falls back to the
/// host matcher.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum EngineError {
    #[error("compute backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("input of {len} bytes exceeds the device buffer budget of {max} bytes")]
    TextTooLarge { len: usize, max: usize },
}

/// Top-level error the binary prints and maps to an exit code.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error(transparent)]
    Regex(#[from] RegexError),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CliError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CliError::Io { path: path.into(), source }
    }

    /// Exit code per the external-interface table: 1 for script/regex
    /// errors, 2 for I/O errors.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Script(_) | CliError::Regex(_) => 1,
            CliError::Io { .. } => 2,
        }
    }
}
