// ABOUTME: Embedding-facing configuration for a single interpreter instance

use std::time::Duration;

/// Tunables the host sets before running a script. Mirrors the teacher's `FsConfig`/
/// `NetConfig` shape (plain `Default`-backed structs rather than a builder), generalised
/// to this dialect's actual knobs: a wall-clock execution budget, `Option Explicit`
/// enforcement, and whether the standard global objects are pre-populated.
#[derive(Debug, Clone)]
pub struct Options {
    /// Cooperative deadline checked at statement and loop-iteration boundaries. `None`
    /// means unbounded.
    pub max_execution_time: Option<Duration>,
    /// When true, assigning to an undeclared variable is a `VariableNotDefined` error
    /// instead of silently creating one, regardless of whether the script itself wrote
    /// `Option Explicit`.
    pub option_explicit: bool,
    /// When true, pre-populates host-style globals the embedding application wants
    /// visible to every script (distinct from `add_object`, which is per-call).
    pub inject_globals: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            max_execution_time: Some(Duration::from_secs(5)),
            option_explicit: false,
            inject_globals: false,
        }
    }
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
