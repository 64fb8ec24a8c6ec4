//! Global Shell Flags
//!
//! Process-wide flags in the spirit of `set -e` and friends. Flags are
//! snapshotted at runner start; changing them while runners are live only
//! affects subsequent evaluations.

use std::sync::RwLock;

/// The process-wide flag record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShellFlags {
    /// Non-zero exits raise an error from a wait.
    pub errexit: bool,
    /// Echo commands to stderr before running them.
    pub verbose: bool,
    /// Trace commands with a `+ ` prefix as they execute.
    pub xtrace: bool,
    /// Error on unset variables (consulted by builtins).
    pub nounset: bool,
    /// A pipeline reports the leftmost non-zero stage code.
    pub pipefail: bool,
}

lazy_static::lazy_static! {
    static ref FLAGS: RwLock<ShellFlags> = RwLock::new(ShellFlags::default());
}

fn apply(name: &str, value: bool) -> bool {
    let mut flags = FLAGS.write().unwrap();
    match name {
        "e" | "errexit" => flags.errexit = value,
        "v" | "verbose" => flags.verbose = value,
        "x" | "xtrace" => flags.xtrace = value,
        "u" | "nounset" => flags.nounset = value,
        "pipefail" => flags.pipefail = value,
        _ => return false,
    }
    true
}

/// Turn a flag on. Accepts the short form (`e`, `v`, `x`, `u`) or
/// `pipefail`. Returns false for unknown names.
pub fn set(flag: &str) -> bool {
    apply(flag, true)
}

/// Turn a flag off. Returns false for unknown names.
pub fn unset(flag: &str) -> bool {
    apply(flag, false)
}

/// Snapshot of the current flags.
pub fn flags() -> ShellFlags {
    *FLAGS.read().unwrap()
}

pub(crate) fn reset_flags() {
    *FLAGS.write().unwrap() = ShellFlags::default();
}

/// Restore process-wide defaults: all shell flags off, the virtual
/// registry re-enabled, runner counters zeroed.
pub fn reset_global_state() {
    reset_flags();
    crate::commands::registry::enable();
    crate::runner::reset_runner_ids();
    crate::cleanup::reset_interrupt_window();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_unset_round_trip() {
        let _guard = crate::test_util::lock_global();
        assert!(set("pipefail"));
        assert!(flags().pipefail);
        assert!(unset("pipefail"));
        assert!(!flags().pipefail);
    }

    #[test]
    fn test_short_and_long_names() {
        let _guard = crate::test_util::lock_global();
        assert!(set("e"));
        assert!(flags().errexit);
        assert!(unset("errexit"));
        assert!(!flags().errexit);
    }

    #[test]
    fn test_unknown_flag_rejected() {
        assert!(!set("z"));
        assert!(!unset("posix"));
    }
}
