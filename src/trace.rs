//! Diagnostic Tracing
//!
//! Category-tagged trace lines on stderr, controlled by environment:
//! `COMMAND_STREAM_VERBOSE=true` enables everything,
//! `COMMAND_STREAM_TRACE=runner,pipeline` (or `*`) selects categories.
//! The `verbose`/`xtrace` shell flags additionally echo commands before
//! execution with the classic `+ ` prefix.

use std::collections::HashSet;

struct TraceConfig {
    verbose: bool,
    all: bool,
    categories: HashSet<String>,
}

impl TraceConfig {
    fn from_env() -> Self {
        let verbose = std::env::var("COMMAND_STREAM_VERBOSE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        let mut all = false;
        let mut categories = HashSet::new();
        if let Ok(spec) = std::env::var("COMMAND_STREAM_TRACE") {
            for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                if part == "*" {
                    all = true;
                } else {
                    categories.insert(part.to_string());
                }
            }
        }
        Self {
            verbose,
            all,
            categories,
        }
    }
}

lazy_static::lazy_static! {
    static ref CONFIG: TraceConfig = TraceConfig::from_env();
}

/// Whether a category is traced. Read once from the environment and
/// cached for the life of the process.
pub fn enabled(category: &str) -> bool {
    CONFIG.verbose || CONFIG.all || CONFIG.categories.contains(category)
}

/// Emit one trace line if the category is enabled.
pub fn trace(category: &str, message: &str) {
    if enabled(category) {
        eprintln!("[command-stream:{}] {}", category, message);
    }
}

/// Echo a command line before execution, `set -x` style.
pub(crate) fn xtrace_line(command: &str) {
    eprintln!("+ {}", command);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_parsing() {
        let mut config = TraceConfig {
            verbose: false,
            all: false,
            categories: HashSet::new(),
        };
        config.categories.insert("runner".to_string());
        assert!(config.categories.contains("runner"));
        assert!(!config.categories.contains("pipeline"));
    }

    #[test]
    fn test_trace_disabled_by_default_is_silent() {
        // Should not panic regardless of configuration.
        trace("never-configured-category-xyz", "message");
    }
}
