//! Shared helpers for builtin commands.

use std::path::{Path, PathBuf};

/// Resolve a command-line path argument against the working directory.
pub(crate) fn resolve_path(cwd: &Path, value: &str) -> PathBuf {
    let path = Path::new(value);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// Search `PATH` for an executable file named `name`.
pub(crate) fn search_path(name: &str, path_env: &str) -> Option<PathBuf> {
    if name.contains('/') {
        let candidate = PathBuf::from(name);
        return is_executable(&candidate).then_some(candidate);
    }
    for dir in std::env::split_paths(path_env) {
        if dir.as_os_str().is_empty() {
            continue;
        }
        let candidate = dir.join(name);
        if is_executable(&candidate) {
            return Some(candidate);
        }
    }
    None
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Split text into lines, keeping track of whether the input ended with
/// a newline (so joins can reproduce it).
pub(crate) fn split_lines(text: &str) -> (Vec<&str>, bool) {
    let trailing_newline = text.ends_with('\n');
    let body = if trailing_newline {
        &text[..text.len() - 1]
    } else {
        text
    };
    if body.is_empty() && !trailing_newline {
        return (Vec::new(), false);
    }
    (body.split('\n').collect(), trailing_newline)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_path() {
        let cwd = Path::new("/tmp/work");
        assert_eq!(resolve_path(cwd, "/etc/hosts"), PathBuf::from("/etc/hosts"));
        assert_eq!(resolve_path(cwd, "a/b"), PathBuf::from("/tmp/work/a/b"));
    }

    #[test]
    fn test_split_lines() {
        assert_eq!(split_lines("a\nb\n"), (vec!["a", "b"], true));
        assert_eq!(split_lines("a\nb"), (vec!["a", "b"], false));
        assert_eq!(split_lines(""), (vec![], false));
        assert_eq!(split_lines("\n"), (vec![""], true));
    }

    #[cfg(unix)]
    #[test]
    fn test_search_path_finds_sh() {
        let path_env = "/usr/bin:/bin";
        let found = search_path("sh", path_env);
        assert!(found.is_some());
        assert!(found.unwrap().is_absolute());
    }
}
