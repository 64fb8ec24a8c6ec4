// src/commands/ls/mod.rs
use async_trait::async_trait;

use crate::commands::utils::resolve_path;
use crate::commands::{Command, CommandContext, CommandResult};

pub struct LsCommand;

#[async_trait]
impl Command for LsCommand {
    fn name(&self) -> &str {
        "ls"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let mut show_hidden = false;
        let mut targets = Vec::new();
        for arg in &ctx.args {
            match arg.as_str() {
                "-a" | "--all" => show_hidden = true,
                // Output is always one name per line, as for a non-tty.
                "-1" => {}
                _ if !arg.starts_with('-') => targets.push(arg.clone()),
                _ => {}
            }
        }
        if targets.is_empty() {
            targets.push(".".to_string());
        }

        let multiple = targets.len() > 1;
        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut exit_code = 0;

        for (i, target) in targets.iter().enumerate() {
            let path = resolve_path(&ctx.cwd, target);
            if path.is_file() {
                stdout.push_str(&format!("{}\n", target));
                continue;
            }
            let mut read_dir = match tokio::fs::read_dir(&path).await {
                Ok(rd) => rd,
                Err(_) => {
                    stderr.push_str(&format!(
                        "ls: cannot access '{}': No such file or directory\n",
                        target
                    ));
                    exit_code = 2;
                    continue;
                }
            };
            let mut names = Vec::new();
            if show_hidden {
                names.push(".".to_string());
                names.push("..".to_string());
            }
            while let Ok(Some(entry)) = read_dir.next_entry().await {
                let name = entry.file_name().to_string_lossy().into_owned();
                if !show_hidden && name.starts_with('.') {
                    continue;
                }
                names.push(name);
            }
            names.sort();

            if multiple {
                if i > 0 {
                    stdout.push('\n');
                }
                stdout.push_str(&format!("{}:\n", target));
            }
            for name in names {
                stdout.push_str(&name);
                stdout.push('\n');
            }
        }
        CommandResult::with_exit_code(stdout, stderr, exit_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::types::test_context;

    #[tokio::test]
    async fn test_ls_sorted_without_hidden() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("b.txt"), "").unwrap();
        std::fs::write(tmp.path().join("a.txt"), "").unwrap();
        std::fs::write(tmp.path().join(".hidden"), "").unwrap();

        let mut ctx = test_context(vec![], "");
        ctx.cwd = tmp.path().to_path_buf();
        let r = LsCommand.execute(ctx).await;
        assert_eq!(r.stdout, "a.txt\nb.txt\n");
        assert_eq!(r.exit_code, 0);
    }

    #[tokio::test]
    async fn test_ls_all_includes_dot_entries() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(".hidden"), "").unwrap();
        let mut ctx = test_context(vec!["-a"], "");
        ctx.cwd = tmp.path().to_path_buf();
        let r = LsCommand.execute(ctx).await;
        assert_eq!(r.stdout, ".\n..\n.hidden\n");
    }

    #[tokio::test]
    async fn test_ls_missing_target() {
        let tmp = tempfile::tempdir().unwrap();
        let mut ctx = test_context(vec!["ghost"], "");
        ctx.cwd = tmp.path().to_path_buf();
        let r = LsCommand.execute(ctx).await;
        assert_eq!(r.exit_code, 2);
        assert!(r.stderr.contains("cannot access"));
    }
}
