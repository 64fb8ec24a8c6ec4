// src/commands/mkdir_cmd.rs
use async_trait::async_trait;

use crate::commands::utils::resolve_path;
use crate::commands::{Command, CommandContext, CommandResult};

pub struct MkdirCommand;

#[async_trait]
impl Command for MkdirCommand {
    fn name(&self) -> &str {
        "mkdir"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let mut recursive = false;
        let mut dirs = Vec::new();
        for arg in &ctx.args {
            match arg.as_str() {
                "-p" | "--parents" => recursive = true,
                _ if !arg.starts_with('-') => dirs.push(arg.clone()),
                _ => {}
            }
        }
        if dirs.is_empty() {
            return CommandResult::error("mkdir: missing operand\n".to_string());
        }

        let mut stderr = String::new();
        let mut exit_code = 0;
        for dir in &dirs {
            let path = resolve_path(&ctx.cwd, dir);
            let result = if recursive {
                tokio::fs::create_dir_all(&path).await
            } else {
                tokio::fs::create_dir(&path).await
            };
            if let Err(e) = result {
                stderr.push_str(&format!("mkdir: cannot create directory '{}': {}\n", dir, e));
                exit_code = 1;
            }
        }
        CommandResult::with_exit_code(String::new(), stderr, exit_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::types::test_context;

    #[tokio::test]
    async fn test_mkdir_and_parents() {
        let tmp = tempfile::tempdir().unwrap();
        let mut ctx = test_context(vec!["-p", "a/b/c"], "");
        ctx.cwd = tmp.path().to_path_buf();
        let r = MkdirCommand.execute(ctx).await;
        assert_eq!(r.exit_code, 0);
        assert!(tmp.path().join("a/b/c").is_dir());
    }

    #[tokio::test]
    async fn test_mkdir_existing_fails_without_p() {
        let tmp = tempfile::tempdir().unwrap();
        let mut ctx = test_context(vec!["."], "");
        ctx.cwd = tmp.path().to_path_buf();
        let r = MkdirCommand.execute(ctx).await;
        assert_eq!(r.exit_code, 1);
        assert!(r.stderr.contains("cannot create directory"));
    }

    #[tokio::test]
    async fn test_missing_operand() {
        let r = MkdirCommand.execute(test_context(vec![], "")).await;
        assert_eq!(r.exit_code, 1);
    }
}
