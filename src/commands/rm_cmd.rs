// src/commands/rm_cmd.rs
use async_trait::async_trait;

use crate::commands::utils::resolve_path;
use crate::commands::{Command, CommandContext, CommandResult};

pub struct RmCommand;

#[async_trait]
impl Command for RmCommand {
    fn name(&self) -> &str {
        "rm"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let mut recursive = false;
        let mut force = false;
        let mut files = Vec::new();
        for arg in &ctx.args {
            match arg.as_str() {
                "-r" | "-R" | "--recursive" => recursive = true,
                "-f" | "--force" => force = true,
                "-rf" | "-fr" => {
                    recursive = true;
                    force = true;
                }
                _ if !arg.starts_with('-') => files.push(arg.clone()),
                _ => {}
            }
        }
        if files.is_empty() {
            if force {
                return CommandResult::success(String::new());
            }
            return CommandResult::error("rm: missing operand\n".to_string());
        }

        let mut stderr = String::new();
        let mut exit_code = 0;
        for file in &files {
            let path = resolve_path(&ctx.cwd, file);
            let result = if path.is_dir() {
                if recursive {
                    tokio::fs::remove_dir_all(&path).await
                } else {
                    stderr.push_str(&format!("rm: cannot remove '{}': Is a directory\n", file));
                    exit_code = 1;
                    continue;
                }
            } else {
                tokio::fs::remove_file(&path).await
            };
            if result.is_err() && !force {
                stderr.push_str(&format!(
                    "rm: cannot remove '{}': No such file or directory\n",
                    file
                ));
                exit_code = 1;
            }
        }
        CommandResult::with_exit_code(String::new(), stderr, exit_code)
    }
}
