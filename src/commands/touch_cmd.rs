// src/commands/touch_cmd.rs
use async_trait::async_trait;

use crate::commands::utils::resolve_path;
use crate::commands::{Command, CommandContext, CommandResult};

pub struct TouchCommand;

#[async_trait]
impl Command for TouchCommand {
    fn name(&self) -> &str {
        "touch"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let files: Vec<&String> = ctx.args.iter().filter(|a| !a.starts_with('-')).collect();
        if files.is_empty() {
            return CommandResult::error("touch: missing file operand\n".to_string());
        }

        let mut stderr = String::new();
        let mut exit_code = 0;
        for file in files {
            let path = resolve_path(&ctx.cwd, file);
            if path.exists() {
                continue;
            }
            if let Err(e) = tokio::fs::File::create(&path).await {
                stderr.push_str(&format!("touch: cannot touch '{}': {}\n", file, e));
                exit_code = 1;
            }
        }
        CommandResult::with_exit_code(String::new(), stderr, exit_code)
    }
}
