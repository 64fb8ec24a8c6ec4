// src/commands/basename_cmd.rs
use async_trait::async_trait;

use crate::commands::{Command, CommandContext, CommandResult};

pub struct BasenameCommand;

fn basename_of(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    trimmed.rsplit('/').next().unwrap_or(trimmed).to_string()
}

#[async_trait]
impl Command for BasenameCommand {
    fn name(&self) -> &str {
        "basename"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let args = &ctx.args;
        if args.is_empty() {
            return CommandResult::error("basename: missing operand\n".to_string());
        }
        let mut name = basename_of(&args[0]);
        if let Some(suffix) = args.get(1) {
            if name != *suffix {
                if let Some(stripped) = name.strip_suffix(suffix.as_str()) {
                    name = stripped.to_string();
                }
            }
        }
        CommandResult::success(format!("{}\n", name))
    }
}
