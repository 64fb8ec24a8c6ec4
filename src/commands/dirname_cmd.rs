// src/commands/dirname_cmd.rs
use async_trait::async_trait;

use crate::commands::{Command, CommandContext, CommandResult};

pub struct DirnameCommand;

fn dirname_of(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    match trimmed.rfind('/') {
        None => ".".to_string(),
        Some(0) => "/".to_string(),
        Some(idx) => trimmed[..idx].trim_end_matches('/').to_string(),
    }
}

#[async_trait]
impl Command for DirnameCommand {
    fn name(&self) -> &str {
        "dirname"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        if ctx.args.is_empty() {
            return CommandResult::error("dirname: missing operand\n".to_string());
        }
        let mut output = String::new();
        for arg in &ctx.args {
            output.push_str(&dirname_of(arg));
            output.push('\n');
        }
        CommandResult::success(output)
    }
}
