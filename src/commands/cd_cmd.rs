// src/commands/cd_cmd.rs
use async_trait::async_trait;

use crate::commands::utils::resolve_path;
use crate::commands::{Command, CommandContext, CommandResult};

/// Changes the working directory of the host process. The side effect is
/// process-scoped, matching shell builtin behavior.
pub struct CdCommand;

#[async_trait]
impl Command for CdCommand {
    fn name(&self) -> &str {
        "cd"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let target = match ctx.args.first() {
            Some(dir) => resolve_path(&ctx.cwd, dir),
            None => match ctx.env.get("HOME") {
                Some(home) => std::path::PathBuf::from(home),
                None => return CommandResult::error("cd: HOME not set\n".to_string()),
            },
        };

        match std::env::set_current_dir(&target) {
            Ok(()) => CommandResult::success(String::new()),
            Err(_) => CommandResult::error(format!(
                "cd: {}: No such file or directory\n",
                target.display()
            )),
        }
    }
}
