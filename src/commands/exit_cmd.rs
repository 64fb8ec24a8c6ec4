// src/commands/exit_cmd.rs
use async_trait::async_trait;

use crate::commands::{Command, CommandContext, CommandResult};

/// Terminates the virtual stage with the requested code. Does not exit
/// the host process.
pub struct ExitCommand;

#[async_trait]
impl Command for ExitCommand {
    fn name(&self) -> &str {
        "exit"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let code = match ctx.args.first() {
            None => 0,
            Some(arg) => match arg.parse::<i32>() {
                Ok(n) => n & 0xff,
                Err(_) => {
                    return CommandResult::with_exit_code(
                        String::new(),
                        format!("exit: {}: numeric argument required\n", arg),
                        2,
                    )
                }
            },
        };
        CommandResult::with_exit_code(String::new(), String::new(), code)
    }
}
