// src/commands/env_cmd.rs
use async_trait::async_trait;

use crate::commands::{Command, CommandContext, CommandResult};

pub struct EnvCommand;

#[async_trait]
impl Command for EnvCommand {
    fn name(&self) -> &str {
        "env"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let mut entries: Vec<(&String, &String)> = ctx.env.iter().collect();
        entries.sort();
        let mut output = String::new();
        for (key, value) in entries {
            output.push_str(key);
            output.push('=');
            output.push_str(value);
            output.push('\n');
        }
        CommandResult::success(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::types::test_context;

    #[tokio::test]
    async fn test_env_lists_variables() {
        let mut ctx = test_context(vec![], "");
        ctx.env.insert("ZZZ_TEST_VAR".to_string(), "1".to_string());
        let r = EnvCommand.execute(ctx).await;
        assert!(r.stdout.contains("ZZZ_TEST_VAR=1\n"));
        assert_eq!(r.exit_code, 0);
    }
}
