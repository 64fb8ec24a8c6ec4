// src/commands/tail/mod.rs
use async_trait::async_trait;

use crate::commands::utils::{resolve_path, split_lines};
use crate::commands::{Command, CommandContext, CommandResult};

pub struct TailCommand;

#[async_trait]
impl Command for TailCommand {
    fn name(&self) -> &str {
        "tail"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let mut count = 10usize;
        let mut files = Vec::new();
        let mut i = 0;
        while i < ctx.args.len() {
            let arg = &ctx.args[i];
            if arg == "-n" {
                i += 1;
                let Some(value) = ctx.args.get(i) else {
                    return CommandResult::error("tail: option requires an argument -- 'n'\n".to_string());
                };
                match value.trim_start_matches('+').parse() {
                    Ok(n) => count = n,
                    Err(_) => {
                        return CommandResult::error(format!(
                            "tail: invalid number of lines: '{}'\n",
                            value
                        ))
                    }
                }
            } else if let Some(rest) = arg.strip_prefix("-n") {
                match rest.parse() {
                    Ok(n) => count = n,
                    Err(_) => {
                        return CommandResult::error(format!(
                            "tail: invalid number of lines: '{}'\n",
                            rest
                        ))
                    }
                }
            } else if !arg.starts_with('-') || arg == "-" {
                files.push(arg.clone());
            }
            i += 1;
        }

        let content = if files.is_empty() || files == ["-"] {
            ctx.stdin_text()
        } else {
            let path = resolve_path(&ctx.cwd, &files[0]);
            match tokio::fs::read_to_string(&path).await {
                Ok(text) => text,
                Err(_) => {
                    return CommandResult::error(format!(
                        "tail: cannot open '{}' for reading: No such file or directory\n",
                        files[0]
                    ))
                }
            }
        };

        let (lines, trailing_newline) = split_lines(&content);
        let start = lines.len().saturating_sub(count);
        let mut stdout = lines[start..].join("\n");
        if trailing_newline && !stdout.is_empty() {
            stdout.push('\n');
        }
        CommandResult::success(stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::types::test_context;

    #[tokio::test]
    async fn test_tail_default_ten() {
        let input: String = (1..=12).map(|i| format!("{}\n", i)).collect();
        let r = TailCommand.execute(test_context(vec![], &input)).await;
        assert_eq!(r.stdout, (3..=12).map(|i| format!("{}\n", i)).collect::<String>());
    }

    #[tokio::test]
    async fn test_tail_n() {
        let r = TailCommand
            .execute(test_context(vec!["-n", "2"], "a\nb\nc\n"))
            .await;
        assert_eq!(r.stdout, "b\nc\n");
    }

    #[tokio::test]
    async fn test_tail_short_input() {
        let r = TailCommand
            .execute(test_context(vec!["-n", "5"], "a\n"))
            .await;
        assert_eq!(r.stdout, "a\n");
    }
}
