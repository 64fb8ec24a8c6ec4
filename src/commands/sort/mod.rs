// src/commands/sort/mod.rs
use async_trait::async_trait;

use crate::commands::utils::{resolve_path, split_lines};
use crate::commands::{Command, CommandContext, CommandResult};

pub struct SortCommand;

#[async_trait]
impl Command for SortCommand {
    fn name(&self) -> &str {
        "sort"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let mut reverse = false;
        let mut numeric = false;
        let mut unique = false;
        let mut files = Vec::new();
        for arg in &ctx.args {
            match arg.as_str() {
                "-r" => reverse = true,
                "-n" => numeric = true,
                "-u" => unique = true,
                s if s.starts_with('-') && s.len() > 1 => {
                    for c in s.chars().skip(1) {
                        match c {
                            'r' => reverse = true,
                            'n' => numeric = true,
                            'u' => unique = true,
                            _ => {}
                        }
                    }
                }
                _ => files.push(arg.clone()),
            }
        }

        let mut content = String::new();
        if files.is_empty() {
            content = ctx.stdin_text();
        } else {
            for file in &files {
                let path = resolve_path(&ctx.cwd, file);
                match tokio::fs::read_to_string(&path).await {
                    Ok(text) => content.push_str(&text),
                    Err(_) => {
                        return CommandResult::with_exit_code(
                            String::new(),
                            format!("sort: cannot read: {}: No such file or directory\n", file),
                            2,
                        )
                    }
                }
            }
        }

        let (lines, _) = split_lines(&content);
        let mut lines: Vec<String> = lines.into_iter().map(String::from).collect();
        if numeric {
            lines.sort_by(|a, b| {
                let na = leading_number(a);
                let nb = leading_number(b);
                na.partial_cmp(&nb)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.cmp(b))
            });
        } else {
            lines.sort();
        }
        if reverse {
            lines.reverse();
        }
        if unique {
            lines.dedup();
        }

        let mut stdout = lines.join("\n");
        if !stdout.is_empty() {
            stdout.push('\n');
        }
        CommandResult::success(stdout)
    }
}

fn leading_number(line: &str) -> f64 {
    let trimmed = line.trim_start();
    let end = trimmed
        .char_indices()
        .take_while(|(i, c)| c.is_ascii_digit() || *c == '.' || (*i == 0 && *c == '-'))
        .map(|(i, c)| i + c.len_utf8())
        .last()
        .unwrap_or(0);
    trimmed[..end].parse().unwrap_or(0.0)
}
