// src/commands/wc/mod.rs
use async_trait::async_trait;

use crate::commands::utils::resolve_path;
use crate::commands::{Command, CommandContext, CommandResult};

pub struct WcCommand;

#[derive(Default, Clone, Copy)]
struct Counts {
    lines: usize,
    words: usize,
    bytes: usize,
}

fn count(content: &str) -> Counts {
    Counts {
        lines: content.matches('\n').count(),
        words: content.split_whitespace().count(),
        bytes: content.len(),
    }
}

#[async_trait]
impl Command for WcCommand {
    fn name(&self) -> &str {
        "wc"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let mut show_lines = false;
        let mut show_words = false;
        let mut show_bytes = false;
        let mut files = Vec::new();
        for arg in &ctx.args {
            match arg.as_str() {
                "-l" => show_lines = true,
                "-w" => show_words = true,
                "-c" => show_bytes = true,
                s if s.starts_with('-') && s.len() > 1 => {
                    for c in s.chars().skip(1) {
                        match c {
                            'l' => show_lines = true,
                            'w' => show_words = true,
                            'c' => show_bytes = true,
                            _ => {}
                        }
                    }
                }
                _ => files.push(arg.clone()),
            }
        }
        if !show_lines && !show_words && !show_bytes {
            show_lines = true;
            show_words = true;
            show_bytes = true;
        }

        let format_counts = |c: Counts, label: Option<&str>| {
            let mut fields = Vec::new();
            if show_lines {
                fields.push(format!("{:7}", c.lines));
            }
            if show_words {
                fields.push(format!("{:7}", c.words));
            }
            if show_bytes {
                fields.push(format!("{:7}", c.bytes));
            }
            let mut line = fields.join(" ");
            if let Some(label) = label {
                line.push(' ');
                line.push_str(label);
            }
            line.push('\n');
            line
        };

        if files.is_empty() {
            let c = count(&ctx.stdin_text());
            return CommandResult::success(format_counts(c, None));
        }

        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut exit_code = 0;
        let mut total = Counts::default();
        for file in &files {
            let path = resolve_path(&ctx.cwd, file);
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => {
                    let c = count(&content);
                    total.lines += c.lines;
                    total.words += c.words;
                    total.bytes += c.bytes;
                    stdout.push_str(&format_counts(c, Some(file)));
                }
                Err(_) => {
                    stderr.push_str(&format!("wc: {}: No such file or directory\n", file));
                    exit_code = 1;
                }
            }
        }
        if files.len() > 1 {
            stdout.push_str(&format_counts(total, Some("total")));
        }
        CommandResult::with_exit_code(stdout, stderr, exit_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::types::test_context;

    #[tokio::test]
    async fn test_wc_lines_only() {
        let r = WcCommand
            .execute(test_context(vec!["-l"], "a\nb\nc\n"))
            .await;
        assert_eq!(r.stdout.trim(), "3");
    }

    #[tokio::test]
    async fn test_wc_default_triple() {
        let r = WcCommand.execute(test_context(vec![], "one two\n")).await;
        let fields: Vec<&str> = r.stdout.split_whitespace().collect();
        assert_eq!(fields, vec!["1", "2", "8"]);
    }

    #[test]
    fn test_count() {
        let c = count("a b\nc\n");
        assert_eq!((c.lines, c.words, c.bytes), (2, 3, 6));
    }
}
