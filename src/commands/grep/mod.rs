// src/commands/grep/mod.rs
use async_trait::async_trait;
use regex_lite::Regex;

use crate::commands::utils::{resolve_path, split_lines};
use crate::commands::{Command, CommandContext, CommandResult};

pub struct GrepCommand;

const HELP: &str = "Usage: grep [OPTION]... PATTERN [FILE]...\n\n\
Search for PATTERN in each FILE or standard input.\n\n\
Options:\n\
  -i           ignore case distinctions\n\
  -v           select non-matching lines\n\
  -n           prefix output lines with line numbers\n\
  -c           print only a count of matching lines\n\
      --help   display this help and exit\n";

struct GrepOptions {
    ignore_case: bool,
    invert: bool,
    line_numbers: bool,
    count_only: bool,
}

#[async_trait]
impl Command for GrepCommand {
    fn name(&self) -> &str {
        "grep"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        if ctx.args.iter().any(|a| a == "--help") {
            return CommandResult::success(HELP.to_string());
        }

        let mut opts = GrepOptions {
            ignore_case: false,
            invert: false,
            line_numbers: false,
            count_only: false,
        };
        let mut positional = Vec::new();
        for arg in &ctx.args {
            match arg.as_str() {
                "-i" => opts.ignore_case = true,
                "-v" => opts.invert = true,
                "-n" => opts.line_numbers = true,
                "-c" => opts.count_only = true,
                s if s.starts_with('-') && s.len() > 1 => {
                    for c in s.chars().skip(1) {
                        match c {
                            'i' => opts.ignore_case = true,
                            'v' => opts.invert = true,
                            'n' => opts.line_numbers = true,
                            'c' => opts.count_only = true,
                            _ => {}
                        }
                    }
                }
                _ => positional.push(arg.clone()),
            }
        }

        let Some(pattern) = positional.first() else {
            return CommandResult::with_exit_code(
                String::new(),
                "Usage: grep [OPTION]... PATTERN [FILE]...\n".to_string(),
                2,
            );
        };
        let source = if opts.ignore_case {
            format!("(?i){}", pattern)
        } else {
            pattern.clone()
        };
        let regex = match Regex::new(&source) {
            Ok(re) => re,
            Err(e) => {
                return CommandResult::with_exit_code(
                    String::new(),
                    format!("grep: invalid pattern: {}\n", e),
                    2,
                )
            }
        };

        let files = &positional[1..];
        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut matched_any = false;
        let mut had_error = false;

        let mut inputs: Vec<(String, String)> = Vec::new();
        if files.is_empty() {
            inputs.push(("(standard input)".to_string(), ctx.stdin_text()));
        } else {
            for file in files {
                let path = resolve_path(&ctx.cwd, file);
                match tokio::fs::read_to_string(&path).await {
                    Ok(content) => inputs.push((file.clone(), content)),
                    Err(_) => {
                        stderr.push_str(&format!("grep: {}: No such file or directory\n", file));
                        had_error = true;
                    }
                }
            }
        }
        let label_files = inputs.len() > 1;

        for (label, content) in &inputs {
            let (lines, _) = split_lines(content);
            let mut count = 0usize;
            for (idx, line) in lines.iter().enumerate() {
                let matched = regex.is_match(line) != opts.invert;
                if !matched {
                    continue;
                }
                matched_any = true;
                count += 1;
                if opts.count_only {
                    continue;
                }
                if label_files {
                    stdout.push_str(&format!("{}:", label));
                }
                if opts.line_numbers {
                    stdout.push_str(&format!("{}:", idx + 1));
                }
                stdout.push_str(line);
                stdout.push('\n');
            }
            if opts.count_only {
                if label_files {
                    stdout.push_str(&format!("{}:{}\n", label, count));
                } else {
                    stdout.push_str(&format!("{}\n", count));
                }
            }
        }

        let exit_code = if had_error {
            2
        } else if matched_any {
            0
        } else {
            1
        };
        CommandResult::with_exit_code(stdout, stderr, exit_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::types::test_context;

    #[tokio::test]
    async fn test_basic_match() {
        let r = GrepCommand
            .execute(test_context(vec!["b"], "abc\nxyz\nbbb\n"))
            .await;
        assert_eq!(r.stdout, "abc\nbbb\n");
        assert_eq!(r.exit_code, 0);
    }

    #[tokio::test]
    async fn test_no_match_exit_one() {
        let r = GrepCommand
            .execute(test_context(vec!["zzz"], "abc\n"))
            .await;
        assert_eq!(r.stdout, "");
        assert_eq!(r.exit_code, 1);
    }

    #[tokio::test]
    async fn test_invert_and_line_numbers() {
        let r = GrepCommand
            .execute(test_context(vec!["-vn", "b"], "abc\nxyz\n"))
            .await;
        assert_eq!(r.stdout, "2:xyz\n");
    }

    #[tokio::test]
    async fn test_ignore_case() {
        let r = GrepCommand
            .execute(test_context(vec!["-i", "HELLO"], "hello world\n"))
            .await;
        assert_eq!(r.exit_code, 0);
    }

    #[tokio::test]
    async fn test_count_only() {
        let r = GrepCommand
            .execute(test_context(vec!["-c", "a"], "a\nb\na\n"))
            .await;
        assert_eq!(r.stdout, "2\n");
    }

    #[tokio::test]
    async fn test_invalid_pattern() {
        let r = GrepCommand.execute(test_context(vec!["("], "x\n")).await;
        assert_eq!(r.exit_code, 2);
    }
}
