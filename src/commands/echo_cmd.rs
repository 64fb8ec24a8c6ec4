// src/commands/echo_cmd.rs
use async_trait::async_trait;

use crate::commands::{Command, CommandContext, CommandResult};

pub struct EchoCommand;

#[async_trait]
impl Command for EchoCommand {
    fn name(&self) -> &str {
        "echo"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let args = &ctx.args;
        let mut no_newline = false;
        let mut interpret_escapes = false;
        let mut start_index = 0;

        // Parse flags
        while start_index < args.len() {
            match args[start_index].as_str() {
                "-n" => no_newline = true,
                "-e" => interpret_escapes = true,
                "-E" => interpret_escapes = false,
                "-ne" | "-en" => {
                    no_newline = true;
                    interpret_escapes = true;
                }
                _ => break,
            }
            start_index += 1;
        }

        let mut output: String = args[start_index..].join(" ");

        if interpret_escapes {
            let result = process_escapes(&output);
            output = result.output;
            if result.stop {
                // \c suppresses the newline and everything after it.
                return CommandResult::success(output);
            }
        }

        if !no_newline {
            output.push('\n');
        }

        CommandResult::success(output)
    }
}

struct EscapeResult {
    output: String,
    stop: bool,
}

/// Process echo -e escape sequences.
fn process_escapes(input: &str) -> EscapeResult {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            output.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => output.push('\n'),
            Some('t') => output.push('\t'),
            Some('r') => output.push('\r'),
            Some('a') => output.push('\u{7}'),
            Some('b') => output.push('\u{8}'),
            Some('f') => output.push('\u{c}'),
            Some('v') => output.push('\u{b}'),
            Some('e') => output.push('\u{1b}'),
            Some('\\') => output.push('\\'),
            Some('0') => {
                let mut value = 0u32;
                for _ in 0..3 {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(digit) => {
                            value = value * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                if let Some(ch) = char::from_u32(value) {
                    output.push(ch);
                }
            }
            Some('c') => return EscapeResult { output, stop: true },
            Some(other) => {
                output.push('\\');
                output.push(other);
            }
            None => output.push('\\'),
        }
    }
    EscapeResult { output, stop: false }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::types::test_context;

    #[tokio::test]
    async fn test_basic_echo() {
        let r = EchoCommand.execute(test_context(vec!["hello", "world"], "")).await;
        assert_eq!(r.stdout, "hello world\n");
        assert_eq!(r.exit_code, 0);
    }

    #[tokio::test]
    async fn test_no_newline_flag() {
        let r = EchoCommand.execute(test_context(vec!["-n", "hi"], "")).await;
        assert_eq!(r.stdout, "hi");
    }

    #[tokio::test]
    async fn test_escape_interpretation() {
        let r = EchoCommand.execute(test_context(vec!["-e", "a\\tb\\n"], "")).await;
        assert_eq!(r.stdout, "a\tb\n\n");
    }

    #[tokio::test]
    async fn test_stop_escape() {
        let r = EchoCommand
            .execute(test_context(vec!["-e", "ab\\cde"], ""))
            .await;
        assert_eq!(r.stdout, "ab");
    }

    #[test]
    fn test_octal_escape() {
        let r = process_escapes("\\0101");
        assert_eq!(r.output, "A");
    }
}
