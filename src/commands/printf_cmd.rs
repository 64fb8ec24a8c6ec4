// src/commands/printf_cmd.rs
use async_trait::async_trait;

use crate::commands::{Command, CommandContext, CommandResult};

pub struct PrintfCommand;

#[async_trait]
impl Command for PrintfCommand {
    fn name(&self) -> &str {
        "printf"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let args = &ctx.args;
        if args.is_empty() {
            return CommandResult::error("printf: usage: printf format [arguments]\n".to_string());
        }
        let format = &args[0];
        let mut values = args[1..].iter();
        let mut output = String::new();

        // The format string is reused until all arguments are consumed.
        loop {
            let consumed = render(format, &mut values, &mut output);
            if values.len() == 0 || !consumed {
                break;
            }
        }
        CommandResult::success(output)
    }
}

/// Render one pass of the format string. Returns whether any conversion
/// consumed an argument (guards against formats with no directives).
fn render<'a, I>(format: &str, values: &mut I, output: &mut String) -> bool
where
    I: Iterator<Item = &'a String> + ExactSizeIterator,
{
    let mut consumed = false;
    let mut chars = format.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('n') => output.push('\n'),
                Some('t') => output.push('\t'),
                Some('r') => output.push('\r'),
                Some('\\') => output.push('\\'),
                Some('0') => output.push('\0'),
                Some(other) => {
                    output.push('\\');
                    output.push(other);
                }
                None => output.push('\\'),
            },
            '%' => match chars.next() {
                Some('%') => output.push('%'),
                Some('s') => {
                    consumed = true;
                    if let Some(v) = values.next() {
                        output.push_str(v);
                    }
                }
                Some('d') | Some('i') => {
                    consumed = true;
                    let value = values.next().map(String::as_str).unwrap_or("0");
                    match value.trim().parse::<i64>() {
                        Ok(n) => output.push_str(&n.to_string()),
                        Err(_) => output.push('0'),
                    }
                }
                Some('x') => {
                    consumed = true;
                    let value = values.next().map(String::as_str).unwrap_or("0");
                    let n = value.trim().parse::<i64>().unwrap_or(0);
                    output.push_str(&format!("{:x}", n));
                }
                Some(other) => {
                    output.push('%');
                    output.push(other);
                }
                None => output.push('%'),
            },
            _ => output.push(c),
        }
    }
    consumed
}
