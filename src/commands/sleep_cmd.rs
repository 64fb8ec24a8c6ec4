// src/commands/sleep_cmd.rs
use async_trait::async_trait;
use regex_lite::Regex;

use crate::commands::{Command, CommandContext, CommandResult};

pub struct SleepCommand;

const HELP: &str = "Usage: sleep NUMBER[SUFFIX]\n\ndelay for a specified amount of time\n\nSUFFIX may be:\n  s - seconds (default)\n  m - minutes\n  h - hours\n  d - days\n\nNUMBER may be a decimal number.\n";

fn parse_duration_ms(arg: &str) -> Option<f64> {
    let re = Regex::new(r"^(\d+\.?\d*)(s|m|h|d)?$").unwrap();
    let caps = re.captures(arg)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    let suffix = caps.get(2).map(|m| m.as_str()).unwrap_or("s");
    match suffix {
        "s" => Some(value * 1000.0),
        "m" => Some(value * 60.0 * 1000.0),
        "h" => Some(value * 3600.0 * 1000.0),
        "d" => Some(value * 86400.0 * 1000.0),
        _ => None,
    }
}

#[async_trait]
impl Command for SleepCommand {
    fn name(&self) -> &str {
        "sleep"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let args = &ctx.args;
        if args.iter().any(|a| a == "--help") {
            return CommandResult::success(HELP.into());
        }
        if args.is_empty() {
            return CommandResult::with_exit_code("".into(), "sleep: missing operand\n".into(), 1);
        }
        let mut total_ms: f64 = 0.0;
        for arg in args {
            match parse_duration_ms(arg) {
                Some(ms) => total_ms += ms,
                None => {
                    return CommandResult::with_exit_code(
                        "".into(),
                        format!("sleep: invalid time interval '{}'\n", arg),
                        1,
                    )
                }
            }
        }
        tokio::time::sleep(std::time::Duration::from_millis(total_ms as u64)).await;
        CommandResult::success("".into())
    }
}
