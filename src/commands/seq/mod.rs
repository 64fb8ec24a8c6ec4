// src/commands/seq/mod.rs
use async_trait::async_trait;

use crate::commands::{StreamContext, StreamingCommand};

pub struct SeqCommand;

const HELP: &str = "Usage: seq [OPTION]... LAST\n       seq FIRST [INCREMENT] LAST\n\n\
Print numbers from FIRST to LAST, in steps of INCREMENT.\n\n\
Options:\n\
  -s STRING    use STRING to separate numbers (default: \\n)\n\
  -w           equalize width by padding with leading zeroes\n\
      --help   display this help and exit\n";

struct SeqArgs {
    first: i64,
    increment: i64,
    last: i64,
    separator: String,
    equal_width: bool,
}

fn parse_args(args: &[String]) -> Result<SeqArgs, String> {
    let mut separator = "\n".to_string();
    let mut equal_width = false;
    let mut numbers: Vec<i64> = Vec::new();

    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        if arg == "-s" {
            i += 1;
            separator = args
                .get(i)
                .cloned()
                .ok_or_else(|| "option requires an argument -- 's'".to_string())?;
        } else if let Some(rest) = arg.strip_prefix("-s").filter(|r| !r.is_empty()) {
            separator = rest.to_string();
        } else if arg == "-w" {
            equal_width = true;
        } else {
            numbers.push(parse_number(arg)?);
        }
        i += 1;
    }

    let (first, increment, last) = match numbers.len() {
        1 => (1, 1, numbers[0]),
        2 => (numbers[0], 1, numbers[1]),
        3 => (numbers[0], numbers[1], numbers[2]),
        0 => return Err("missing operand".to_string()),
        _ => return Err(format!("extra operand '{}'", numbers[3])),
    };
    if increment == 0 {
        return Err("invalid Zero increment value: '0'".to_string());
    }
    Ok(SeqArgs {
        first,
        increment,
        last,
        separator,
        equal_width,
    })
}

fn parse_number(arg: &str) -> Result<i64, String> {
    arg.parse::<i64>()
        .map_err(|_| format!("invalid floating point argument: '{}'", arg))
}

#[async_trait]
impl StreamingCommand for SeqCommand {
    fn name(&self) -> &str {
        "seq"
    }

    async fn run(&self, ctx: StreamContext) -> i32 {
        if ctx.args.iter().any(|a| a == "--help") {
            ctx.stdout.write_str(HELP).await;
            return 0;
        }

        let parsed = match parse_args(&ctx.args) {
            Ok(p) => p,
            Err(msg) => {
                ctx.stderr.write_str(&format!("seq: {}\n", msg)).await;
                return 1;
            }
        };

        let width = if parsed.equal_width {
            let first_len = parsed.first.to_string().len();
            let last_len = parsed.last.to_string().len();
            first_len.max(last_len)
        } else {
            0
        };

        let mut current = parsed.first;
        let mut emitted_any = false;
        while (parsed.increment > 0 && current <= parsed.last)
            || (parsed.increment < 0 && current >= parsed.last)
        {
            let mut piece = String::new();
            if emitted_any {
                piece.push_str(&parsed.separator);
            }
            if parsed.equal_width {
                piece.push_str(&format!("{:0width$}", current, width = width));
            } else {
                piece.push_str(&current.to_string());
            }
            if !ctx.stdout.write_str(&piece).await {
                return 0;
            }
            emitted_any = true;
            current += parsed.increment;
        }
        if emitted_any && !ctx.stdout.write_str("\n").await {
            return 0;
        }
        0
    }
}
