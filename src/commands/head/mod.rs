// src/commands/head/mod.rs
use async_trait::async_trait;

use crate::commands::utils::resolve_path;
use crate::commands::{StreamContext, StreamingCommand};

pub struct HeadCommand;

const HELP: &str = "Usage: head [OPTION]... [FILE]...\n\n\
Print the first 10 lines of each FILE to standard output.\n\n\
Options:\n\
  -n NUM       print the first NUM lines instead of 10\n\
  -c NUM       print the first NUM bytes\n\
      --help   display this help and exit\n";

#[derive(Clone)]
enum Limit {
    Lines(usize),
    Bytes(usize),
}

fn parse_args(args: &[String]) -> Result<(Limit, Vec<String>), String> {
    let mut limit = Limit::Lines(10);
    let mut files = Vec::new();
    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        if arg == "-n" || arg == "-c" {
            i += 1;
            let value = args
                .get(i)
                .ok_or_else(|| format!("option requires an argument -- '{}'", &arg[1..]))?;
            let n: usize = value
                .parse()
                .map_err(|_| format!("invalid number of lines: '{}'", value))?;
            limit = if arg == "-n" {
                Limit::Lines(n)
            } else {
                Limit::Bytes(n)
            };
        } else if let Some(rest) = arg.strip_prefix("-n") {
            let n: usize = rest
                .parse()
                .map_err(|_| format!("invalid number of lines: '{}'", rest))?;
            limit = Limit::Lines(n);
        } else if !arg.starts_with('-') || arg == "-" {
            files.push(arg.clone());
        }
        i += 1;
    }
    Ok((limit, files))
}

/// Emit a prefix of `chunk` against the remaining budget. Returns the
/// bytes to write and whether the budget is now exhausted.
fn take_budget(limit: &mut Limit, chunk: &[u8]) -> (Vec<u8>, bool) {
    match limit {
        Limit::Bytes(remaining) => {
            let take = chunk.len().min(*remaining);
            *remaining -= take;
            (chunk[..take].to_vec(), *remaining == 0)
        }
        Limit::Lines(remaining) => {
            let mut end = 0;
            for (i, &b) in chunk.iter().enumerate() {
                if *remaining == 0 {
                    break;
                }
                if b == b'\n' {
                    *remaining -= 1;
                }
                end = i + 1;
            }
            if *remaining == 0 {
                (chunk[..end].to_vec(), true)
            } else {
                (chunk.to_vec(), false)
            }
        }
    }
}

#[async_trait]
impl StreamingCommand for HeadCommand {
    fn name(&self) -> &str {
        "head"
    }

    async fn run(&self, mut ctx: StreamContext) -> i32 {
        if ctx.args.iter().any(|a| a == "--help") {
            ctx.stdout.write_str(HELP).await;
            return 0;
        }

        let (mut limit, files) = match parse_args(&ctx.args) {
            Ok(parsed) => parsed,
            Err(msg) => {
                ctx.stderr.write_str(&format!("head: {}\n", msg)).await;
                return 1;
            }
        };

        if files.is_empty() || files == ["-"] {
            // Dropping the input early propagates backpressure upstream,
            // the way SIGPIPE stops a real pipeline head.
            while let Some(chunk) = ctx.input.next().await {
                let (data, done) = take_budget(&mut limit, &chunk);
                if !data.is_empty() && !ctx.stdout.write(data).await {
                    return 0;
                }
                if done {
                    return 0;
                }
            }
            return 0;
        }

        let mut exit_code = 0;
        for file in &files {
            let path = resolve_path(&ctx.cwd, file);
            match tokio::fs::read(&path).await {
                Ok(content) => {
                    let mut budget = limit.clone();
                    let (data, _) = take_budget(&mut budget, &content);
                    if !ctx.stdout.write(data).await {
                        return 0;
                    }
                }
                Err(_) => {
                    ctx.stderr
                        .write_str(&format!(
                            "head: cannot open '{}' for reading: No such file or directory\n",
                            file
                        ))
                        .await;
                    exit_code = 1;
                }
            }
        }
        exit_code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_budget_spans_chunks() {
        let mut limit = Limit::Lines(2);
        let (out, done) = take_budget(&mut limit, b"a\nb");
        assert_eq!(out, b"a\nb");
        assert!(!done);
        let (out, done) = take_budget(&mut limit, b"\nc\n");
        assert_eq!(out, b"\n");
        assert!(done);
    }

    #[test]
    fn test_byte_budget() {
        let mut limit = Limit::Bytes(3);
        let (out, done) = take_budget(&mut limit, b"abcdef");
        assert_eq!(out, b"abc");
        assert!(done);
    }

    #[test]
    fn test_parse_n_variants() {
        let (limit, files) = parse_args(&["-n".to_string(), "3".to_string()]).unwrap();
        assert!(matches!(limit, Limit::Lines(3)));
        assert!(files.is_empty());

        let (limit, _) = parse_args(&["-n5".to_string()]).unwrap();
        assert!(matches!(limit, Limit::Lines(5)));
    }
}
