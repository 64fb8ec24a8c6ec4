// src/commands/cat/mod.rs
use async_trait::async_trait;
use tokio::io::AsyncReadExt;

use crate::commands::utils::resolve_path;
use crate::commands::{StreamContext, StreamingCommand};

pub struct CatCommand;

const READ_CHUNK: usize = 8192;

const HELP: &str = "Usage: cat [OPTION]... [FILE]...\n\n\
Concatenate FILE(s) to standard output.\n\n\
Options:\n\
  -n, --number     number all output lines\n\
      --help       display this help and exit\n";

/// Carries line-numbering state across chunks.
struct Numberer {
    next_line: usize,
    at_line_start: bool,
}

impl Numberer {
    fn new() -> Self {
        Self {
            next_line: 1,
            at_line_start: true,
        }
    }

    fn apply(&mut self, chunk: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(chunk.len());
        for &b in chunk {
            if self.at_line_start {
                out.extend_from_slice(format!("{:6}\t", self.next_line).as_bytes());
                self.next_line += 1;
                self.at_line_start = false;
            }
            out.push(b);
            if b == b'\n' {
                self.at_line_start = true;
            }
        }
        out
    }
}

#[async_trait]
impl StreamingCommand for CatCommand {
    fn name(&self) -> &str {
        "cat"
    }

    async fn run(&self, mut ctx: StreamContext) -> i32 {
        if ctx.args.iter().any(|a| a == "--help") {
            ctx.stdout.write_str(HELP).await;
            return 0;
        }

        let mut number = false;
        let mut files: Vec<String> = Vec::new();
        for arg in &ctx.args {
            match arg.as_str() {
                "-n" | "--number" => number = true,
                _ if !arg.starts_with('-') || arg == "-" => files.push(arg.clone()),
                _ => {}
            }
        }
        if files.is_empty() {
            files.push("-".to_string());
        }

        let mut numberer = number.then(Numberer::new);
        let mut exit_code = 0;

        for file in &files {
            if file == "-" {
                while let Some(chunk) = ctx.input.next().await {
                    let data = match numberer.as_mut() {
                        Some(n) => n.apply(&chunk),
                        None => chunk,
                    };
                    if !ctx.stdout.write(data).await {
                        return 0;
                    }
                }
                continue;
            }
            let path = resolve_path(&ctx.cwd, file);
            let mut handle = match tokio::fs::File::open(&path).await {
                Ok(h) => h,
                Err(_) => {
                    ctx.stderr
                        .write_str(&format!("cat: {}: No such file or directory\n", file))
                        .await;
                    exit_code = 1;
                    continue;
                }
            };
            let mut buf = vec![0u8; READ_CHUNK];
            loop {
                match handle.read(&mut buf).await {
                    Ok(0) => break,
                    Ok(n) => {
                        let data = match numberer.as_mut() {
                            Some(num) => num.apply(&buf[..n]),
                            None => buf[..n].to_vec(),
                        };
                        if !ctx.stdout.write(data).await {
                            return 0;
                        }
                    }
                    Err(e) => {
                        ctx.stderr
                            .write_str(&format!("cat: {}: {}\n", file, e))
                            .await;
                        exit_code = 1;
                        break;
                    }
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
    fn test_numberer_across_chunk_boundary() {
        let mut n = Numberer::new();
        let mut out = n.apply(b"ab");
        out.extend(n.apply(b"c\nd\n"));
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "     1\tabc\n     2\td\n"
        );
    }
}
