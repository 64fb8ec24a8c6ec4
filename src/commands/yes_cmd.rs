// src/commands/yes_cmd.rs
use async_trait::async_trait;

use crate::commands::{StreamContext, StreamingCommand};

/// Repeats its arguments (default `y`) until the consumer goes away or
/// the stage is cancelled.
pub struct YesCommand;

#[async_trait]
impl StreamingCommand for YesCommand {
    fn name(&self) -> &str {
        "yes"
    }

    async fn run(&self, ctx: StreamContext) -> i32 {
        let line = if ctx.args.is_empty() {
            "y\n".to_string()
        } else {
            format!("{}\n", ctx.args.join(" "))
        };
        loop {
            if !ctx.stdout.write_str(&line).await {
                return 0;
            }
        }
    }
}
