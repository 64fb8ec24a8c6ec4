// src/commands/which_cmd.rs
use async_trait::async_trait;

use crate::commands::utils::search_path;
use crate::commands::{registry, Command, CommandContext, CommandResult};

pub struct WhichCommand;

const HELP: &str = "which - locate a command

Usage: which [-as] program ...

Options:
  -a         List all instances of executables found
  -s         No output, just return 0 if found, 1 if not
  --help     display this help and exit";

#[async_trait]
impl Command for WhichCommand {
    fn name(&self) -> &str {
        "which"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let mut show_all = false;
        let mut silent = false;
        let mut names = Vec::new();

        for arg in &ctx.args {
            match arg.as_str() {
                "--help" => return CommandResult::success(format!("{}\n", HELP)),
                "-a" => show_all = true,
                "-s" => silent = true,
                s if s.starts_with('-') => {
                    for c in s.chars().skip(1) {
                        match c {
                            'a' => show_all = true,
                            's' => silent = true,
                            _ => {}
                        }
                    }
                }
                _ => names.push(arg.clone()),
            }
        }

        if names.is_empty() {
            return CommandResult::with_exit_code(String::new(), String::new(), 1);
        }

        let path_env = ctx.env.get("PATH").cloned().unwrap_or_default();
        let mut stdout = String::new();
        let mut exit_code = 0;

        for name in &names {
            let mut found = false;
            // Virtual hits only count while the registry is enabled; a
            // virtual command has no filesystem path, so print its name.
            if registry::has(name) {
                found = true;
                if !silent {
                    stdout.push_str(name);
                    stdout.push('\n');
                }
                if !show_all {
                    continue;
                }
            }
            if let Some(path) = search_path(name, &path_env) {
                found = true;
                if !silent {
                    stdout.push_str(&format!("{}\n", path.display()));
                }
            }
            if !found {
                exit_code = 1;
            }
        }

        CommandResult::with_exit_code(stdout, String::new(), exit_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::types::test_context;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_finds_external_program() {
        let mut ctx = test_context(vec!["sh"], "");
        ctx.env
            .insert("PATH".to_string(), "/usr/bin:/bin".to_string());
        let r = WhichCommand.execute(ctx).await;
        assert_eq!(r.exit_code, 0);
        assert!(r.stdout.starts_with('/'));
        assert!(r.stdout.ends_with("/sh\n"));
    }

    #[tokio::test]
    async fn test_absent_program_fails() {
        let mut ctx = test_context(vec!["definitely-not-installed-xyz"], "");
        ctx.env
            .insert("PATH".to_string(), "/usr/bin:/bin".to_string());
        let r = WhichCommand.execute(ctx).await;
        assert_eq!(r.exit_code, 1);
        assert_eq!(r.stdout, "");
    }

    #[tokio::test]
    async fn test_virtual_hit_prints_name() {
        let _guard = crate::test_util::lock_global();
        let mut ctx = test_context(vec!["echo"], "");
        ctx.env.insert("PATH".to_string(), String::new());
        let r = WhichCommand.execute(ctx).await;
        assert_eq!(r.exit_code, 0);
        assert_eq!(r.stdout, "echo\n");
    }
}
