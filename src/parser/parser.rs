//! Command Parser
//!
//! Public entry points over the scanner: classify a command string as a
//! simple invocation, a pipeline, or shell-only; and the operator-free
//! tokenization used when shell operators are disabled for a run.

use crate::error::Error;
use crate::parser::lexer::{scan, Scan};
use crate::parser::types::{ParsedCommand, Stage};

/// Decompose a command string.
pub fn parse(command: &str) -> Result<ParsedCommand, Error> {
    match scan(command, true)? {
        Scan::NeedsShell => Ok(ParsedCommand::NeedsShell),
        Scan::Stages(stages) => {
            let mut stages: Vec<Stage> = stages.into_iter().map(Stage::from_tokens).collect();
            if stages.len() == 1 {
                Ok(ParsedCommand::Simple(stages.remove(0)))
            } else {
                Ok(ParsedCommand::Pipeline(stages))
            }
        }
    }
}

/// Tokenize a command string as a single invocation, treating shell
/// metacharacters as ordinary argument bytes.
pub fn parse_words(command: &str) -> Result<Stage, Error> {
    match scan(command, false)? {
        Scan::Stages(mut stages) => Ok(Stage::from_tokens(stages.remove(0))),
        Scan::NeedsShell => unreachable!("operator-free scan cannot need a shell"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple() {
        match parse("echo hello").unwrap() {
            ParsedCommand::Simple(stage) => {
                assert_eq!(stage.program, "echo");
                assert_eq!(stage.args, vec!["hello"]);
            }
            other => panic!("expected Simple, got {:?}", other),
        }
    }

    #[test]
    fn test_pipeline() {
        match parse("printf 'a\\nb' | wc -l").unwrap() {
            ParsedCommand::Pipeline(stages) => {
                assert_eq!(stages.len(), 2);
                assert_eq!(stages[0].program, "printf");
                assert_eq!(stages[1].argv(), vec!["wc", "-l"]);
            }
            other => panic!("expected Pipeline, got {:?}", other),
        }
    }

    #[test]
    fn test_needs_shell() {
        assert_eq!(parse("echo a && echo b").unwrap(), ParsedCommand::NeedsShell);
        assert_eq!(parse("echo hi > out.txt").unwrap(), ParsedCommand::NeedsShell);
    }

    #[test]
    fn test_quoted_pipe_stays_simple() {
        match parse("echo 'a | b'").unwrap() {
            ParsedCommand::Simple(stage) => assert_eq!(stage.args, vec!["a | b"]),
            other => panic!("expected Simple, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_is_parse_error() {
        assert!(parse("").is_err());
    }

    #[test]
    fn test_parse_words_ignores_operators() {
        let stage = parse_words("echo a;b > c").unwrap();
        assert_eq!(stage.program, "echo");
        assert_eq!(stage.args, vec!["a;b", ">", "c"]);
    }
}
