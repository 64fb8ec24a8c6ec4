//! Command Scanner
//!
//! Quote-aware scan of a command string. Tracks single- and double-quoted
//! regions (metacharacters inside them are literal), splits tokens on
//! unquoted whitespace, splits stages on unquoted `|`, and bails out to
//! the host shell on any other unquoted operator.

use crate::error::Error;

/// Characters that, unquoted, force a real shell invocation. `|` is
/// handled separately as the pipeline separator; `||` escalates.
const SHELL_ONLY: &[char] = &[';', '&', '<', '>', '$', '`', '*', '?', '~', '('];

/// Scanner output: either the token lists of each pipeline stage, or a
/// marker that the string contains shell-only operators.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Scan {
    Stages(Vec<Vec<String>>),
    NeedsShell,
}

/// Scan `input` into stages. With `operators` false, metacharacters are
/// ordinary bytes and the result is always a single stage.
pub(crate) fn scan(input: &str, operators: bool) -> Result<Scan, Error> {
    let mut stages: Vec<Vec<String>> = Vec::new();
    let mut tokens: Vec<String> = Vec::new();
    let mut token = String::new();
    // Distinguishes an empty quoted token `''` from no token at all.
    let mut has_token = false;

    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                has_token = true;
                let mut closed = false;
                for inner in chars.by_ref() {
                    if inner == '\'' {
                        closed = true;
                        break;
                    }
                    token.push(inner);
                }
                if !closed {
                    return Err(Error::ParseFailed("unterminated single quote".to_string()));
                }
            }
            '"' => {
                has_token = true;
                let mut closed = false;
                while let Some(inner) = chars.next() {
                    match inner {
                        '"' => {
                            closed = true;
                            break;
                        }
                        '\\' => match chars.next() {
                            Some(esc @ ('"' | '\\' | '$' | '`')) => token.push(esc),
                            Some(other) => {
                                token.push('\\');
                                token.push(other);
                            }
                            None => {
                                return Err(Error::ParseFailed(
                                    "unterminated double quote".to_string(),
                                ))
                            }
                        },
                        _ => token.push(inner),
                    }
                }
                if !closed {
                    return Err(Error::ParseFailed("unterminated double quote".to_string()));
                }
            }
            '\\' => {
                has_token = true;
                match chars.next() {
                    Some(esc) => token.push(esc),
                    None => token.push('\\'),
                }
            }
            _ if c.is_whitespace() => {
                if has_token || !token.is_empty() {
                    tokens.push(std::mem::take(&mut token));
                    has_token = false;
                }
            }
            '|' if operators => {
                if chars.peek() == Some(&'|') {
                    return Ok(Scan::NeedsShell);
                }
                if has_token || !token.is_empty() {
                    tokens.push(std::mem::take(&mut token));
                    has_token = false;
                }
                if tokens.is_empty() {
                    return Err(Error::ParseFailed("empty pipeline stage".to_string()));
                }
                stages.push(std::mem::take(&mut tokens));
            }
            _ if operators && SHELL_ONLY.contains(&c) => {
                return Ok(Scan::NeedsShell);
            }
            _ => {
                has_token = true;
                token.push(c);
            }
        }
    }

    if has_token || !token.is_empty() {
        tokens.push(token);
    }
    if tokens.is_empty() {
        if stages.is_empty() {
            return Err(Error::ParseFailed("empty command".to_string()));
        }
        return Err(Error::ParseFailed("empty pipeline stage".to_string()));
    }
    stages.push(tokens);
    Ok(Scan::Stages(stages))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stages(input: &str) -> Vec<Vec<String>> {
        match scan(input, true).unwrap() {
            Scan::Stages(s) => s,
            Scan::NeedsShell => panic!("unexpected NeedsShell for {:?}", input),
        }
    }

    #[test]
    fn test_whitespace_split() {
        assert_eq!(stages("echo  hello\tworld"), vec![vec!["echo", "hello", "world"]]);
    }

    #[test]
    fn test_single_quotes_preserve_content() {
        assert_eq!(stages("echo 'a | b'"), vec![vec!["echo", "a | b"]]);
    }

    #[test]
    fn test_double_quote_escapes() {
        assert_eq!(stages(r#"echo "a\"b" "c\\d" "e\nf""#), vec![vec![
            "echo", "a\"b", "c\\d", "e\\nf"
        ]]);
    }

    #[test]
    fn test_adjacent_quoted_parts_are_one_token() {
        assert_eq!(stages("echo a'b c'd"), vec![vec!["echo", "ab cd"]]);
    }

    #[test]
    fn test_empty_quoted_token_survives() {
        assert_eq!(stages("printf ''"), vec![vec!["printf", ""]]);
    }

    #[test]
    fn test_pipe_splits_stages() {
        assert_eq!(
            stages("seq 1 3 | cat"),
            vec![vec!["seq", "1", "3"], vec!["cat"]]
        );
    }

    #[test]
    fn test_operators_force_shell() {
        for input in [
            "a; b", "a && b", "a || b", "a > f", "a < f", "cat <<EOF", "echo $HOME",
            "echo `id`", "ls *.rs", "ls ?", "ls ~", "(a)", "a & ", "ls 2>&1",
        ] {
            assert_eq!(scan(input, true).unwrap(), Scan::NeedsShell, "input {:?}", input);
        }
    }

    #[test]
    fn test_quoted_operators_are_literal() {
        assert_eq!(stages("echo ';' \"&&\" '$HOME'"), vec![vec![
            "echo", ";", "&&", "$HOME"
        ]]);
    }

    #[test]
    fn test_backslash_escapes_operator() {
        assert_eq!(stages(r"echo \;"), vec![vec!["echo", ";"]]);
    }

    #[test]
    fn test_unterminated_quote_is_error() {
        assert!(matches!(scan("echo 'oops", true), Err(Error::ParseFailed(_))));
        assert!(matches!(scan("echo \"oops", true), Err(Error::ParseFailed(_))));
    }

    #[test]
    fn test_empty_input_is_error() {
        assert!(matches!(scan("", true), Err(Error::ParseFailed(_))));
        assert!(matches!(scan("   ", true), Err(Error::ParseFailed(_))));
    }

    #[test]
    fn test_dangling_pipe_is_error() {
        assert!(matches!(scan("a |", true), Err(Error::ParseFailed(_))));
        assert!(matches!(scan("| a", true), Err(Error::ParseFailed(_))));
    }

    #[test]
    fn test_operator_free_mode_keeps_metachars() {
        assert_eq!(
            scan("grep -v a|b", false).unwrap(),
            Scan::Stages(vec![vec![
                "grep".to_string(),
                "-v".to_string(),
                "a|b".to_string()
            ]])
        );
    }
}
