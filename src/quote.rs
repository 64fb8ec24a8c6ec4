//! Shell-safe command interpolation
//!
//! Builds command strings from template segments and interpolated values.
//! Values are auto-quoted so that they can never change the shell-parse
//! structure of the surrounding template. `raw` and `literal` are the two
//! escape hatches: `raw` splices verbatim, `literal` forces single quotes.

/// An interpolated value, tagged with how it should be spliced into the
/// command string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interp {
    /// Absent value, rendered as an empty quoted token `''`.
    None,
    /// Plain text, auto-quoted by [`quote`].
    Text(String),
    /// A sequence of values, each auto-quoted, joined by single spaces.
    List(Vec<String>),
    /// Spliced verbatim with no escaping.
    Raw(String),
    /// Forced single-quote wrapping regardless of content.
    Literal(String),
}

/// Mark a value to be spliced verbatim with no escaping.
pub fn raw(value: impl Into<String>) -> Interp {
    Interp::Raw(value.into())
}

/// Force single-quote wrapping, escaping embedded single quotes as `'\''`.
pub fn literal(value: impl Into<String>) -> Interp {
    Interp::Literal(value.into())
}

impl From<&str> for Interp {
    fn from(value: &str) -> Self {
        Interp::Text(value.to_string())
    }
}

impl From<String> for Interp {
    fn from(value: String) -> Self {
        Interp::Text(value)
    }
}

impl From<Vec<String>> for Interp {
    fn from(values: Vec<String>) -> Self {
        Interp::List(values)
    }
}

impl From<&[&str]> for Interp {
    fn from(values: &[&str]) -> Self {
        Interp::List(values.iter().map(|s| s.to_string()).collect())
    }
}

impl<T: Into<Interp>> From<Option<T>> for Interp {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Interp::None,
        }
    }
}

macro_rules! interp_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Interp {
            fn from(value: $t) -> Self {
                Interp::Text(value.to_string())
            }
        })*
    };
}

interp_from_int!(i32, i64, u32, u64, usize, isize);

/// Check if a value needs no quoting at all.
/// Safe chars: alphanumerics, underscore, at, percent, plus, equals, colon,
/// comma, dot, slash, hyphen.
fn is_safe_unquoted(value: &str) -> bool {
    !value.is_empty()
        && value.chars().all(|c| {
            c.is_ascii_alphanumeric()
                || matches!(c, '_' | '@' | '%' | '+' | '=' | ':' | ',' | '.' | '/' | '-')
        })
}

/// Wrap in single quotes, escaping embedded single quotes as `'\''`.
fn single_quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        if c == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(c);
        }
    }
    out.push('\'');
    out
}

/// Produce a shell-safe single token.
///
/// Values in the safe character class pass through unchanged. A value that
/// is already a well-formed single-quoted string is preserved as-is, so
/// quoting is idempotent with a prior [`literal`]. A double-quoted value is
/// re-wrapped in single quotes; this module never emits double quotes.
pub fn quote(value: &str) -> String {
    if value.is_empty() {
        return "''".to_string();
    }
    if is_safe_unquoted(value) {
        return value.to_string();
    }
    if value.len() >= 2
        && value.starts_with('\'')
        && value.ends_with('\'')
        && !value[1..value.len() - 1].contains('\'')
    {
        return value.to_string();
    }
    single_quote(value)
}

/// Quote each element and join with single spaces.
///
/// Pitfall: a caller who joins a sequence into one string before passing it
/// loses the per-element boundary; pass the sequence itself instead.
pub fn quote_list<S: AsRef<str>>(values: &[S]) -> String {
    values
        .iter()
        .map(|v| quote(v.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn render(value: &Interp) -> String {
    match value {
        Interp::None => "''".to_string(),
        Interp::Text(s) => quote(s),
        Interp::List(items) => quote_list(items),
        Interp::Raw(s) => s.clone(),
        Interp::Literal(s) => single_quote(s),
    }
}

/// Interleave literal template segments with interpolated values.
///
/// `segments` has one more element than `values`; each value is rendered
/// between its surrounding segments. Extra values beyond the segments are
/// appended at the end.
pub fn build_command(segments: &[&str], values: &[Interp]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        out.push_str(segment);
        if let Some(value) = values.get(i) {
            out.push_str(&render(value));
        }
    }
    for value in values.iter().skip(segments.len()) {
        out.push_str(&render(value));
    }
    out
}
