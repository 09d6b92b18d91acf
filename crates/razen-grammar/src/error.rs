use thiserror::Error;

/// A grammar that cannot be compiled into a table.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("grammar `{0}` has no rules")]
    MissingStart(String),
    #[error("start rule `{0}` must not be hidden")]
    HiddenStart(String),
    #[error("symbol `{0}` is defined more than once")]
    DuplicateRule(String),
    #[error("rule `{rule}` refers to undefined symbol `{symbol}`")]
    UndefinedSymbol { rule: String, symbol: String },
    #[error("rule `{0}` cannot derive any finite text")]
    UnproductiveRule(String),
    #[error("word token `{0}` is not a scanned token")]
    InvalidWord(String),
    #[error("token `{0}` is not produced by the scanner")]
    UnscannedToken(String),
    #[error("rule `{0}` repeats a rule that matches the empty string")]
    EmptyRepeat(String),
    #[error("rule `{0}` contains an empty literal")]
    EmptyLiteral(String),
    #[error("grammar has more than {limit} {what}")]
    TooMany { what: &'static str, limit: usize },
    #[error("unresolved conflict in state {state}: {description}")]
    Conflict { state: usize, description: String },
    #[error("no language named `{0}` is registered")]
    UnknownLanguage(String),
    #[error("tree was parsed with {found}, not {expected}")]
    IncompatibleTree { expected: String, found: String },
}
