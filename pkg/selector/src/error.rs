use thiserror::Error;

/// Reasons a selector string fails to compile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("unterminated {0} quote")]
    UnterminatedQuote(&'static str),

    #[error("expected {0}")]
    IncompleteOperator(&'static str),

    #[error("unexpected characters after label '{label}', was expecting an operator")]
    ExpectedOperator { label: String },

    #[error("unexpected characters at '{0}'")]
    UnexpectedCharacters(String),

    #[error("tokenizer made no progress at '{0}'")]
    NoProgress(String),

    #[error("unexpected end of selector")]
    UnexpectedEnd,

    #[error("unexpected token: {0}")]
    UnexpectedToken(String),

    #[error("expected a comparison operator after label '{label}', found {found}")]
    ExpectedComparison { label: String, found: String },

    #[error("expected string literal after '{label}', found {found}")]
    ExpectedString { label: String, found: String },

    #[error("expected set literal after '{label}'")]
    ExpectedSet { label: String },

    #[error("expected '}}' to close set for '{label}'")]
    UnclosedSet { label: String },

    #[error("expected ')'")]
    UnclosedParen,

    #[error("unexpected content at the end of selector: {0}")]
    TrailingContent(String),
}
