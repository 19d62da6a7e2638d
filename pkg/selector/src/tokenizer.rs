use pkg_constants::policy::MAX_LABEL_NAME_LEN;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::error::SelectorError;

/// A lexical token of the selector language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Label(String),
    StringLiteral(String),
    LBrace,
    RBrace,
    Comma,
    Eq,
    Ne,
    In,
    Not,
    NotIn,
    Contains,
    StartsWith,
    EndsWith,
    All,
    Has(String),
    LParen,
    RParen,
    And,
    Or,
    Global,
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Label(name) => write!(f, "label '{}'", name),
            Token::StringLiteral(value) => write!(f, "string \"{}\"", value),
            Token::LBrace => f.write_str("'{'"),
            Token::RBrace => f.write_str("'}'"),
            Token::Comma => f.write_str("','"),
            Token::Eq => f.write_str("'=='"),
            Token::Ne => f.write_str("'!='"),
            Token::In => f.write_str("'in'"),
            Token::Not => f.write_str("'!'"),
            Token::NotIn => f.write_str("'not in'"),
            Token::Contains => f.write_str("'contains'"),
            Token::StartsWith => f.write_str("'starts with'"),
            Token::EndsWith => f.write_str("'ends with'"),
            Token::All => f.write_str("'all()'"),
            Token::Has(name) => write!(f, "'has({})'", name),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::And => f.write_str("'&&'"),
            Token::Or => f.write_str("'||'"),
            Token::Global => f.write_str("'global()'"),
            Token::Eof => f.write_str("end of selector"),
        }
    }
}

const WHITESPACE: &[char] = &[' ', '\t'];

static LABEL_KEY: LazyLock<String> =
    LazyLock::new(|| format!("[a-zA-Z0-9_./-]{{1,{}}}", MAX_LABEL_NAME_LEN));

fn anchored(pattern: &str) -> Regex {
    Regex::new(&format!("^{}", pattern)).expect("selector token pattern must compile")
}

static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| anchored(&LABEL_KEY));
static HAS_RE: LazyLock<Regex> =
    LazyLock::new(|| anchored(&format!(r"has\(\s*({})\s*\)", *LABEL_KEY)));
static ALL_RE: LazyLock<Regex> = LazyLock::new(|| anchored(r"all\(\s*\)"));
static GLOBAL_RE: LazyLock<Regex> = LazyLock::new(|| anchored(r"global\(\s*\)"));
static CONTAINS_RE: LazyLock<Regex> = LazyLock::new(|| anchored("contains"));
static STARTS_WITH_RE: LazyLock<Regex> = LazyLock::new(|| anchored(r"starts\s*with"));
static ENDS_WITH_RE: LazyLock<Regex> = LazyLock::new(|| anchored(r"ends\s*with"));
static NOT_IN_RE: LazyLock<Regex> = LazyLock::new(|| anchored(r"not\s*in\b"));
static IN_RE: LazyLock<Regex> = LazyLock::new(|| anchored(r"in\b"));

/// Split a selector string into tokens. The result always ends with [`Token::Eof`].
pub fn tokenize(input: &str) -> Result<Vec<Token>, SelectorError> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut s = input;

    loop {
        let start_len = s.len();
        s = s.trim_start_matches(WHITESPACE);
        if s.is_empty() {
            tokens.push(Token::Eof);
            break;
        }

        let after_label = matches!(tokens.last(), Some(Token::Label(_)));
        let bytes = s.as_bytes();
        let next = bytes.get(1).copied();

        let (token, consumed) = match bytes[0] {
            b'(' => (Token::LParen, 1),
            b')' => (Token::RParen, 1),
            b'{' => (Token::LBrace, 1),
            b'}' => (Token::RBrace, 1),
            b',' => (Token::Comma, 1),
            b'"' => quoted(s, '"', "double")?,
            b'\'' => quoted(s, '\'', "single")?,
            b'=' if next == Some(b'=') => (Token::Eq, 2),
            b'=' => return Err(SelectorError::IncompleteOperator("==")),
            b'!' if next == Some(b'=') => (Token::Ne, 2),
            b'!' => (Token::Not, 1),
            b'&' if next == Some(b'&') => (Token::And, 2),
            b'&' => return Err(SelectorError::IncompleteOperator("&&")),
            b'|' if next == Some(b'|') => (Token::Or, 2),
            b'|' => return Err(SelectorError::IncompleteOperator("||")),
            _ if after_label => label_operator(s, &tokens)?,
            _ => keyword_or_label(s)?,
        };

        tokens.push(token);
        s = &s[consumed..];

        if s.len() >= start_len {
            return Err(SelectorError::NoProgress(s.to_string()));
        }
    }

    Ok(tokens)
}

/// Scan a literal opened by `quote`. Returns the token and the bytes consumed
/// including both quotes.
fn quoted(s: &str, quote: char, kind: &'static str) -> Result<(Token, usize), SelectorError> {
    let body = &s[1..];
    match body.find(quote) {
        Some(end) => Ok((Token::StringLiteral(body[..end].to_string()), end + 2)),
        None => Err(SelectorError::UnterminatedQuote(kind)),
    }
}

/// Directly after a label only comparison keywords are legal.
fn label_operator(s: &str, tokens: &[Token]) -> Result<(Token, usize), SelectorError> {
    let probes: [(&Regex, Token); 5] = [
        (&CONTAINS_RE, Token::Contains),
        (&STARTS_WITH_RE, Token::StartsWith),
        (&ENDS_WITH_RE, Token::EndsWith),
        (&NOT_IN_RE, Token::NotIn),
        (&IN_RE, Token::In),
    ];
    for (re, token) in probes {
        if let Some(m) = re.find(s) {
            return Ok((token, m.end()));
        }
    }
    let label = match tokens.last() {
        Some(Token::Label(name)) => name.clone(),
        _ => String::new(),
    };
    Err(SelectorError::ExpectedOperator { label })
}

fn keyword_or_label(s: &str) -> Result<(Token, usize), SelectorError> {
    if let Some(caps) = HAS_RE.captures(s) {
        let whole = caps.get(0).map_or(0, |m| m.end());
        let name = caps.get(1).map_or("", |m| m.as_str());
        return Ok((Token::Has(name.to_string()), whole));
    }
    if let Some(m) = ALL_RE.find(s) {
        return Ok((Token::All, m.end()));
    }
    if let Some(m) = GLOBAL_RE.find(s) {
        return Ok((Token::Global, m.end()));
    }
    if let Some(m) = IDENTIFIER_RE.find(s) {
        return Ok((Token::Label(m.as_str().to_string()), m.end()));
    }
    Err(SelectorError::UnexpectedCharacters(s.to_string()))
}
