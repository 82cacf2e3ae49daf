//! Flat keyword tokenizer for statement classification
//!
//! Produces a keyword/identifier/symbol stream, skipping comments and
//! collapsing string literals to an opaque token so their contents can
//! never be mistaken for clause markers.

/// One lexical token of a statement fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Bare word: keyword, identifier, or number, original case preserved
    Word(String),

    /// Quoted identifier ("name", `name`), quotes stripped
    Quoted(String),

    /// String literal, contents irrelevant to classification
    Literal,

    /// Single punctuation character
    Symbol(char),
}

impl Token {
    /// Case-insensitive keyword check. Quoted identifiers never match:
    /// `"default"` is a column name, not a DEFAULT clause.
    pub fn is_kw(&self, keyword: &str) -> bool {
        match self {
            Token::Word(w) => w.eq_ignore_ascii_case(keyword),
            _ => false,
        }
    }

    /// Identifier text, for bare words and quoted identifiers
    pub fn ident(&self) -> Option<&str> {
        match self {
            Token::Word(w) => Some(w),
            Token::Quoted(q) => Some(q),
            _ => None,
        }
    }

    pub fn is_symbol(&self, symbol: char) -> bool {
        matches!(self, Token::Symbol(c) if *c == symbol)
    }
}

/// Tokenize a statement fragment into a flat token stream.
///
/// Tolerates arbitrary whitespace and line breaks between tokens, skips
/// `--` and `/* */` comments, and never fails: unterminated constructs
/// close implicitly at end of input.
pub fn tokenize(text: &str) -> Vec<Token> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
        } else if c == '-' && chars.get(i + 1) == Some(&'-') {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
        } else if c == '/' && chars.get(i + 1) == Some(&'*') {
            i = skip_block_comment(&chars, i + 2);
        } else if c == '\'' {
            i = skip_string_literal(&chars, i + 1);
            tokens.push(Token::Literal);
        } else if c == '$' {
            if let Some(end) = skip_dollar_quoted(&chars, i) {
                i = end;
                tokens.push(Token::Literal);
            } else {
                tokens.push(Token::Symbol(c));
                i += 1;
            }
        } else if c == '"' || c == '`' {
            let (ident, next) = read_quoted(&chars, i + 1, c);
            tokens.push(Token::Quoted(ident));
            i = next;
        } else if c.is_alphanumeric() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(Token::Word(chars[start..i].iter().collect()));
        } else {
            tokens.push(Token::Symbol(c));
            i += 1;
        }
    }

    tokens
}

/// Skip a `/* */` block comment, honoring Postgres-style nesting.
fn skip_block_comment(chars: &[char], mut i: usize) -> usize {
    let mut depth = 1;
    while i < chars.len() && depth > 0 {
        if chars[i] == '/' && chars.get(i + 1) == Some(&'*') {
            depth += 1;
            i += 2;
        } else if chars[i] == '*' && chars.get(i + 1) == Some(&'/') {
            depth -= 1;
            i += 2;
        } else {
            i += 1;
        }
    }
    i
}

/// Skip a single-quoted literal with `''` escaping.
fn skip_string_literal(chars: &[char], mut i: usize) -> usize {
    while i < chars.len() {
        if chars[i] == '\'' {
            if chars.get(i + 1) == Some(&'\'') {
                i += 2;
            } else {
                return i + 1;
            }
        } else {
            i += 1;
        }
    }
    i
}

/// Try to consume a `$tag$ ... $tag$` dollar-quoted literal starting at `i`.
/// Returns the index past the closer, or None if this is not a dollar quote.
fn skip_dollar_quoted(chars: &[char], start: usize) -> Option<usize> {
    let mut i = start + 1;
    while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
        i += 1;
    }
    if i >= chars.len() || chars[i] != '$' {
        return None;
    }

    let delimiter: Vec<char> = chars[start..=i].to_vec();
    let mut j = i + 1;
    while j + delimiter.len() <= chars.len() {
        if chars[j..j + delimiter.len()] == delimiter[..] {
            return Some(j + delimiter.len());
        }
        j += 1;
    }
    // Unterminated: closes at end of input
    Some(chars.len())
}

fn read_quoted(chars: &[char], start: usize, quote: char) -> (String, usize) {
    let mut i = start;
    while i < chars.len() && chars[i] != quote {
        i += 1;
    }
    let ident: String = chars[start..i].iter().collect();
    (ident, (i + 1).min(chars.len()))
}
