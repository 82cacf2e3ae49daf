//! Statement splitter
//!
//! Turns raw migration text into an ordered sequence of statement fragments
//! with source line numbers. Splits on `;` while tracking lexical context so
//! a terminator inside a string literal or comment does not end a statement.
//!
//! Best-effort by contract: never fails on malformed input. Unterminated
//! literals or comments close implicitly at end of file and the remaining
//! text becomes a final statement. Comment text is stripped from fragments,
//! so comment-only fragments come out whitespace-only and are dropped.

use migrasafe_core::{RawStatement, SourceSpan};

/// Split migration source into raw statements, in source order.
pub fn split(source: &str) -> Vec<RawStatement> {
    let chars: Vec<char> = source.chars().collect();
    let mut statements = Vec::new();
    let mut buf = StatementBuf::new();
    let mut line = 1usize;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == ';' {
            if let Some(stmt) = buf.take() {
                statements.push(stmt);
            }
            i += 1;
        } else if c == '-' && chars.get(i + 1) == Some(&'-') {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
            buf.push(' ', line);
        } else if c == '/' && chars.get(i + 1) == Some(&'*') {
            i += 2;
            let mut depth = 1;
            while i < chars.len() && depth > 0 {
                if chars[i] == '/' && chars.get(i + 1) == Some(&'*') {
                    depth += 1;
                    i += 2;
                } else if chars[i] == '*' && chars.get(i + 1) == Some(&'/') {
                    depth -= 1;
                    i += 2;
                } else {
                    if chars[i] == '\n' {
                        line += 1;
                        buf.push('\n', line);
                    }
                    i += 1;
                }
            }
            buf.push(' ', line);
        } else if c == '\'' {
            i = consume_region(&chars, i, &mut line, &mut buf, |chars, j| {
                if chars[j] == '\'' {
                    if chars.get(j + 1) == Some(&'\'') {
                        RegionStep::Keep(2)
                    } else {
                        RegionStep::CloseAfter(1)
                    }
                } else {
                    RegionStep::Keep(1)
                }
            });
        } else if c == '"' || c == '`' {
            let quote = c;
            i = consume_region(&chars, i, &mut line, &mut buf, move |chars, j| {
                if chars[j] == quote {
                    RegionStep::CloseAfter(1)
                } else {
                    RegionStep::Keep(1)
                }
            });
        } else if c == '$' {
            if let Some(delim_len) = dollar_delimiter_len(&chars, i) {
                i = consume_dollar_quoted(&chars, i, delim_len, &mut line, &mut buf);
            } else {
                buf.push(c, line);
                i += 1;
            }
        } else {
            if c == '\n' {
                line += 1;
            }
            buf.push(c, line);
            i += 1;
        }
    }

    if let Some(stmt) = buf.take() {
        statements.push(stmt);
    }

    statements
}

enum RegionStep {
    /// Copy this many chars into the buffer and stay inside the region
    Keep(usize),
    /// Copy this many chars, then leave the region
    CloseAfter(usize),
}

/// Consume a quoted region starting at the opening quote. The opener, body,
/// and closer are all copied into the buffer; newlines advance the line
/// counter. An unterminated region closes at end of input.
fn consume_region(
    chars: &[char],
    start: usize,
    line: &mut usize,
    buf: &mut StatementBuf,
    step: impl Fn(&[char], usize) -> RegionStep,
) -> usize {
    buf.push(chars[start], *line);
    let mut i = start + 1;

    while i < chars.len() {
        let (count, closes) = match step(chars, i) {
            RegionStep::Keep(n) => (n, false),
            RegionStep::CloseAfter(n) => (n, true),
        };
        for _ in 0..count {
            if i < chars.len() {
                if chars[i] == '\n' {
                    *line += 1;
                }
                buf.push(chars[i], *line);
                i += 1;
            }
        }
        if closes {
            break;
        }
    }

    i
}

/// Length of a `$tag$` delimiter starting at `i`, or None if `$` here does
/// not open a dollar-quoted string.
fn dollar_delimiter_len(chars: &[char], i: usize) -> Option<usize> {
    let mut j = i + 1;
    while j < chars.len() && (chars[j].is_alphanumeric() || chars[j] == '_') {
        j += 1;
    }
    if j < chars.len() && chars[j] == '$' {
        Some(j - i + 1)
    } else {
        None
    }
}

fn consume_dollar_quoted(
    chars: &[char],
    start: usize,
    delim_len: usize,
    line: &mut usize,
    buf: &mut StatementBuf,
) -> usize {
    let delimiter = &chars[start..start + delim_len];
    let mut i = start;

    // Copy the opening delimiter
    for _ in 0..delim_len {
        buf.push(chars[i], *line);
        i += 1;
    }

    while i < chars.len() {
        if i + delim_len <= chars.len() && chars[i..i + delim_len] == *delimiter {
            for _ in 0..delim_len {
                buf.push(chars[i], *line);
                i += 1;
            }
            return i;
        }
        if chars[i] == '\n' {
            *line += 1;
        }
        buf.push(chars[i], *line);
        i += 1;
    }

    i
}

/// Accumulates one statement's text while tracking the line range of its
/// non-whitespace content.
struct StatementBuf {
    text: String,
    start_line: Option<usize>,
    end_line: usize,
}

impl StatementBuf {
    fn new() -> Self {
        Self {
            text: String::new(),
            start_line: None,
            end_line: 1,
        }
    }

    fn push(&mut self, c: char, line: usize) {
        if !c.is_whitespace() {
            if self.start_line.is_none() {
                self.start_line = Some(line);
            }
            self.end_line = line;
        }
        self.text.push(c);
    }

    /// Finish the current fragment. Returns None for whitespace-only
    /// fragments, which the splitter drops.
    fn take(&mut self) -> Option<RawStatement> {
        let text = std::mem::take(&mut self.text);
        let start = self.start_line.take()?;
        Some(RawStatement::new(
            text.trim(),
            SourceSpan::new(start, self.end_line),
        ))
    }
}
