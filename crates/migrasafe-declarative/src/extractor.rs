//! Declarative-operation extractor
//!
//! Scans a migration module for `RunPython(...)` operations and determines
//! whether a reverse procedure was supplied, either as the second positional
//! argument or as a `reverse_code=` keyword argument. A reverse of `None`
//! counts as omitted.
//!
//! Best-effort by contract: never fails. String literals and comments are
//! tracked so an operation name inside either is not extracted; an
//! unterminated call closes at end of file.

use migrasafe_core::{DeclarativeOperation, SourceSpan};

/// The operation name the rule set targets
pub const RUN_PYTHON: &str = "RunPython";

/// Extract declarative operations from migration source, in source order.
pub fn extract(source: &str) -> Vec<DeclarativeOperation> {
    let chars: Vec<char> = source.chars().collect();
    let mut operations = Vec::new();
    let mut line = 1usize;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '#' {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
        } else if c == '\'' || c == '"' {
            i = skip_string(&chars, i, &mut line);
        } else if c == '\n' {
            line += 1;
            i += 1;
        } else if starts_operation(&chars, i) {
            let start_line = line;
            let start = i;
            i += RUN_PYTHON.len();

            // Whitespace between the name and the argument list is legal
            while i < chars.len() && chars[i].is_whitespace() {
                if chars[i] == '\n' {
                    line += 1;
                }
                i += 1;
            }

            if i < chars.len() && chars[i] == '(' {
                let call = capture_call(&chars, i, &mut line);
                let text: String = chars[start..call.end].iter().collect();

                operations.push(DeclarativeOperation {
                    name: RUN_PYTHON.to_string(),
                    has_reverse: reverse_supplied(&call.args),
                    text,
                    span: SourceSpan::new(start_line, line),
                });
                i = call.end;
            } else {
                // A bare reference (e.g. `RunPython.noop`), not an operation
                tracing::trace!(line = start_line, "operation name without a call, skipped");
            }
        } else {
            i += 1;
        }
    }

    operations
}

/// `RunPython` at `i`, not embedded in a longer identifier. A leading dot
/// (`migrations.RunPython`) is fine.
fn starts_operation(chars: &[char], i: usize) -> bool {
    let name: Vec<char> = RUN_PYTHON.chars().collect();
    if i + name.len() > chars.len() || chars[i..i + name.len()] != name[..] {
        return false;
    }
    if i > 0 {
        let prev = chars[i - 1];
        if prev.is_alphanumeric() || prev == '_' {
            return false;
        }
    }
    match chars.get(i + name.len()) {
        Some(c) if c.is_alphanumeric() || *c == '_' => false,
        _ => true,
    }
}

struct CapturedCall {
    /// Top-level argument texts, trimmed, trailing empty entry dropped.
    /// Commas inside a lambda's parameter list do not split an argument.
    args: Vec<String>,
    /// Index just past the closing paren (or end of input)
    end: usize,
}

/// Capture a balanced argument list starting at the opening paren, tracking
/// nested brackets, string literals, and comments. Unterminated calls close
/// at end of input.
fn capture_call(chars: &[char], open: usize, line: &mut usize) -> CapturedCall {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut depth = 1usize;
    let mut i = open + 1;

    while i < chars.len() && depth > 0 {
        let c = chars[i];

        match c {
            '#' => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '\'' | '"' => {
                let start = i;
                i = skip_string(chars, i, line);
                current.extend(&chars[start..i]);
            }
            '(' | '[' | '{' => {
                depth += 1;
                current.push(c);
                i += 1;
            }
            ')' | ']' | '}' => {
                depth -= 1;
                if depth > 0 {
                    current.push(c);
                }
                i += 1;
            }
            ',' if depth == 1 => {
                args.push(std::mem::take(&mut current));
                i += 1;
            }
            _ => {
                if c == '\n' {
                    *line += 1;
                }
                current.push(c);
                i += 1;
            }
        }
    }

    if !current.trim().is_empty() {
        args.push(current);
    }

    CapturedCall {
        args: merge_lambda_params(
            args.into_iter().map(|a| a.trim().to_string()).collect(),
        ),
        end: i,
    }
}

/// Re-join argument segments that a comma inside a lambda parameter list
/// split apart. `lambda apps, se: f` arrives as two segments; the first is
/// held until the segment carrying the lambda's top-level `:` is absorbed.
fn merge_lambda_params(args: Vec<String>) -> Vec<String> {
    let mut merged: Vec<String> = Vec::new();
    let mut pending: Option<String> = None;

    for arg in args {
        match pending.take() {
            Some(prefix) => {
                let closes = has_top_level_colon(&arg);
                let joined = format!("{prefix}, {arg}");
                if closes {
                    merged.push(joined);
                } else {
                    pending = Some(joined);
                }
            }
            None => {
                if opens_lambda(&arg) {
                    pending = Some(arg);
                } else {
                    merged.push(arg);
                }
            }
        }
    }

    if let Some(rest) = pending {
        merged.push(rest);
    }

    merged
}

/// The segment ends inside a lambda's parameter list: it introduces
/// `lambda` (possibly as a keyword argument value) but its `:` was cut off
/// by an argument comma.
fn opens_lambda(arg: &str) -> bool {
    let body = match top_level_kwarg_name(arg) {
        Some((_, value)) => value,
        None => arg,
    };
    let rest = match body.strip_prefix("lambda") {
        Some(rest) => rest,
        None => return false,
    };
    let boundary = rest
        .chars()
        .next()
        .map_or(true, |c| !(c.is_alphanumeric() || c == '_'));
    boundary && !has_top_level_colon(body)
}

fn has_top_level_colon(arg: &str) -> bool {
    let chars: Vec<char> = arg.chars().collect();
    let mut depth = 0usize;
    let mut line = 0usize;
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '\'' | '"' => i = skip_string(&chars, i, &mut line),
            '(' | '[' | '{' => {
                depth += 1;
                i += 1;
            }
            ')' | ']' | '}' => {
                depth = depth.saturating_sub(1);
                i += 1;
            }
            ':' if depth == 0 => return true,
            _ => i += 1,
        }
    }

    false
}

/// Skip a Python string literal (short or triple-quoted) starting at the
/// opening quote. Returns the index past the closer.
fn skip_string(chars: &[char], start: usize, line: &mut usize) -> usize {
    let quote = chars[start];
    let triple = chars.get(start + 1) == Some(&quote) && chars.get(start + 2) == Some(&quote);
    let mut i = start + if triple { 3 } else { 1 };

    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            i += 2;
            continue;
        }
        if c == '\n' {
            if !triple {
                // Unterminated short string closes at the line break; the
                // newline itself is left for the caller to count
                return i;
            }
            *line += 1;
        }
        if c == quote {
            if triple {
                if chars.get(i + 1) == Some(&quote) && chars.get(i + 2) == Some(&quote) {
                    return i + 3;
                }
            } else {
                return i + 1;
            }
        }
        i += 1;
    }

    i
}

/// A reverse procedure is supplied when the second positional argument or a
/// `reverse_code=` keyword argument is present and is not `None`.
fn reverse_supplied(args: &[String]) -> bool {
    for arg in args {
        if let Some(value) = kwarg_value(arg, "reverse_code") {
            return value != "None";
        }
    }

    let mut positional = args.iter().filter(|a| top_level_kwarg_name(a).is_none());
    match positional.nth(1) {
        Some(value) => value.trim() != "None",
        None => false,
    }
}

fn kwarg_value<'a>(arg: &'a str, name: &str) -> Option<&'a str> {
    match top_level_kwarg_name(arg) {
        Some((kwarg, value)) if kwarg == name => Some(value),
        _ => None,
    }
}

/// If the argument is a `name=value` keyword argument, return the name and
/// the trimmed value. `==` comparisons and `=` inside nested brackets or
/// strings do not count.
fn top_level_kwarg_name(arg: &str) -> Option<(&str, &str)> {
    let chars: Vec<char> = arg.chars().collect();
    let mut depth = 0usize;
    let mut i = 0;
    let mut line = 0usize;

    while i < chars.len() {
        match chars[i] {
            '\'' | '"' => i = skip_string(&chars, i, &mut line),
            '(' | '[' | '{' => {
                depth += 1;
                i += 1;
            }
            ')' | ']' | '}' => {
                depth = depth.saturating_sub(1);
                i += 1;
            }
            '=' if depth == 0 => {
                if chars.get(i + 1) == Some(&'=') {
                    i += 2;
                    continue;
                }
                if i > 0 && matches!(chars[i - 1], '!' | '<' | '>') {
                    i += 1;
                    continue;
                }
                let byte_pos = arg.char_indices().nth(i).map(|(p, _)| p)?;
                let name = arg[..byte_pos].trim();
                let is_identifier = !name.is_empty()
                    && name.chars().all(|c| c.is_alphanumeric() || c == '_')
                    && !name.starts_with(|c: char| c.is_ascii_digit());
                if is_identifier {
                    return Some((name, arg[byte_pos + 1..].trim()));
                }
                return None;
            }
            _ => i += 1,
        }
    }

    None
}
