use crate::error::CalcError;
use log::trace;

/// Names an expression may contain; every other letter run is rejected.
pub const ALLOWED_TOKENS: [&str; 9] = ["sin", "cos", "tan", "log", "ln", "sqrt", "abs", "pi", "e"];

fn is_allowed_char(c: char) -> bool {
    c.is_ascii_digit() || c.is_ascii_lowercase() || "+-*/().,%!^".contains(c)
}

/// Brings raw user input into the canonical form the parser expects.
///
/// Lower-cases, maps `π` to `pi`, strips whitespace, then rejects characters
/// outside the calculator alphabet and letter runs that do not name a known
/// function or constant.
pub fn normalize(raw: &str) -> Result<String, CalcError> {
    if raw.trim().is_empty() {
        return Err(CalcError::EmptyExpression);
    }

    let normalized: String = raw
        .to_lowercase()
        .replace('π', "pi")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if !normalized.chars().all(is_allowed_char) {
        return Err(CalcError::UnsupportedCharacters);
    }

    check_tokens(&normalized)?;
    trace!("Normalized '{}' to '{}'", raw, normalized);
    Ok(normalized)
}

fn check_tokens(expression: &str) -> Result<(), CalcError> {
    let mut start = None;

    // Trailing sentinel closes a run that ends the input.
    for (index, c) in expression.char_indices().chain(std::iter::once((expression.len(), ' '))) {
        match (c.is_ascii_alphabetic(), start) {
            (true, None) => start = Some(index),
            (false, Some(from)) => {
                let token = &expression[from..index];
                if !ALLOWED_TOKENS.contains(&token) {
                    return Err(CalcError::UnknownToken(token.to_string()));
                }
                start = None;
            }
            _ => {}
        }
    }

    Ok(())
}
