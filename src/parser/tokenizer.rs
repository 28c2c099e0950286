//! Single-pass tokenizer for one level of an expression
//!
//! Finds the top-level binary operators (bracket depth 0, outside quoted
//! strings and number literals) with the lowest precedence. The text between
//! them becomes the terms of the node; each term is parsed again one level down.

use super::operators::OperatorTable;
use crate::ParsingError;

/// Byte span of a top-level binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug)]
pub(crate) struct Tokens {
    /// Split points, all at `precedence`
    pub operators: Vec<Token>,
    pub precedence: usize,
    /// End of the text that belongs to the expression. A dropped trailing
    /// separator is not included.
    pub end: usize,
}

impl Tokens {
    fn record(&mut self, token: Token, precedence: usize) {
        if precedence < self.precedence {
            self.operators.clear();
            self.precedence = precedence;
        }
        if precedence == self.precedence {
            self.operators.push(token);
        }
    }
}

/// Tracks whether the scanner is inside a number literal such as `1.5e-3`,
/// so that the sign of an exponent is not taken for an operator.
#[derive(Debug, Default)]
struct NumberScanner {
    active: bool,
    can_dot: bool,
    can_exp: bool,
    can_sign: bool,
}

impl NumberScanner {
    /// Feed the next character; returns true while it belongs to a number
    fn feed(&mut self, c: char, prev: Option<char>) -> bool {
        if self.active {
            match c {
                '0'..='9' => self.can_sign = false,
                '.' if self.can_dot => self.can_dot = false,
                'e' | 'E' if self.can_exp => {
                    self.can_exp = false;
                    self.can_dot = false;
                    self.can_sign = true;
                }
                '+' | '-' if self.can_sign => self.can_sign = false,
                _ => self.active = false,
            }
        } else if c.is_ascii_digit() && !prev.is_some_and(continues_identifier) {
            *self = NumberScanner {
                active: true,
                can_dot: true,
                can_exp: true,
                can_sign: false,
            };
        }
        self.active
    }
}

#[inline]
fn continues_identifier(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Length in chars of the binary operator starting with `c`
fn binary_operator_len(table: &OperatorTable, c: char, next: Option<char>) -> Option<usize> {
    if let Some(n) = next
        && table.is_symbol(n)
        && table.is_binary(&String::from_iter([c, n]))
    {
        return Some(2);
    }
    // A single-char operator; a symbol following it (as in `*-`) starts the
    // next term and must turn out to be unary.
    table.is_binary(&c.to_string()).then_some(1)
}

/// Length in chars of the unary operator starting with `c`
fn unary_operator_len(table: &OperatorTable, c: char, next: Option<char>) -> Option<usize> {
    if let Some(n) = next
        && table.is_symbol(n)
        && table.is_unary(&String::from_iter([c, n]))
    {
        return Some(2);
    }
    table.is_unary(&c.to_string()).then_some(1)
}

/// Split `text` at its lowest-precedence top-level binary operators.
///
/// `text` is expected to be trimmed. Returns no operators when the text is a
/// single term.
pub(crate) fn tokenize(text: &str, table: &OperatorTable) -> Result<Tokens, ParsingError> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut tokens = Tokens {
        operators: Vec::new(),
        precedence: usize::MAX,
        end: text.len(),
    };

    let mut open_brackets: Vec<usize> = Vec::new();
    let mut quote_start: Option<usize> = None;
    let mut number = NumberScanner::default();
    let mut can_be_binary = false;
    let mut prev: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let (pos, c) = chars[i];

        if quote_start.is_some() {
            if c == '"' {
                quote_start = None;
            }
            prev = Some(c);
            i += 1;
            continue;
        }

        let in_number = number.feed(c, prev);
        match c {
            '"' => quote_start = Some(pos),
            '(' => open_brackets.push(pos),
            ')' => {
                if open_brackets.pop().is_none() {
                    return Err(ParsingError::at("Unmatched brackets", text, pos));
                }
            }
            _ => {}
        }

        if open_brackets.is_empty() && !in_number && table.is_symbol(c) {
            let next = chars.get(i + 1).map(|&(_, n)| n);

            if next.is_none() {
                // Generated model strings often end their lists with a separator
                if c == ',' || c == ';' {
                    tokens.end = pos;
                    break;
                }
                return Err(ParsingError::at("Syntax error", text, pos));
            }

            let len = if can_be_binary {
                let len = binary_operator_len(table, c, next)
                    .ok_or_else(|| ParsingError::at("Unrecognized operator", text, pos))?;
                let end = chars.get(i + len).map_or(text.len(), |&(p, _)| p);
                if end == text.len() {
                    return Err(ParsingError::at("Syntax error", text, pos));
                }
                tokens.record(Token { start: pos, end }, table.precedence(&text[pos..end]));
                can_be_binary = false;
                len
            } else {
                // Prefix operator; it stays part of the following term
                unary_operator_len(table, c, next)
                    .ok_or_else(|| ParsingError::at("Unrecognized operator", text, pos))?
            };

            prev = Some(chars[i + len - 1].1);
            i += len;
            continue;
        }

        if !c.is_whitespace() {
            can_be_binary = true;
        }
        prev = Some(c);
        i += 1;
    }

    if let Some(start) = quote_start {
        return Err(ParsingError::at("Unmatched quotes", text, start));
    }
    if let Some(&start) = open_brackets.first() {
        return Err(ParsingError::at("Unmatched brackets", text, start));
    }

    Ok(tokens)
}
