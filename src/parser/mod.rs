//! Parser module - converts strings to expression trees
//!
//! The parser works one level at a time: [`tokenize`](tokenizer::tokenize)
//! finds the lowest-precedence operators at bracket depth 0, the text between
//! them is parsed recursively, and a text without top-level operators is
//! resolved as a leaf, a prefix-unary application or a function call.
mod operators;
mod tokenizer;

pub use operators::{DEFAULT_BINARY_OPERATORS, DEFAULT_UNARY_OPERATORS, OperatorTable};

use crate::ast::EMPTY;
use crate::{Expression, ParsingError};
use std::sync::Arc;
use tokenizer::tokenize;

/// Default maximum nesting depth accepted by [`Parser`]
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Configurable expression parser
///
/// # Example
/// ```
/// use fitmodel::{OperatorTable, Parser};
///
/// let parser = Parser::new().max_depth(32);
/// let expr = parser.parse("a+b*c").unwrap();
/// assert_eq!(expr.name(), "+");
/// assert_eq!(expr.terms()[1].name(), "*");
///
/// let logic = Parser::new().operators(OperatorTable::new(&["|", "&"], &["!"]));
/// let expr = logic.parse("a|b&!c").unwrap();
/// assert_eq!(expr.to_string(), "a|b& !c");
/// ```
#[derive(Debug, Clone)]
pub struct Parser {
    operators: Arc<OperatorTable>,
    max_depth: usize,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Parser with the default operator table
    pub fn new() -> Self {
        Parser {
            operators: Arc::new(OperatorTable::default()),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Use a custom operator table
    pub fn operators(mut self, table: OperatorTable) -> Self {
        self.operators = Arc::new(table);
        self
    }

    /// Limit the bracket/operator nesting depth
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn operator_table(&self) -> &Arc<OperatorTable> {
        &self.operators
    }

    /// Parse `input` into an expression tree
    ///
    /// # Errors
    /// Returns a [`ParsingError`] pointing at the offending character when
    /// brackets or quotes are unbalanced, an operator cannot be resolved, a
    /// binary operator has no right operand, or nesting exceeds the maximum depth.
    pub fn parse(&self, input: &str) -> Result<Expression, ParsingError> {
        self.parse_level(input, "", 0)
    }

    fn parse_level(&self, text: &str, op: &str, depth: usize) -> Result<Expression, ParsingError> {
        if depth > self.max_depth {
            return Err(ParsingError::at(
                "Expression nesting exceeds maximum depth",
                text,
                0,
            ));
        }

        let text = strip_outer_brackets(text.trim());
        let tokens = tokenize(text, &self.operators)?;
        let text = &text[..tokens.end];

        let Some(first) = tokens.operators.first() else {
            return self.resolve_term(text, op, depth);
        };
        let name = self
            .operators
            .group_label(tokens.precedence)
            .ok_or_else(|| ParsingError::at("Unrecognized operator", text, first.start))?;

        let mut terms = Vec::with_capacity(tokens.operators.len() + 1);
        let mut start = 0;
        let mut term_op = "";
        for token in &tokens.operators {
            terms.push(self.parse_level(&text[start..token.start], term_op, depth + 1)?);
            term_op = &text[token.start..token.end];
            start = token.end;
        }
        terms.push(self.parse_level(&text[start..], term_op, depth + 1)?);

        Ok(self.node(name, op, terms))
    }

    /// Resolve a text without top-level binary operators
    fn resolve_term(&self, text: &str, op: &str, depth: usize) -> Result<Expression, ParsingError> {
        let text = text.trim();

        if let Some(unary) = self.unary_prefix(text) {
            let operand = self.parse_level(&text[unary.len()..], "", depth + 1)?;
            return Ok(self.node(unary, op, vec![operand]));
        }

        if text.is_empty() {
            return Ok(self.node(EMPTY, op, Vec::new()));
        }

        let Some(open) = find_unquoted(text, '(') else {
            return Ok(self.node(text, op, Vec::new()));
        };
        let close = matching_bracket(text, open)
            .ok_or_else(|| ParsingError::at("Unmatched brackets", text, open))?;

        let rest = &text[close + 1..];
        if !rest.trim().is_empty() {
            let offset = close + 1 + (rest.len() - rest.trim_start().len());
            return Err(ParsingError::at(
                "Unexpected text after closing bracket",
                text,
                offset,
            ));
        }

        let head = text[..open].trim();
        let args = text[open + 1..close].trim();
        if args.is_empty() {
            return Ok(self.node(text, op, Vec::new()));
        }

        let inner = self.parse_level(args, "", depth + 1)?;
        let is_list = inner.name() == "," && !inner.is_leaf();

        if inner.is_empty_marker() || is_list {
            if head.is_empty() {
                return Ok(inner.with_op(op));
            }
            return Ok(self.node(head, op, inner.into_terms()));
        }

        Ok(self.node(head, op, vec![inner]))
    }

    /// Prefix unary operator at the start of `text`, if any
    fn unary_prefix<'a>(&self, text: &'a str) -> Option<&'a str> {
        let mut ends = text.char_indices().skip(1).map(|(i, _)| i).take(2);
        let one = ends.next()?;
        if let Some(two) = ends.next()
            && text[..two].chars().all(|c| self.operators.is_symbol(c))
            && self.operators.is_unary(&text[..two])
        {
            return Some(&text[..two]);
        }
        self.operators
            .is_unary(&text[..one])
            .then(|| &text[..one])
    }

    fn node(&self, name: &str, op: &str, terms: Vec<Expression>) -> Expression {
        Expression::from_parts(name, op, terms, Arc::clone(&self.operators))
    }
}

/// Strip a pair of outer brackets when no other `(` follows the first one
fn strip_outer_brackets(text: &str) -> &str {
    if text.len() > 1
        && text.starts_with('(')
        && text.ends_with(')')
        && !text[1..].contains('(')
    {
        text[1..text.len() - 1].trim()
    } else {
        text
    }
}

/// Byte offset of the first `target` outside double quotes
fn find_unquoted(text: &str, target: char) -> Option<usize> {
    let mut quoted = false;
    for (i, c) in text.char_indices() {
        match c {
            '"' => quoted = !quoted,
            c if c == target && !quoted => return Some(i),
            _ => {}
        }
    }
    None
}

/// Byte offset of the `)` matching the `(` at `open`
fn matching_bracket(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quoted = false;
    for (i, c) in text[open..].char_indices() {
        match c {
            '"' => quoted = !quoted,
            '(' if !quoted => depth += 1,
            ')' if !quoted => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}
