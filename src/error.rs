use thiserror::Error;

/// Number of characters shown on each side of the offending offset when a
/// parsing error is rendered with context.
const CONTEXT_WINDOW: usize = 10;

/// Source location span for error reporting
/// Represents a range of bytes in the input string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Start position (0-indexed byte offset)
    pub start: usize,
    /// End position (exclusive, 0-indexed byte offset)
    pub end: usize,
}

impl Span {
    /// Create a new span
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    /// Create a span for a single position
    pub fn at(pos: usize) -> Self {
        Span {
            start: pos,
            end: pos + 1,
        }
    }

    /// Check if this span has valid location info
    pub fn is_valid(&self) -> bool {
        self.end > self.start
    }
}

/// Error raised by the expression tokenizer and parser.
///
/// Carries the message, the text that was being parsed when the error was
/// detected and, when known, the byte offset of the offending character in
/// that text. With an offset the error renders a bounded excerpt of the text
/// with a caret under the offending character:
///
/// ```text
/// Unmatched brackets at
///
/// (a+b
/// ^
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{rendered}")]
pub struct ParsingError {
    message: String,
    expression: String,
    offset: Option<usize>,
    rendered: String,
}

impl ParsingError {
    /// Error without positional context
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        ParsingError {
            rendered: message.clone(),
            message,
            expression: String::new(),
            offset: None,
        }
    }

    /// Error pointing at byte `offset` of `expression`
    pub fn at(message: impl Into<String>, expression: impl Into<String>, offset: usize) -> Self {
        let message = message.into();
        let expression = expression.into();
        let offset = floor_char_boundary(&expression, offset);
        ParsingError {
            rendered: render_context(&message, &expression, offset),
            message,
            expression,
            offset: Some(offset),
        }
    }

    /// The bare message, without the excerpt
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The text that failed to parse
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Byte offset of the offending character within [`Self::expression`]
    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    /// One-character span at the offending offset
    pub fn span(&self) -> Option<Span> {
        self.offset.map(Span::at)
    }
}

fn floor_char_boundary(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

fn ceil_char_boundary(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset += 1;
    }
    offset
}

/// Render `message` followed by a window of `expression` around `offset` with
/// a caret under the offending character. Text outside the window is elided
/// with `...`.
fn render_context(message: &str, expression: &str, offset: usize) -> String {
    let start = expression[..offset]
        .char_indices()
        .rev()
        .nth(CONTEXT_WINDOW - 1)
        .map_or(0, |(i, _)| i);
    let end = expression[offset..]
        .char_indices()
        .nth(CONTEXT_WINDOW + 1)
        .map_or(expression.len(), |(i, _)| offset + i);
    let end = ceil_char_boundary(expression, end);

    let mut excerpt = String::with_capacity(end - start + 6);
    if start > 0 {
        excerpt.push_str("...");
    }
    let caret_column = excerpt.len() + expression[start..offset].chars().count();
    excerpt.push_str(&expression[start..end]);
    if end < expression.len() {
        excerpt.push_str("...");
    }

    format!(
        "{} at\n\n{}\n{}^",
        message,
        excerpt,
        " ".repeat(caret_column)
    )
}

/// Errors raised by function objects, constraints and the registries that
/// construct them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FunctionError {
    #[error("unknown function type: {0}")]
    UnknownFunction(String),
    #[error("function type {0} is not a composite function")]
    NotComposite(String),
    #[error("unknown constraint type: {0}")]
    UnknownConstraint(String),
    #[error("parameter {parameter} not found in function {function}")]
    UnknownParameter { function: String, parameter: String },
    #[error("attribute {attribute} not found in function {function}")]
    UnknownAttribute { function: String, attribute: String },
    #[error("cannot set attribute {attribute} of type {kind} from '{value}'")]
    InvalidAttributeValue {
        attribute: String,
        kind: &'static str,
        value: String,
    },
    #[error("invalid constraint '{expression}': {reason}")]
    InvalidConstraint { expression: String, reason: String },
    #[error("invalid tie {parameter}={formula}: {reason}")]
    InvalidTie {
        parameter: String,
        formula: String,
        reason: String,
    },
    #[error("cannot evaluate tie {parameter}={formula}: {reason}")]
    TieEvaluation {
        parameter: String,
        formula: String,
        reason: String,
    },
    #[error("member function index {index} out of range (composite has {size} members)")]
    MemberOutOfRange { index: usize, size: usize },
}

/// Errors raised while turning a model string into a function object.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FactoryError {
    #[error("Error in input string to FunctionFactory\n{input}\n    {source}")]
    Parsing {
        input: String,
        #[source]
        source: ParsingError,
    },
    #[error("Error in input string to FunctionFactory\n{0}")]
    InvalidInput(String),
    #[error("Function name must be defined before its parameters")]
    NameNotFirst,
    #[error("Error in value of parameter {name}.\n{value} cannot be interpreted as a floating point value.")]
    InvalidParameterValue { name: String, value: String },
    #[error("Error in input string to FunctionFactory: no function provided")]
    NoFunction,
    #[error(transparent)]
    Function(#[from] FunctionError),
}

impl FactoryError {
    /// The innermost parser diagnostic, if this error came from the parser
    pub fn parsing_error(&self) -> Option<&ParsingError> {
        match self {
            FactoryError::Parsing { source, .. } => Some(source),
            _ => None,
        }
    }
}
