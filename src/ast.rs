//! Expression tree produced by the parser

use std::ops::Index;
use std::sync::Arc;

use crate::parser::{OperatorTable, Parser};
use crate::ParsingError;

/// Name given to leaves built from blank text
pub const EMPTY: &str = "EMPTY";

/// Special forms of the model grammar, resolved from a node's name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Form {
    /// `;`-chain: members of a composite
    Sequence,
    /// `,`-chain: items of one function or list
    List,
    /// `key=value`
    Assign,
    /// Redundant brackets around a single term
    Group,
    Leaf,
    Other,
}

/// Node of a parsed expression
///
/// Leaves carry the raw token text (identifier, number, quoted string or a
/// function call with no arguments). Internal nodes are named by the canonical
/// label of their operator group (`a-b` is a `+` node), by a prefix unary
/// operator, or by a function head. Each term remembers the operator that
/// joined it to its previous sibling.
#[derive(Debug, Clone)]
pub struct Expression {
    name: String,
    op: String,
    terms: Vec<Expression>,
    operators: Arc<OperatorTable>,
}

// Structural equality; the operator table is not compared
impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.op == other.op && self.terms == other.terms
    }
}

impl Eq for Expression {}

impl Default for Expression {
    fn default() -> Self {
        Expression {
            name: EMPTY.to_string(),
            op: String::new(),
            terms: Vec::new(),
            operators: Arc::new(OperatorTable::default()),
        }
    }
}

impl Expression {
    pub(crate) fn from_parts(
        name: &str,
        op: &str,
        terms: Vec<Expression>,
        operators: Arc<OperatorTable>,
    ) -> Self {
        Expression {
            name: name.to_string(),
            op: op.to_string(),
            terms,
            operators,
        }
    }

    /// Parse with the default operator table
    ///
    /// # Example
    /// ```
    /// use fitmodel::Expression;
    ///
    /// let expr = Expression::parse("a,b,c").unwrap();
    /// assert_eq!(expr.name(), ",");
    /// assert_eq!(expr.len(), 3);
    /// ```
    pub fn parse(input: &str) -> Result<Self, ParsingError> {
        Parser::new().parse(input)
    }

    pub(crate) fn with_op(mut self, op: &str) -> Self {
        self.op = op.to_string();
        self
    }

    pub(crate) fn into_terms(self) -> Vec<Expression> {
        self.terms
    }

    // Accessors

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Operator joining this node to its previous sibling, empty for the first term
    #[inline]
    pub fn operator_name(&self) -> &str {
        &self.op
    }

    #[inline]
    pub fn terms(&self) -> &[Expression] {
        &self.terms
    }

    pub fn get(&self, index: usize) -> Option<&Expression> {
        self.terms.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Expression> {
        self.terms.iter()
    }

    /// Number of terms
    #[inline]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn operator_table(&self) -> &OperatorTable {
        &self.operators
    }

    // Classification

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.terms.is_empty()
    }

    /// Leaf built from blank text
    #[inline]
    pub fn is_empty_marker(&self) -> bool {
        self.is_leaf() && self.name == EMPTY
    }

    /// Chain of terms joined by a binary operator of its table
    pub fn is_operator(&self) -> bool {
        self.terms.len() > 1 && self.operators.is_binary(&self.name)
    }

    /// Prefix unary application: one term, named by a unary operator
    pub fn is_unary(&self) -> bool {
        self.terms.len() == 1 && self.operators.is_unary(&self.name)
    }

    /// Function application or bracket group
    pub fn is_func(&self) -> bool {
        !self.is_leaf() && !self.is_operator() && !self.is_unary()
    }

    /// Binding strength of the node when printed inside an operator chain;
    /// 0 for leaves, unary nodes and functions. Bracket groups bind like
    /// their content.
    pub(crate) fn binding(&self) -> usize {
        let expr = self.brackets_removed();
        if expr.is_leaf() || expr.is_unary() {
            0
        } else {
            expr.operators.precedence(&expr.name)
        }
    }

    pub fn form(&self) -> Form {
        if self.is_leaf() {
            return Form::Leaf;
        }
        match self.name.as_str() {
            ";" => Form::Sequence,
            "," => Form::List,
            "=" => Form::Assign,
            "" if self.terms.len() == 1 => Form::Group,
            _ => Form::Other,
        }
    }

    // Utilities

    /// Innermost node under any redundant bracket groups
    ///
    /// ```
    /// use fitmodel::Expression;
    ///
    /// let expr = Expression::parse("((a+b))").unwrap();
    /// assert_eq!(expr.name(), "");
    /// assert_eq!(expr.brackets_removed().name(), "+");
    /// ```
    pub fn brackets_removed(&self) -> &Expression {
        let mut expr = self;
        while expr.name.is_empty() && expr.terms.len() == 1 {
            expr = &expr.terms[0];
        }
        expr
    }

    /// View the node as a list separated by `sep`
    ///
    /// A node that is not a `sep`-chain is a one-element list.
    pub fn to_list(&self, sep: &str) -> Vec<&Expression> {
        if self.name == sep && !self.is_leaf() {
            self.terms.iter().collect()
        } else {
            vec![self]
        }
    }

    /// Sorted, deduplicated names of the identifier leaves
    ///
    /// Numbers, quoted strings, `EMPTY` and argument-less calls such as `f()`
    /// are not variables; function heads are not leaves.
    pub fn variables(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_variables(&mut names);
        names.sort_unstable();
        names.dedup();
        names
    }

    fn collect_variables(&self, names: &mut Vec<String>) {
        if self.is_leaf() {
            if is_identifier(&self.name) {
                names.push(self.name.clone());
            }
            return;
        }
        for term in &self.terms {
            term.collect_variables(names);
        }
    }

    /// Rename every leaf named `old`
    pub fn rename_all(&mut self, old: &str, new: &str) {
        if self.is_leaf() {
            if self.name == old {
                self.name = new.to_string();
            }
            return;
        }
        for term in &mut self.terms {
            term.rename_all(old, new);
        }
    }

    /// Indented dump of the tree, one node per line
    pub fn tree_string(&self) -> String {
        let mut out = String::new();
        self.write_tree(&mut out, 0);
        out
    }

    fn write_tree(&self, out: &mut String, indent: usize) {
        out.push_str(&"  ".repeat(indent));
        if !self.op.is_empty() {
            out.push_str(&self.op);
            out.push(' ');
        }
        if self.is_leaf() {
            out.push_str(&self.name);
        } else {
            out.push('[');
            out.push_str(&self.name);
            out.push(']');
        }
        out.push('\n');
        for term in &self.terms {
            term.write_tree(out, indent + 1);
        }
    }
}

fn is_identifier(text: &str) -> bool {
    text != EMPTY
        && text
            .chars()
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_')
        && !text.contains(['(', '"'])
}

impl Index<usize> for Expression {
    type Output = Expression;

    fn index(&self, index: usize) -> &Self::Output {
        &self.terms[index]
    }
}

impl<'a> IntoIterator for &'a Expression {
    type Item = &'a Expression;
    type IntoIter = std::slice::Iter<'a, Expression>;

    fn into_iter(self) -> Self::IntoIter {
        self.terms.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty_leaf() {
        let expr = Expression::default();
        assert!(expr.is_empty_marker());
        assert_eq!(expr.form(), Form::Leaf);
    }

    #[test]
    fn test_forms() {
        assert_eq!(Expression::parse("a;b").unwrap().form(), Form::Sequence);
        assert_eq!(Expression::parse("a,b").unwrap().form(), Form::List);
        assert_eq!(Expression::parse("a=b").unwrap().form(), Form::Assign);
        assert_eq!(Expression::parse("((a))").unwrap().form(), Form::Group);
        assert_eq!(Expression::parse("a+b").unwrap().form(), Form::Other);
        assert_eq!(Expression::parse("f(x)").unwrap().form(), Form::Other);
        assert_eq!(Expression::parse("x").unwrap().form(), Form::Leaf);
    }

    #[test]
    fn test_classification() {
        let expr = Expression::parse("f(x)+(-y)").unwrap();
        assert!(expr.is_operator());
        assert!(expr[0].is_func());
        assert!(expr[1].is_unary());
        assert!(!expr[1].is_func());
        assert!(expr[0][0].is_leaf());
    }

    #[test]
    fn test_to_list() {
        let expr = Expression::parse("a,b,c").unwrap();
        let items: Vec<&str> = expr.to_list(",").iter().map(|e| e.name()).collect();
        assert_eq!(items, vec!["a", "b", "c"]);

        let single = Expression::parse("a=1").unwrap();
        assert_eq!(single.to_list(",").len(), 1);
        assert_eq!(single.to_list(",")[0].name(), "=");
    }

    #[test]
    fn test_variables() {
        let expr = Expression::parse("2*Sigma+sin(x)*Height-\"s\"+1.5e3+f()+Sigma").unwrap();
        assert_eq!(expr.variables(), vec!["Height", "Sigma", "x"]);

        let expr = Expression::parse("f0.A0+f1.Height").unwrap();
        assert_eq!(expr.variables(), vec!["f0.A0", "f1.Height"]);
    }

    #[test]
    fn test_rename_all() {
        let mut expr = Expression::parse("a*b+a").unwrap();
        expr.rename_all("a", "f0.a");
        assert_eq!(expr.variables(), vec!["b", "f0.a"]);
    }

    #[test]
    fn test_iteration_and_index() {
        let expr = Expression::parse("x+y-z").unwrap();
        let ops: Vec<&str> = (&expr).into_iter().map(|t| t.operator_name()).collect();
        assert_eq!(ops, vec!["", "+", "-"]);
        assert_eq!(expr[2].name(), "z");
        assert!(expr.get(3).is_none());
    }

    #[test]
    fn test_tree_string() {
        let expr = Expression::parse("a-b*c").unwrap();
        assert_eq!(expr.tree_string(), "[+]\n  a\n  - [*]\n    b\n    * c\n");
    }

    #[test]
    fn test_equality_ignores_table() {
        let custom = Parser::new().operators(OperatorTable::new(&["+ -"], &["-"]));
        let a = custom.parse("x+y").unwrap();
        let b = Expression::parse("x+y").unwrap();
        assert_eq!(a, b);
    }
}
