//! Operator tables for the expression parser
//!
//! A table is an ordered list of binary operator groups (lowest precedence
//! first, operators of one group separated by spaces) plus a set of prefix
//! unary operators. Tables are immutable once built and shared between all
//! nodes of a parsed tree through an `Arc`.

use rustc_hash::{FxHashMap, FxHashSet};

/// Binary operator groups of the default table, lowest precedence first
pub const DEFAULT_BINARY_OPERATORS: [&str; 8] = [
    ";",
    ",",
    "=",
    "== != > < <= >=",
    "&& || ^^",
    "+ -",
    "* /",
    "^",
];

/// Prefix unary operators of the default table
pub const DEFAULT_UNARY_OPERATORS: [&str; 2] = ["+", "-"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorTable {
    binary: Vec<String>,
    precedence: FxHashMap<String, usize>,
    unary: FxHashSet<String>,
    symbols: FxHashSet<char>,
}

impl Default for OperatorTable {
    fn default() -> Self {
        Self::new(&DEFAULT_BINARY_OPERATORS, &DEFAULT_UNARY_OPERATORS)
    }
}

impl OperatorTable {
    /// Build a table from binary groups (lowest precedence first) and unary operators
    ///
    /// # Example
    /// ```
    /// use fitmodel::OperatorTable;
    ///
    /// let table = OperatorTable::new(&["+ -", "* /"], &["-"]);
    /// assert_eq!(table.precedence("-"), 1);
    /// assert_eq!(table.precedence("/"), 2);
    /// assert!(table.is_unary("-"));
    /// ```
    pub fn new(binary: &[&str], unary: &[&str]) -> Self {
        let mut precedence = FxHashMap::default();
        let mut symbols = FxHashSet::default();

        for (level, group) in binary.iter().enumerate() {
            for op in group.split_whitespace() {
                precedence.insert(op.to_string(), level + 1);
                symbols.extend(op.chars());
            }
        }

        for op in unary {
            symbols.extend(op.chars());
        }

        OperatorTable {
            binary: binary.iter().map(|g| g.to_string()).collect(),
            precedence,
            unary: unary.iter().map(|u| u.to_string()).collect(),
            symbols,
        }
    }

    /// Table with binary operators only
    pub fn binary_only(binary: &[&str]) -> Self {
        Self::new(binary, &[])
    }

    /// 1-based precedence rank of a binary operator, 0 if unknown
    #[inline]
    pub fn precedence(&self, op: &str) -> usize {
        self.precedence.get(op).copied().unwrap_or(0)
    }

    #[inline]
    pub fn is_binary(&self, op: &str) -> bool {
        self.precedence.contains_key(op)
    }

    #[inline]
    pub fn is_unary(&self, op: &str) -> bool {
        self.unary.contains(op)
    }

    /// Whether `c` appears in any operator of the table
    #[inline]
    pub fn is_symbol(&self, c: char) -> bool {
        self.symbols.contains(&c)
    }

    /// Canonical label of a precedence level: the first operator of its group.
    ///
    /// A chain split at this level is named by the label, e.g. both `a+b` and
    /// `a-b` produce a node named `+`.
    pub fn group_label(&self, precedence: usize) -> Option<&str> {
        precedence
            .checked_sub(1)
            .and_then(|i| self.binary.get(i))
            .and_then(|group| group.split_whitespace().next())
    }

    /// Binary operator groups, lowest precedence first
    pub fn binary_groups(&self) -> &[String] {
        &self.binary
    }

    pub fn unary_operators(&self) -> impl Iterator<Item = &str> {
        self.unary.iter().map(String::as_str)
    }
}
