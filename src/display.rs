// Canonical serialisation of expression trees
use crate::ast::{EMPTY, Form};
use crate::Expression;
use std::fmt;

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_leaf() {
            if self.name() == EMPTY {
                return Ok(());
            }
            return write!(f, "{}", self.name());
        }

        // Redundant brackets are dropped; the enclosing node brackets the
        // content again if it needs to
        if self.form() == Form::Group {
            return write!(f, "{}", self.terms()[0]);
        }

        if self.is_unary() {
            let operand = &self.terms()[0];
            return if operand.binding() > 0 {
                write!(f, "{}({})", self.name(), operand)
            } else {
                write!(f, "{}{}", self.name(), operand)
            };
        }

        let precedence = self.binding();
        if precedence == 0 {
            // Function call. Arguments that are themselves separator chains
            // keep their brackets.
            let separator = self.operator_table().precedence(",");
            write!(f, "{}(", self.name())?;
            for term in self.terms() {
                write!(f, "{}", term.operator_name())?;
                let inner = term.binding();
                if inner > 0 && inner <= separator {
                    write!(f, "({})", term)?;
                } else {
                    write!(f, "{}", term)?;
                }
            }
            return write!(f, ")");
        }

        for (i, term) in self.terms().iter().enumerate() {
            write!(f, "{}", term.operator_name())?;
            if i > 0 && term.brackets_removed().is_unary() {
                write!(f, " ")?;
            }
            // A nested chain of the same level only comes from brackets
            let inner = term.binding();
            if inner > 0 && inner <= precedence {
                write!(f, "({})", term)?;
            } else {
                write!(f, "{}", term)?;
            }
        }
        Ok(())
    }
}
