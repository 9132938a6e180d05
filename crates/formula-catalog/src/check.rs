//! The editor's formula check.
//!
//! This is a heuristic, not a grammar: it only counts parentheses and looks for any known
//! table, column, or function name as a substring. A formula can pass and still be nonsense.

use crate::library::function_library;

/// Table and column names a formula may mention.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KnownNames {
    names: Vec<String>,
}

impl KnownNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table<I, S>(&mut self, table: impl Into<String>, columns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(table.into());
        for column in columns {
            self.push(column.into());
        }
    }

    #[must_use]
    pub fn with_table<I, S>(mut self, table: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_table(table, columns);
        self
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    fn push(&mut self, name: String) {
        // An empty name would be a substring of every formula.
        if !name.is_empty() && !self.names.contains(&name) {
            self.names.push(name);
        }
    }

    fn mentioned_in(&self, formula: &str) -> bool {
        self.names.iter().any(|name| formula.contains(name.as_str()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FormulaIssue {
    #[error("Mismatched parentheses: {open} open, {close} closed.")]
    MismatchedParentheses { open: usize, close: usize },

    #[error("Warning: No known columns or functions detected.")]
    NoKnownNames,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormulaCheck {
    Valid,
    Invalid(FormulaIssue),
}

impl FormulaCheck {
    pub fn is_valid(&self) -> bool {
        matches!(self, FormulaCheck::Valid)
    }

    /// Status line shown under the editor.
    pub fn message(&self) -> String {
        match self {
            FormulaCheck::Valid => "Syntax is valid.".to_string(),
            FormulaCheck::Invalid(issue) => issue.to_string(),
        }
    }
}

/// Check `formula` against `known`. Blank input yields `None` (nothing to report).
pub fn check_formula(formula: &str, known: &KnownNames) -> Option<FormulaCheck> {
    if formula.trim().is_empty() {
        return None;
    }

    let open = formula.matches('(').count();
    let close = formula.matches(')').count();
    if open != close {
        return Some(FormulaCheck::Invalid(FormulaIssue::MismatchedParentheses {
            open,
            close,
        }));
    }

    let mentions_function = function_library()
        .iter()
        .any(|f| formula.contains(f.name));
    if !known.mentioned_in(formula) && !mentions_function {
        return Some(FormulaCheck::Invalid(FormulaIssue::NoKnownNames));
    }

    Some(FormulaCheck::Valid)
}
