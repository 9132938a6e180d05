//! Function library and formula check for the formula editor.
//!
//! Formulas are not parsed or evaluated here; see [`check_formula`] for what the check covers.

#![forbid(unsafe_code)]

mod check;
mod library;

pub use crate::check::{check_formula, FormulaCheck, FormulaIssue, KnownNames};
pub use crate::library::{
    column_reference, function_library, search_functions, FunctionCategory, FunctionDef,
};
