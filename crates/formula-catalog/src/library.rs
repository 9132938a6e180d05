use serde::Serialize;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum FunctionCategory {
    Logical,
    Math,
    Text,
    Date,
}

impl FunctionCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            FunctionCategory::Logical => "Logical",
            FunctionCategory::Math => "Math",
            FunctionCategory::Text => "Text",
            FunctionCategory::Date => "Date",
        }
    }
}

impl fmt::Display for FunctionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A function offered by the formula editor's library panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FunctionDef {
    pub name: &'static str,
    pub syntax: &'static str,
    pub description: &'static str,
    pub example: &'static str,
    pub category: FunctionCategory,
}

const FUNCTION_LIBRARY: &[FunctionDef] = &[
    FunctionDef {
        name: "IF",
        category: FunctionCategory::Logical,
        syntax: "IF(condition, value_true, value_false)",
        description: "Checks if a condition is met, and returns one value if TRUE, and another value if FALSE.",
        example: "IF(orders_q1.total_amount > 100, 'High Value', 'Standard')",
    },
    FunctionDef {
        name: "CONCAT",
        category: FunctionCategory::Text,
        syntax: "CONCAT(text1, text2, ...)",
        description: "Combines the text from multiple strings and/or columns.",
        example: "CONCAT(customers_master.segment, ' - ', customers_master.full_name)",
    },
    FunctionDef {
        name: "UPPER",
        category: FunctionCategory::Text,
        syntax: "UPPER(text)",
        description: "Converts a text string to all uppercase letters.",
        example: "UPPER(orders_q1.status)",
    },
    FunctionDef {
        name: "DATEDIFF",
        category: FunctionCategory::Date,
        syntax: "DATEDIFF(date1, date2, unit)",
        description: "Returns the difference between two dates.",
        example: "DATEDIFF(orders_q1.order_date, NOW(), 'days')",
    },
    FunctionDef {
        name: "SUM",
        category: FunctionCategory::Math,
        syntax: "SUM(column)",
        description: "Calculates the sum of a column.",
        example: "SUM(orders_q1.total_amount)",
    },
];

pub fn function_library() -> &'static [FunctionDef] {
    FUNCTION_LIBRARY
}

/// Library entries whose name contains `term`, ignoring case, in library order.
pub fn search_functions(term: &str) -> impl Iterator<Item = &'static FunctionDef> {
    let term = term.to_lowercase();
    FUNCTION_LIBRARY
        .iter()
        .filter(move |f| f.name.to_lowercase().contains(&term))
}

/// The text dropped into the editor when a column is dragged from the schema panel.
///
/// Already-qualified names (as produced by merges, e.g. `orders_q1.status`) are kept as is.
pub fn column_reference(table: &str, column: &str) -> String {
    if column.contains('.') {
        column.to_string()
    } else {
        format!("{table}.{column}")
    }
}
