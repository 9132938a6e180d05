use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the join engine finds the rows of the probed side that share a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LookupStrategy {
    /// Pick [`LookupStrategy::HashIndex`] once the probed side reaches
    /// [`JoinOptions::hash_threshold_rows`], otherwise scan.
    ///
    /// The index always goes on the probed (non-driving) side, whichever relation is smaller, so
    /// matches come back in that side's row order.
    Auto,
    /// Compare every pair of rows.
    NestedLoop,
    /// Index the probed side by key text before probing.
    HashIndex,
}

impl Default for LookupStrategy {
    fn default() -> Self {
        Self::Auto
    }
}

impl LookupStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::NestedLoop => "nested-loop",
            Self::HashIndex => "hash-index",
        }
    }
}

impl fmt::Display for LookupStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LookupStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "nested-loop" => Ok(Self::NestedLoop),
            "hash-index" => Ok(Self::HashIndex),
            other => Err(format!(
                "unknown lookup strategy {other:?}: expected auto, nested-loop or hash-index"
            )),
        }
    }
}

/// Join engine settings.
///
/// The lookup strategy only affects speed; every strategy yields the same relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoinOptions {
    pub strategy: LookupStrategy,
    /// Minimum probed-side row count for [`LookupStrategy::Auto`] to build a hash index.
    pub hash_threshold_rows: usize,
}

impl Default for JoinOptions {
    fn default() -> Self {
        Self {
            strategy: LookupStrategy::Auto,
            hash_threshold_rows: 32,
        }
    }
}

impl JoinOptions {
    #[must_use]
    pub fn with_strategy(strategy: LookupStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// Whether a probed side with `rows` rows gets a hash index.
    #[must_use]
    pub fn uses_hash_index(&self, rows: usize) -> bool {
        match self.strategy {
            LookupStrategy::Auto => rows >= self.hash_threshold_rows,
            LookupStrategy::NestedLoop => false,
            LookupStrategy::HashIndex => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_switches_on_threshold() {
        let options = JoinOptions::default();
        assert!(!options.uses_hash_index(31));
        assert!(options.uses_hash_index(32));
        assert!(!JoinOptions::with_strategy(LookupStrategy::NestedLoop).uses_hash_index(10_000));
        assert!(JoinOptions::with_strategy(LookupStrategy::HashIndex).uses_hash_index(0));
    }

    #[test]
    fn partial_settings_fill_in_defaults() {
        let options: JoinOptions =
            serde_json::from_str(r#"{ "strategy": "hash-index" }"#).unwrap();
        assert_eq!(options.strategy, LookupStrategy::HashIndex);
        assert_eq!(options.hash_threshold_rows, 32);
    }

    #[test]
    fn strategy_parses_cli_spelling() {
        assert_eq!("nested-loop".parse(), Ok(LookupStrategy::NestedLoop));
        assert!("hash".parse::<LookupStrategy>().is_err());
    }
}
