//! Strategy vocabulary and selector validation.

use std::fmt;
use std::str::FromStr;

use crate::error::{FileError, FileResult};

/// A named transformation from one collection to a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Independent copies of every member.
    Clone,
    /// Gzip-compressed derivatives under the same paths.
    Gzip,
    /// Gzip-compressed derivatives with a `.gz` suffix appended.
    GzipSuffix,
}

impl Strategy {
    /// Every strategy, in vocabulary order.
    pub const ALL: [Self; 3] = [Self::Clone, Self::Gzip, Self::GzipSuffix];

    /// Name used on the command line and in configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Clone => "clone",
            Self::Gzip => "gzip",
            Self::GzipSuffix => "gzip-suffix",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = FileError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == value)
            .ok_or_else(|| {
                FileError::validation("strategy", "unknown strategy", Some(value.to_string()))
            })
    }
}

/// One strategy name or an ordered list of names, as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategySelector {
    /// A single name.
    One(String),
    /// An ordered list of names.
    Many(Vec<String>),
}

impl StrategySelector {
    /// Validate every name, preserving order.
    ///
    /// # Errors
    ///
    /// Returns [`FileError::Validation`] for an empty name, an empty list, or
    /// a name outside the vocabulary.
    pub fn resolve(&self) -> FileResult<Vec<Strategy>> {
        match self {
            Self::One(name) if name.is_empty() => Err(FileError::validation(
                "strategy",
                "empty strategy name",
                None,
            )),
            Self::One(name) => Ok(vec![name.parse()?]),
            Self::Many(names) if names.is_empty() => Err(FileError::validation(
                "strategy",
                "empty strategy list",
                None,
            )),
            Self::Many(names) => names.iter().map(|name| name.parse::<Strategy>()).collect(),
        }
    }
}

impl From<&str> for StrategySelector {
    fn from(name: &str) -> Self {
        Self::One(name.to_string())
    }
}

impl From<String> for StrategySelector {
    fn from(name: String) -> Self {
        Self::One(name)
    }
}

impl From<Vec<String>> for StrategySelector {
    fn from(names: Vec<String>) -> Self {
        Self::Many(names)
    }
}

impl From<&[&str]> for StrategySelector {
    fn from(names: &[&str]) -> Self {
        Self::Many(names.iter().map(|name| (*name).to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for StrategySelector {
    fn from(names: [&str; N]) -> Self {
        Self::from(&names[..])
    }
}

impl From<Strategy> for StrategySelector {
    fn from(strategy: Strategy) -> Self {
        Self::One(strategy.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_parse() -> anyhow::Result<()> {
        for strategy in Strategy::ALL {
            assert_eq!(strategy.as_str().parse::<Strategy>()?, strategy);
        }
        assert_eq!(Strategy::GzipSuffix.to_string(), "gzip-suffix");
        Ok(())
    }

    #[test]
    fn selector_resolves_in_order() -> anyhow::Result<()> {
        let resolved = StrategySelector::from(["gzip", "clone"]).resolve()?;
        assert_eq!(resolved, vec![Strategy::Gzip, Strategy::Clone]);

        let single = StrategySelector::from("gzip-suffix").resolve()?;
        assert_eq!(single, vec![Strategy::GzipSuffix]);
        Ok(())
    }

    #[test]
    fn selector_rejects_empty_and_unknown_names() {
        let cases = [
            StrategySelector::from(""),
            StrategySelector::Many(Vec::new()),
            StrategySelector::from("bogus"),
            StrategySelector::from(["clone", "zip"]),
        ];
        for selector in cases {
            let err = selector.resolve().err();
            assert!(
                err.as_ref().is_some_and(FileError::is_validation),
                "{selector:?} should fail validation"
            );
        }
    }

    #[test]
    fn unknown_name_is_reported_as_value() {
        let err = "bogus".parse::<Strategy>().err();
        assert!(matches!(
            err,
            Some(FileError::Validation {
                field: "strategy",
                value: Some(ref value),
                ..
            }) if value == "bogus"
        ));
    }
}
