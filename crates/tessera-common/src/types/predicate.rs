//! Predicate condition tags handed to scan operators.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The comparison a scan operator evaluates against its right-hand values.
///
/// Predicates arrive here pre-resolved by the plan layer: column ids on
/// the left, literal values on the right (two values for the between
/// flavors). `Like`/`NotLike` exist in the vocabulary but are rejected
/// by index-based scans.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum PredicateCondition {
    /// `column = value`
    Equals,
    /// `column <> value`
    NotEquals,
    /// `column < value`
    LessThan,
    /// `column <= value`
    LessThanEquals,
    /// `column > value`
    GreaterThan,
    /// `column >= value`
    GreaterThanEquals,
    /// `value <= column <= value2`
    BetweenInclusive,
    /// `value < column <= value2`
    BetweenLowerExclusive,
    /// `value <= column < value2`
    BetweenUpperExclusive,
    /// `value < column < value2`
    BetweenExclusive,
    /// SQL `LIKE` — not supported by index scans.
    Like,
    /// SQL `NOT LIKE` — not supported by index scans.
    NotLike,
}

impl PredicateCondition {
    /// Returns `true` for the four between flavors, which carry a second
    /// right-hand value vector.
    #[must_use]
    pub const fn is_between(self) -> bool {
        matches!(
            self,
            Self::BetweenInclusive
                | Self::BetweenLowerExclusive
                | Self::BetweenUpperExclusive
                | Self::BetweenExclusive
        )
    }
}

impl fmt::Display for PredicateCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Equals => "=",
            Self::NotEquals => "<>",
            Self::LessThan => "<",
            Self::LessThanEquals => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanEquals => ">=",
            Self::BetweenInclusive => "BETWEEN INCLUSIVE",
            Self::BetweenLowerExclusive => "BETWEEN LOWER EXCLUSIVE",
            Self::BetweenUpperExclusive => "BETWEEN UPPER EXCLUSIVE",
            Self::BetweenExclusive => "BETWEEN EXCLUSIVE",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_between() {
        assert!(PredicateCondition::BetweenInclusive.is_between());
        assert!(PredicateCondition::BetweenLowerExclusive.is_between());
        assert!(PredicateCondition::BetweenUpperExclusive.is_between());
        assert!(PredicateCondition::BetweenExclusive.is_between());
        assert!(!PredicateCondition::Equals.is_between());
        assert!(!PredicateCondition::Like.is_between());
    }
}
