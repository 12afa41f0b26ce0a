//! Street width as a coarse proxy for surrounding obstruction.
//!
//! # Examples
//! ```
//! use sunseat_core::StreetWidth;
//!
//! assert_eq!(StreetWidth::Narrow.as_str(), "narrow");
//! assert_eq!("wide".parse::<StreetWidth>(), Ok(StreetWidth::Wide));
//! assert_eq!(StreetWidth::default(), StreetWidth::Medium);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How open the street in front of a terrace is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreetWidth {
    /// Tall facades close together; shades early and late.
    Narrow,
    /// Typical city street.
    #[default]
    Medium,
    /// Boulevards, squares and waterfronts.
    Wide,
}

/// Error returned when parsing an unknown street width.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown street width '{0}'")]
pub struct ParseStreetWidthError(pub String);

impl StreetWidth {
    /// Return the width as a lowercase `&str`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Narrow => "narrow",
            Self::Medium => "medium",
            Self::Wide => "wide",
        }
    }

    /// Score penalty applied while the sun is low.
    #[must_use]
    pub const fn low_sun_penalty(self) -> f64 {
        match self {
            Self::Narrow => 15.0,
            Self::Medium => 5.0,
            Self::Wide => 0.0,
        }
    }

    /// Fraction of wind that reaches the terrace.
    ///
    /// Narrow streets are more sheltered.
    #[must_use]
    pub const fn wind_exposure(self) -> f64 {
        match self {
            Self::Narrow => 0.5,
            Self::Medium => 0.75,
            Self::Wide => 1.0,
        }
    }
}

impl std::fmt::Display for StreetWidth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StreetWidth {
    type Err = ParseStreetWidthError;

    /// Parsing is exact: only the three lowercase names are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "narrow" => Ok(Self::Narrow),
            "medium" => Ok(Self::Medium),
            "wide" => Ok(Self::Wide),
            _ => Err(ParseStreetWidthError(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn display_matches_as_str() {
        assert_eq!(StreetWidth::Wide.to_string(), StreetWidth::Wide.as_str());
    }

    #[test]
    fn parsing_rejects_unknown_and_mixed_case() {
        assert!(StreetWidth::from_str("avenue").is_err());
        assert!(StreetWidth::from_str("Narrow").is_err());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&StreetWidth::Narrow).unwrap();
        assert_eq!(json, "\"narrow\"");
    }
}
