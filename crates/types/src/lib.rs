//! # Cartella Types
//!
//! Validated primitive types shared across the Cartella crates.
//!
//! Path parameters arrive as raw strings. The types here turn them into values that are known to be
//! valid, so the rest of the system never has to re-check them:
//!
//! - [`PatientId`] and [`ReportId`] are strictly positive integers.
//! - [`NonEmptyText`] is trimmed text with at least one non-whitespace character.

use std::fmt;
use std::str::FromStr;

/// Errors that can occur when creating validated text types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// A string type that guarantees non-empty content.
///
/// The input is trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Errors
    ///
    /// Returns `TextError::Empty` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Errors produced when parsing a positive identifier.
///
/// The `label` is the parameter name as the caller sees it (`patient_id`, `report_id`), so the
/// rendered message can be returned to API clients unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("{label} must be a valid integer")]
    NotAnInteger { label: &'static str },
    #[error("{label} must be positive")]
    NotPositive { label: &'static str },
}

fn parse_positive(input: &str, label: &'static str) -> Result<u64, IdError> {
    let value: i64 = input
        .trim()
        .parse()
        .map_err(|_| IdError::NotAnInteger { label })?;
    if value <= 0 {
        return Err(IdError::NotPositive { label });
    }
    // value > 0, so the conversion cannot lose information.
    Ok(value as u64)
}

macro_rules! positive_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u64);

        impl $name {
            /// Parameter name used in validation messages.
            pub const LABEL: &'static str = $label;

            /// Parses an externally supplied identifier (path segment, CLI argument).
            ///
            /// Surrounding whitespace is ignored. Leading `+` and zero padding are accepted.
            ///
            /// # Errors
            ///
            /// Returns [`IdError::NotAnInteger`] if the input is not an integer, or
            /// [`IdError::NotPositive`] if it is zero or negative.
            pub fn parse(input: &str) -> Result<Self, IdError> {
                parse_positive(input, $label).map(Self)
            }

            /// Wraps a numeric value, rejecting zero.
            pub fn new(value: u64) -> Result<Self, IdError> {
                if value == 0 {
                    return Err(IdError::NotPositive { label: $label });
                }
                Ok(Self(value))
            }

            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_u64(self.0)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let value = u64::deserialize(deserializer)?;
                $name::new(value).map_err(serde::de::Error::custom)
            }
        }
    };
}

positive_id!(
    /// Identifier scoping every record and report to a single patient.
    PatientId,
    "patient_id"
);

positive_id!(
    /// Per-patient report number, allocated in increasing order.
    ReportId,
    "report_id"
);

impl ReportId {
    /// The identifier following this one.
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}
