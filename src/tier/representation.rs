use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

/// Name of the untouched upload.
pub const ORIGINAL: &str = "original";

/// Maximum length of a representation name.
const MAX_NAME_LEN: usize = 64;

/// A named form of an image: `original` or a derived kind such as `thumb200`.
///
/// Names are restricted to lowercase ASCII letters, digits, `-` and `_` so they
/// can be embedded in URL paths, query strings and storage keys unescaped.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Representation(String);

impl Representation {
    /// Parse and validate a representation name.
    pub fn new(name: impl Into<String>) -> Result<Self, PolicyError> {
        let name = name.into();
        let valid = !name.is_empty()
            && name.len() <= MAX_NAME_LEN
            && name
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_');

        if valid {
            Ok(Self(name))
        } else {
            Err(PolicyError::InvalidRepresentation(name))
        }
    }

    /// The original upload.
    pub fn original() -> Self {
        Self(ORIGINAL.to_string())
    }

    pub fn is_original(&self) -> bool {
        self.0 == ORIGINAL
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Representation {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Representation {
    type Error = PolicyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Representation> for String {
    fn from(value: Representation) -> Self {
        value.0
    }
}

impl AsRef<str> for Representation {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Representation {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Representation {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
