//! Language codes used to key every cached row and cache entry.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lowercase ISO language code (`"en"`, `"de"`, `"pt-br"`).
///
/// Cache tables are denormalized per language: every row and every transient
/// cache key carries one of these.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageCode(String);

impl LanguageCode {
    /// The language used when callers do not specify one.
    pub const DEFAULT: &'static str = "en";

    /// Parses a language code, normalizing case and surrounding whitespace.
    pub fn parse(value: &str) -> Result<Self, String> {
        let normalized = value.trim().to_lowercase();
        let valid = (2..=8).contains(&normalized.len())
            && normalized
                .chars()
                .all(|c| c.is_ascii_lowercase() || c == '-');
        if !valid {
            return Err(format!("invalid language code '{}'", value));
        }
        Ok(Self(normalized))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for LanguageCode {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LanguageCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for LanguageCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<LanguageCode> for String {
    fn from(code: LanguageCode) -> Self {
        code.0
    }
}

impl AsRef<str> for LanguageCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_english() {
        assert_eq!(LanguageCode::default().as_str(), "en");
    }

    #[test]
    fn test_parse_normalizes() {
        assert_eq!(LanguageCode::parse(" DE ").unwrap().as_str(), "de");
        assert_eq!(LanguageCode::parse("pt-BR").unwrap().as_str(), "pt-br");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(LanguageCode::parse("").is_err());
        assert!(LanguageCode::parse("e").is_err());
        assert!(LanguageCode::parse("en_US").is_err());
        assert!(LanguageCode::parse("english-language").is_err());
    }

    #[test]
    fn test_serde_roundtrip_through_string() {
        let code: LanguageCode = serde_json::from_str("\"TR\"").unwrap();
        assert_eq!(code.as_str(), "tr");
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"tr\"");
    }
}
