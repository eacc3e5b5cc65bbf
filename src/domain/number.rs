use crate::error::PoolError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two number formats the pool accepts.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NumberKind {
    /// `+7` followed by exactly ten digits.
    International,
    /// Exactly ten digits, starting with `9`.
    Local,
}

/// A validated phone number. Construction is the only place format rules are
/// enforced; everything downstream can rely on the key being well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn parse(raw: &str, kind: NumberKind) -> Result<Self, PoolError> {
        let raw = raw.trim();
        let ok = match kind {
            NumberKind::International => raw
                .strip_prefix("+7")
                .is_some_and(|rest| rest.len() == 10 && rest.bytes().all(|b| b.is_ascii_digit())),
            NumberKind::Local => {
                raw.len() == 10 && raw.starts_with('9') && raw.bytes().all(|b| b.is_ascii_digit())
            }
        };
        if ok {
            Ok(Self(raw.to_string()))
        } else {
            Err(PoolError::Validation(format!(
                "malformed {kind:?} number: {raw}"
            )))
        }
    }

    /// Wraps an already-known key without re-validating the format. Meant
    /// for looking up numbers that entered the system through [`Self::parse`];
    /// an unknown key simply misses.
    pub fn new_unchecked(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_format() {
        assert!(PhoneNumber::parse("9123456789", NumberKind::Local).is_ok());
        assert!(PhoneNumber::parse("8123456789", NumberKind::Local).is_err());
        assert!(PhoneNumber::parse("912345678", NumberKind::Local).is_err());
        assert!(PhoneNumber::parse("91234567890", NumberKind::Local).is_err());
        assert!(PhoneNumber::parse("91234a6789", NumberKind::Local).is_err());
    }

    #[test]
    fn test_international_format() {
        assert!(PhoneNumber::parse("+79123456789", NumberKind::International).is_ok());
        assert!(PhoneNumber::parse("79123456789", NumberKind::International).is_err());
        assert!(PhoneNumber::parse("+7912345678", NumberKind::International).is_err());
        assert!(PhoneNumber::parse("+7912345678x", NumberKind::International).is_err());
    }

    #[test]
    fn test_whitespace_trimmed() {
        let phone = PhoneNumber::parse(" 9123456789 ", NumberKind::Local).unwrap();
        assert_eq!(phone.as_str(), "9123456789");
    }
}
