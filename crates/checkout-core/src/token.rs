//! # Confirmation Token
//!
//! Opaque token issued by the backend for one checkout attempt.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A non-empty confirmation token.
///
/// Construction goes through [`ConfirmationToken::parse`], so holding one
/// means a checkout was actually requested.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfirmationToken(String);

impl ConfirmationToken {
    /// Parse a raw token. Absent, empty and whitespace-only input yields `None`.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        let trimmed = raw?.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened form for log lines
    pub fn redacted(&self) -> String {
        let prefix: String = self.0.chars().take(6).collect();
        if prefix.len() < self.0.len() {
            format!("{}…", prefix)
        } else {
            prefix
        }
    }
}

// Tokens authorize a payment; keep them out of Debug output.
impl fmt::Debug for ConfirmationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConfirmationToken")
            .field(&self.redacted())
            .finish()
    }
}

impl AsRef<str> for ConfirmationToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_empty() {
        assert!(ConfirmationToken::parse(None).is_none());
        assert!(ConfirmationToken::parse(Some("")).is_none());
        assert!(ConfirmationToken::parse(Some("  \t")).is_none());
    }

    #[test]
    fn test_parse_trims() {
        let token = ConfirmationToken::parse(Some(" ct-2d4f ")).unwrap();
        assert_eq!(token.as_str(), "ct-2d4f");
    }

    #[test]
    fn test_redacted() {
        let token = ConfirmationToken::parse(Some("ct-287e0c37-000f-5000-8000-16961d35b0fd")).unwrap();
        assert_eq!(token.redacted(), "ct-287…");
        assert!(!format!("{:?}", token).contains("16961d35b0fd"));

        let short = ConfirmationToken::parse(Some("tok")).unwrap();
        assert_eq!(short.redacted(), "tok");
    }
}
