//! Zeroizing wrapper for API credentials.
//!
//! Both upstream systems are authenticated with long-lived static tokens
//! loaded from the environment; `SecureString` keeps them out of logs and
//! clears them from memory on drop.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::Zeroizing;

/// A credential string that is redacted in `Debug`/`Display` output and
/// zeroized when dropped.
#[derive(Clone)]
pub struct SecureString(Zeroizing<String>);

impl SecureString {
    pub fn new(s: String) -> Self {
        Self(Zeroizing::new(s))
    }

    /// Exposes the underlying secret. Avoid copying the returned value;
    /// copies are not zeroized.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for SecureString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecureString {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

impl Default for SecureString {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecureString([REDACTED])")
    }
}

impl fmt::Display for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl PartialEq for SecureString {
    fn eq(&self, other: &Self) -> bool {
        // Constant-time comparison to prevent timing attacks
        use subtle::ConstantTimeEq;
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl Eq for SecureString {}

impl Serialize for SecureString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SecureString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecureString::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expose_secret() {
        let secret = SecureString::from("token-123");
        assert_eq!(secret.expose_secret(), "token-123");
        assert!(!secret.is_empty());
    }

    #[test]
    fn test_debug_and_display_redacted() {
        let secret = SecureString::from("jwt-bearer-token");
        assert!(!format!("{:?}", secret).contains("jwt"));
        assert!(!format!("{}", secret).contains("jwt"));
    }

    #[test]
    fn test_equality() {
        assert_eq!(SecureString::from("a"), SecureString::from("a"));
        assert_ne!(SecureString::from("a"), SecureString::from("b"));
    }

    #[test]
    fn test_serde_round_trip() {
        let original = SecureString::from("env-key");
        let json = serde_json::to_string(&original).unwrap();
        let back: SecureString = serde_json::from_str(&json).unwrap();
        assert_eq!(original, back);
    }
}
