//! Secure API-token handling using the secrecy crate
//!
//! The export token grants full data access to a project, so it gets the
//! same treatment a password would: memory is zeroed when the value is
//! dropped, `Debug` output is redacted, and reading the value requires an
//! explicit `expose_secret()` call. The token only leaves the process inside
//! the encoded request body.
//!
//! # Example
//!
//! ```rust
//! use redcap_export::config::{secret_string, SecretString};
//! use secrecy::ExposeSecret;
//!
//! let token: SecretString = secret_string("0123456789ABCDEF".to_string());
//!
//! // Access requires an explicit call
//! assert_eq!(token.expose_secret().as_ref(), "0123456789ABCDEF");
//!
//! // Debug output is redacted
//! assert!(!format!("{token:?}").contains("0123456789ABCDEF"));
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret, SerializableSecret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// Newtype wrapper for String that implements the required traits for Secret
#[derive(Clone, Debug, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}
impl SerializableSecret for SecretValue {}

impl From<String> for SecretValue {
    fn from(s: String) -> Self {
        SecretValue(s)
    }
}

impl PartialEq<str> for SecretValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl SecretValue {
    /// Check if the secret value is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for SecretValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretValue)
    }
}

/// Type alias for a secret string
///
/// This wraps a `SecretValue` in a `Secret` container that:
/// - Zeros the memory when dropped
/// - Prevents accidental logging via Debug
/// - Requires explicit `expose_secret()` to access
pub type SecretString = Secret<SecretValue>;

/// Helper function to create a SecretString from a String
#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_secret_string_creation() {
        let secret = secret_string("test-token".to_string());
        assert_eq!(secret.expose_secret().as_ref(), "test-token");
    }

    #[test]
    fn test_secret_debug_redacted() {
        let secret = secret_string("sensitive-token".to_string());
        let debug_output = format!("{secret:?}");

        assert!(!debug_output.contains("sensitive-token"));
        assert!(debug_output.contains("REDACTED") || debug_output.contains("Secret"));
    }

    #[test]
    fn test_secret_value_is_empty() {
        assert!(secret_string(String::new()).expose_secret().is_empty());
        assert!(!secret_string("x".to_string()).expose_secret().is_empty());
    }

    #[test]
    fn test_secret_deserializes_from_toml() {
        #[derive(Deserialize)]
        struct TestConfig {
            token: SecretString,
        }

        let config: TestConfig = toml::from_str(r#"token = "ABC123""#).unwrap();
        assert_eq!(config.token.expose_secret().as_ref(), "ABC123");
    }
}
