//! Secure credential handling using the secrecy crate
//!
//! The extraction service API key is held in a `Secret` so it is zeroed on
//! drop, redacted from `Debug` output, and only readable through
//! `expose_secret()`.
//!
//! # Example
//!
//! ```rust
//! use casewise::config::secret_string;
//! use secrecy::ExposeSecret;
//!
//! let api_key = secret_string("gsk-123".to_string());
//! assert_eq!(api_key.expose_secret().as_ref(), "gsk-123");
//! println!("{:?}", api_key); // Secret([REDACTED ...])
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret, SerializableSecret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// String newtype implementing the marker traits `Secret` needs
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
pub type SecretString = Secret<SecretValue>;

/// Wrap a plain string in a [`SecretString`]
#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}

/// Masked preview of a secret for status output: first four characters, rest starred
pub fn redacted_preview(secret: &SecretString) -> String {
    use secrecy::ExposeSecret;

    let value = secret.expose_secret().as_ref();
    if value.chars().count() <= 4 {
        return "****".to_string();
    }
    let prefix: String = value.chars().take(4).collect();
    format!("{prefix}****")
}
