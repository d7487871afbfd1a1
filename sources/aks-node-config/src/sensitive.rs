use serde::{Deserialize, Serialize};
use std::fmt;

const REDACTED: &str = "[REDACTED]";

/// A string holding secret material such as passwords, tokens or private keys.
///
/// The value is carried verbatim through serialization so the configuration round-trips, but the
/// `Debug` and `Display` forms are redacted, which keeps secrets out of log lines that print a
/// configuration record.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensitiveString(String);

impl SensitiveString {
    pub fn new<S: Into<String>>(value: S) -> Self {
        Self(value.into())
    }

    /// Returns the secret itself.  Only call this where the value is handed to its consumer.
    pub fn unsafe_value(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SensitiveString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl fmt::Display for SensitiveString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl From<String> for SensitiveString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SensitiveString {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[cfg(test)]
mod test {
    use super::SensitiveString;

    #[test]
    fn formatting_is_redacted() {
        let secret = SensitiveString::from("hunter2");
        assert_eq!(format!("{}", secret), "[REDACTED]");
        assert_eq!(format!("{:?}", secret), "[REDACTED]");
        assert_eq!(secret.unsafe_value(), "hunter2");
    }

    #[test]
    fn serializes_verbatim() {
        let secret = SensitiveString::from("hunter2");
        assert_eq!(serde_json::to_string(&secret).unwrap(), r#""hunter2""#);
        let back: SensitiveString = serde_json::from_str(r#""hunter2""#).unwrap();
        assert_eq!(back, secret);
    }
}
