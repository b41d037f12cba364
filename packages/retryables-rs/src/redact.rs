//! Secret redaction for private keys in logs and debug output.
//!
//! Configuration structs hold signer keys as [`Redacted<String>`] so that a
//! stray `{:?}` or `tracing` field never prints them. Use [`Redacted::expose`]
//! at the single point where the key is handed to a signer.

use std::fmt::{self, Debug, Display};

/// Wrapper that redacts its inner value when formatted or serialized.
///
/// # Example
///
/// ```ignore
/// use retryables_rs::redact::Redacted;
///
/// let key = Redacted("0xac09...".to_string());
/// tracing::info!(key = %key, "Loaded parent signer");
/// // Logs: key = <redacted>
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Redacted<T>(pub T);

impl<T> Redacted<T> {
    /// Borrow the secret value
    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl<T> From<T> for Redacted<T> {
    fn from(value: T) -> Self {
        Redacted(value)
    }
}

impl<T> Debug for Redacted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

impl<T> Display for Redacted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

impl<T> serde::Serialize for Redacted<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        "<redacted>".serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacted_formatting() {
        let key = Redacted("0xdeadbeef".to_string());
        assert_eq!(format!("{}", key), "<redacted>");
        assert_eq!(format!("{:?}", key), "<redacted>");
        assert_eq!(key.expose(), "0xdeadbeef");
    }

    #[test]
    fn test_redacted_inside_debug_struct() {
        #[derive(Debug)]
        #[allow(dead_code)]
        struct Keys {
            parent: Redacted<String>,
        }

        let keys = Keys {
            parent: "0xdeadbeef".to_string().into(),
        };
        let out = format!("{:?}", keys);
        assert!(!out.contains("deadbeef"));
        assert!(out.contains("<redacted>"));
    }

    #[test]
    fn test_redacted_serialize() {
        let json = serde_json::to_string(&Redacted("secret")).unwrap();
        assert_eq!(json, "\"<redacted>\"");
    }
}
