//! Secret redaction for private keys in logs and debug output.
//!
//! [`Redacted`] never exposes its inner value through `Debug`, `Display` or
//! `Serialize`; all three render as `"<redacted>"`.

use std::fmt::{self, Debug, Display};

/// Wrapper that redacts its inner value when formatted or serialized.
///
/// ```ignore
/// use bridge_bindings::redact::Redacted;
///
/// tracing::info!(key = %Redacted(&private_key), "Loaded signer");
/// // Logs: key = <redacted>
/// ```
#[derive(Clone, Copy)]
pub struct Redacted<T>(pub T);

impl<T> Redacted<T> {
    /// Access the wrapped value (never log the result)
    pub fn expose(&self) -> &T {
        &self.0
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
