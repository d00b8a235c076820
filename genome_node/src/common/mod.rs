//! Types shared by the upstream clients.

use sha2::{Digest, Sha256};

/// Result of a call that may substitute a local value when the upstream
/// dependency is unreachable or misbehaves.
#[derive(Debug, Clone, PartialEq)]
pub enum Fallback<T> {
    /// The upstream call produced the value.
    Succeeded(T),
    /// The upstream call failed; the value was produced locally.
    FellBack(T, String),
}

impl<T> Fallback<T> {
    pub fn value(&self) -> &T {
        match self {
            Fallback::Succeeded(value) | Fallback::FellBack(value, _) => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Fallback::Succeeded(value) | Fallback::FellBack(value, _) => value,
        }
    }

    pub fn fell_back(&self) -> bool {
        matches!(self, Fallback::FellBack(..))
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Fallback::Succeeded(_) => None,
            Fallback::FellBack(_, reason) => Some(reason),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Fallback<U> {
        match self {
            Fallback::Succeeded(value) => Fallback::Succeeded(f(value)),
            Fallback::FellBack(value, reason) => Fallback::FellBack(f(value), reason),
        }
    }
}

/// Hex-encoded SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
