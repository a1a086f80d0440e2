//! Error types for the PanoNav environment abstraction.

use thiserror::Error;

/// Errors that can occur while navigating through a panorama provider.
///
/// "No panorama near the sampled point" is deliberately absent: that is
/// retry policy, handled inside the locator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NavError {
    /// The provider could not answer (network failure, outage, quota)
    #[error("Panorama lookup unavailable: {0}")]
    LookupUnavailable(String),

    /// Viewpoint state is missing or malformed
    #[error("Invalid viewpoint: {0}")]
    InvalidViewpoint(String),

    /// The provider rejected a panorama identifier
    #[error("Unknown panorama: {0}")]
    UnknownPanorama(String),

    /// A bounded retry policy gave up
    #[error("No panorama found after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    /// Observation encoding failed
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl NavError {
    /// Creates a lookup-unavailable error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::LookupUnavailable(msg.into())
    }

    /// Creates an invalid-viewpoint error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidViewpoint(msg.into())
    }

    /// Creates an unknown-panorama error.
    pub fn unknown(pano: impl std::fmt::Display) -> Self {
        Self::UnknownPanorama(pano.to_string())
    }

    /// Returns true if retrying the same request later might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::LookupUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            NavError::RetriesExhausted { attempts: 3 }.to_string(),
            "No panorama found after 3 attempts"
        );
        assert_eq!(
            NavError::unknown("abc").to_string(),
            "Unknown panorama: abc"
        );
    }

    #[test]
    fn test_transient() {
        assert!(NavError::unavailable("quota").is_transient());
        assert!(!NavError::invalid("no pano").is_transient());
    }
}
