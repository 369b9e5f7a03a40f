//! Error types for the Google Groups connector.

use thiserror::Error;

/// Result type alias using [`GroupsError`].
pub type GroupsResult<T> = Result<T, GroupsError>;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur when talking to the groups service.
///
/// Every operation error is terminal for the call that raised it; the
/// host framework decides whether to retry at a higher level. The kinds
/// do not distinguish "network unreachable" from "site behavior
/// changed"; both surface under the operation that failed, with
/// differing messages.
#[derive(Debug, Error)]
pub enum GroupsError {
    /// Connector configuration was rejected before any request went out.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// The login flow did not leave the session in an authenticated state.
    #[error("log in failed: {message}")]
    AuthenticationFailed {
        message: String,
        /// Cookies the authentication fingerprint requires, as
        /// `domain:path:name`.
        expected: Vec<String>,
        #[source]
        source: Option<BoxedSource>,
    },

    /// The logout flow did not return the session to an unauthenticated
    /// state.
    #[error("log out failed: {message}")]
    LogoutFailed {
        message: String,
        /// Fingerprint cookies still present after logout, as
        /// `domain:path:name`, in check order. Empty when the failure was
        /// not about surviving cookies.
        remaining: Vec<String>,
        #[source]
        source: Option<BoxedSource>,
    },

    /// The roster export could not be retrieved or decoded.
    #[error("roster fetch failed: {message}")]
    RosterFetchFailed {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },
}

impl GroupsError {
    /// Create an invalid-configuration error.
    pub(crate) fn invalid_configuration(message: impl Into<String>) -> Self {
        GroupsError::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Create an authentication failure.
    pub(crate) fn login_failed(message: impl Into<String>, expected: Vec<String>) -> Self {
        GroupsError::AuthenticationFailed {
            message: message.into(),
            expected,
            source: None,
        }
    }

    /// Create an authentication failure with an underlying cause.
    pub(crate) fn login_failed_with_source(
        message: impl Into<String>,
        expected: Vec<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        GroupsError::AuthenticationFailed {
            message: message.into(),
            expected,
            source: Some(Box::new(source)),
        }
    }

    /// Create a logout failure caused by surviving session cookies.
    pub(crate) fn logout_stale_cookies(remaining: Vec<String>) -> Self {
        GroupsError::LogoutFailed {
            message: format!("session cookies still present: {}", remaining.join(", ")),
            remaining,
            source: None,
        }
    }

    /// Create a logout failure unrelated to surviving cookies.
    pub(crate) fn logout_failed(message: impl Into<String>) -> Self {
        GroupsError::LogoutFailed {
            message: message.into(),
            remaining: Vec::new(),
            source: None,
        }
    }

    /// Create a logout failure with an underlying cause.
    pub(crate) fn logout_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        GroupsError::LogoutFailed {
            message: message.into(),
            remaining: Vec::new(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a roster-fetch failure.
    pub(crate) fn roster_fetch(message: impl Into<String>) -> Self {
        GroupsError::RosterFetchFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create a roster-fetch failure with an underlying cause.
    pub(crate) fn roster_fetch_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        GroupsError::RosterFetchFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
