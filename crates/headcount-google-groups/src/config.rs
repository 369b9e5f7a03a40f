//! Connector configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::{GroupsError, GroupsResult};

/// Administrator credentials for the groups service.
///
/// Values are not validated up front; empty or wrong credentials surface
/// later as authentication failures, which is where the host framework
/// expects them.
#[derive(Clone, Deserialize)]
pub struct GoogleGroupsCredentials {
    /// Account name used to sign in (an email address).
    pub username: String,
    /// Account password.
    pub password: SecretString,
}

impl std::fmt::Debug for GoogleGroupsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleGroupsCredentials")
            .field("username", &self.username)
            .field("password", &"***REDACTED***")
            .finish()
    }
}

/// Service endpoints consumed by the connector.
///
/// The defaults are the service's fixed URLs; overriding them is only
/// expected in tests, the same way a different cloud environment would
/// swap a base URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEndpoints {
    /// URL of the login page carrying the sign-in form.
    #[serde(default = "default_login_url")]
    pub login_url: String,

    /// URL that terminates the session.
    #[serde(default = "default_logout_url")]
    pub logout_url: String,

    /// Member-export URL template; `{group}` is replaced with the
    /// configured group identifier.
    #[serde(default = "default_export_url_template")]
    pub export_url_template: String,
}

fn default_login_url() -> String {
    "https://accounts.google.com/ServiceLogin\
     ?continue=https%3A%2F%2Fgroups.google.com%2Fd%2Foverview\
     &hl=en&service=groups2&passive=true"
        .to_string()
}

fn default_logout_url() -> String {
    "https://accounts.google.com/Logout?hl=en".to_string()
}

fn default_export_url_template() -> String {
    "https://groups.google.com/forum/exportmembers/{group}".to_string()
}

impl Default for ServiceEndpoints {
    fn default() -> Self {
        Self {
            login_url: default_login_url(),
            logout_url: default_logout_url(),
            export_url_template: default_export_url_template(),
        }
    }
}

impl ServiceEndpoints {
    /// The export URL for a specific group.
    pub fn export_url(&self, group: &str) -> String {
        self.export_url_template.replace("{group}", group)
    }
}

/// Connection settings (timeouts).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// Connection timeout in seconds.
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,

    /// Read timeout in seconds.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
}

fn default_connection_timeout() -> u64 {
    30
}

fn default_read_timeout() -> u64 {
    60
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            connection_timeout_secs: default_connection_timeout(),
            read_timeout_secs: default_read_timeout(),
        }
    }
}

impl ConnectionSettings {
    /// Get connection timeout as Duration.
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    /// Get read timeout as Duration.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

/// Configuration for the Google Groups connector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleGroupsConfig {
    /// Group identifier; used to derive the export endpoint.
    pub group: String,

    /// Service endpoints.
    #[serde(default)]
    pub endpoints: ServiceEndpoints,

    /// Connection settings (timeouts).
    #[serde(default)]
    pub connection: ConnectionSettings,

    /// Page titles accepted as proof that logout landed back on the
    /// login flow. The observed flow has more than one variant, so the
    /// set is configurable rather than a single hard-coded literal.
    #[serde(default = "default_post_logout_titles")]
    pub post_logout_titles: Vec<String>,

    /// Directory roster exports are spooled to before decoding.
    /// Defaults to the system temp directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spool_dir: Option<PathBuf>,

    /// Name of the sign-in form's account field.
    #[serde(default = "default_login_email_field")]
    pub login_email_field: String,

    /// Name of the sign-in form's password field.
    #[serde(default = "default_login_password_field")]
    pub login_password_field: String,
}

fn default_post_logout_titles() -> Vec<String> {
    vec!["Google Accounts".to_string()]
}

fn default_login_email_field() -> String {
    "Email".to_string()
}

fn default_login_password_field() -> String {
    "Passwd".to_string()
}

impl GoogleGroupsConfig {
    /// Create a configuration for one group with default endpoints.
    pub fn new(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            endpoints: ServiceEndpoints::default(),
            connection: ConnectionSettings::default(),
            post_logout_titles: default_post_logout_titles(),
            spool_dir: None,
            login_email_field: default_login_email_field(),
            login_password_field: default_login_password_field(),
        }
    }

    /// Override the service endpoints.
    #[must_use]
    pub fn with_endpoints(mut self, endpoints: ServiceEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Override the connection settings.
    #[must_use]
    pub fn with_connection(mut self, connection: ConnectionSettings) -> Self {
        self.connection = connection;
        self
    }

    /// Replace the accepted post-logout page titles.
    #[must_use]
    pub fn with_post_logout_titles(mut self, titles: Vec<String>) -> Self {
        self.post_logout_titles = titles;
        self
    }

    /// Spool roster exports into a specific directory.
    #[must_use]
    pub fn with_spool_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.spool_dir = Some(dir.into());
        self
    }

    /// Validate structural configuration.
    ///
    /// Credential and group values are deliberately not checked here;
    /// wrong values surface as authentication or roster-fetch failures.
    pub fn validate(&self) -> GroupsResult<()> {
        for (label, value) in [
            ("login_url", &self.endpoints.login_url),
            ("logout_url", &self.endpoints.logout_url),
        ] {
            url::Url::parse(value).map_err(|e| {
                GroupsError::invalid_configuration(format!("{label} is not a valid URL: {e}"))
            })?;
        }
        if self.endpoints.export_url_template.is_empty() {
            return Err(GroupsError::invalid_configuration(
                "export_url_template must not be empty",
            ));
        }
        if self.post_logout_titles.is_empty() {
            return Err(GroupsError::invalid_configuration(
                "post_logout_titles must contain at least one accepted title",
            ));
        }
        Ok(())
    }
}
