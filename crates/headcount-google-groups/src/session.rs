//! Authenticated web-session lifecycle.
//!
//! The session phase is never tracked in a flag. It is derived on demand
//! from a fixed cookie fingerprint, so a login request that silently
//! failed (the service answers HTTP 200 and re-renders the form on a bad
//! password) is still detected, and a logout that left artifacts behind
//! is reported with exactly which cookies survived.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use reqwest::Client;
use secrecy::ExposeSecret;
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use url::Url;

use crate::config::{ConnectionSettings, GoogleGroupsConfig, GoogleGroupsCredentials};
use crate::cookies::SessionJar;
use crate::error::{GroupsError, GroupsResult};
use crate::html::{self, FormMethod};

/// Domain carrying the bulk of the session fingerprint.
pub(crate) const GOOGLE_DOMAIN: &str = ".google.com";
/// Domain carrying the account-scoped fingerprint cookie.
pub(crate) const ACCOUNTS_DOMAIN: &str = "accounts.google.com";
/// Path shared by every fingerprint cookie.
pub(crate) const SESSION_PATH: &str = "/";
/// Fingerprint cookies under `.google.com`, in check order.
pub(crate) const GOOGLE_SESSION_COOKIES: [&str; 5] = ["APISID", "SSID", "SAPISID", "SID", "HSID"];
/// Fingerprint cookie under `accounts.google.com`.
pub(crate) const ACCOUNTS_SESSION_COOKIE: &str = "LSID";

/// Every fingerprint location as `(domain, path, name)`, in the fixed
/// check order.
fn fingerprint() -> impl Iterator<Item = (&'static str, &'static str, &'static str)> {
    GOOGLE_SESSION_COOKIES
        .iter()
        .map(|name| (GOOGLE_DOMAIN, SESSION_PATH, *name))
        .chain(std::iter::once((
            ACCOUNTS_DOMAIN,
            SESSION_PATH,
            ACCOUNTS_SESSION_COOKIE,
        )))
}

/// The full fingerprint as `domain:path:name` identifiers.
pub(crate) fn expected_cookie_ids() -> Vec<String> {
    fingerprint()
        .map(|(domain, path, name)| format!("{domain}:{path}:{name}"))
        .collect()
}

/// One web session against the groups service: an HTTP client plus the
/// cookie store it populates.
pub(crate) struct Session {
    client: Client,
    jar: Arc<SessionJar>,
}

impl Session {
    pub(crate) fn new(connection: &ConnectionSettings) -> GroupsResult<Self> {
        let jar = Arc::new(SessionJar::new());
        let client = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(connection.read_timeout())
            .connect_timeout(connection.connection_timeout())
            .build()
            .map_err(|e| {
                GroupsError::invalid_configuration(format!("failed to build HTTP client: {e}"))
            })?;
        Ok(Self { client, jar })
    }

    pub(crate) fn jar(&self) -> &SessionJar {
        &self.jar
    }

    /// Run the login protocol: fetch the login page, fill the first form
    /// with the credentials, submit it. The transport follows the
    /// post-login redirect; nothing about the response proves
    /// authentication, which is
    /// [`verify_authenticated`](Self::verify_authenticated)'s job.
    pub(crate) async fn login(
        &self,
        config: &GoogleGroupsConfig,
        credentials: &GoogleGroupsCredentials,
    ) -> GroupsResult<()> {
        let login_url = &config.endpoints.login_url;
        debug!(url = %login_url, "Fetching login page");
        let response = self.client.get(login_url).send().await.map_err(|e| {
            GroupsError::login_failed_with_source(
                "login page request failed",
                expected_cookie_ids(),
                e,
            )
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GroupsError::login_failed(
                format!("login page returned HTTP {status}"),
                expected_cookie_ids(),
            ));
        }

        let page_url = response.url().clone();
        let body = response.text().await.map_err(|e| {
            GroupsError::login_failed_with_source(
                "failed to read login page",
                expected_cookie_ids(),
                e,
            )
        })?;

        let mut form = html::first_form(&body).ok_or_else(|| {
            GroupsError::login_failed("no form found on the login page", expected_cookie_ids())
        })?;
        form.set_field(&config.login_email_field, &credentials.username);
        form.set_field(
            &config.login_password_field,
            credentials.password.expose_secret(),
        );

        let target = resolve_action(&page_url, form.action.as_deref())?;
        debug!(url = %target, "Submitting login form");
        let request = match form.method {
            FormMethod::Post => self.client.post(target).form(&form.fields),
            FormMethod::Get => self.client.get(target).query(&form.fields),
        };
        let response = request.send().await.map_err(|e| {
            GroupsError::login_failed_with_source(
                "login form submission failed",
                expected_cookie_ids(),
                e,
            )
        })?;
        debug!(status = %response.status(), "Login form submitted");
        Ok(())
    }

    /// Assert the authentication fingerprint. Cookie presence, not HTTP
    /// status, is the source of truth for the session phase.
    pub(crate) fn verify_authenticated(&self) -> GroupsResult<()> {
        let missing: Vec<&str> = fingerprint()
            .filter(|(domain, path, name)| !self.jar.contains(domain, path, name))
            .map(|(_, _, name)| name)
            .collect();
        if missing.is_empty() {
            return Ok(());
        }

        warn!(missing = ?missing, "Session cookies missing after login");
        Err(GroupsError::login_failed(
            format!(
                "expected session cookies missing; required: {}",
                expected_cookie_ids().join(", ")
            ),
            expected_cookie_ids(),
        ))
    }

    /// Whether the jar currently carries the complete fingerprint.
    pub(crate) fn is_authenticated(&self) -> bool {
        fingerprint().all(|(domain, path, name)| self.jar.contains(domain, path, name))
    }

    /// Run the logout protocol and verify teardown: no fingerprint
    /// cookie may survive, and the resulting page must look like the
    /// login flow again. On success the whole jar is cleared regardless
    /// of what the server reported.
    pub(crate) async fn logout(&self, config: &GoogleGroupsConfig) -> GroupsResult<()> {
        let logout_url = &config.endpoints.logout_url;
        debug!(url = %logout_url, "Requesting logout");
        let response = self
            .client
            .get(logout_url)
            .send()
            .await
            .map_err(|e| GroupsError::logout_failed_with_source("logout request failed", e))?;
        let body = response.text().await.map_err(|e| {
            GroupsError::logout_failed_with_source("failed to read post-logout page", e)
        })?;

        let remaining = self.remaining_fingerprint_cookies();
        if !remaining.is_empty() {
            warn!(remaining = ?remaining, "Session cookies survived logout");
            return Err(GroupsError::logout_stale_cookies(remaining));
        }

        let title = html::page_title(&body);
        let back_at_login = title
            .as_deref()
            .is_some_and(|title| config.post_logout_titles.iter().any(|want| want == title));
        if !back_at_login {
            debug!(title = ?title, "Post-logout page title did not match the login flow");
            return Err(GroupsError::logout_failed(
                "expected end of flow did not occur",
            ));
        }

        self.jar.clear();
        Ok(())
    }

    /// Fingerprint cookies still present, as `domain:path:name`, in
    /// check order.
    pub(crate) fn remaining_fingerprint_cookies(&self) -> Vec<String> {
        fingerprint()
            .filter(|(domain, path, name)| self.jar.contains(domain, path, name))
            .map(|(domain, path, name)| format!("{domain}:{path}:{name}"))
            .collect()
    }

    /// Retrieve a URL's body into a temp file under the spool directory.
    ///
    /// The file is deleted when the returned handle drops, whichever way
    /// the caller exits.
    pub(crate) async fn fetch_to_spool(
        &self,
        url: &str,
        spool_dir: Option<&Path>,
    ) -> GroupsResult<NamedTempFile> {
        debug!(url = %url, "Downloading roster export");
        let response = self.client.get(url).send().await.map_err(|e| {
            GroupsError::roster_fetch_with_source(format!("export request failed: {url}"), e)
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GroupsError::roster_fetch(format!(
                "export request returned HTTP {status}"
            )));
        }

        let payload = response.bytes().await.map_err(|e| {
            GroupsError::roster_fetch_with_source("failed to read export body", e)
        })?;

        let mut spool = match spool_dir {
            Some(dir) => NamedTempFile::new_in(dir),
            None => NamedTempFile::new(),
        }
        .map_err(|e| GroupsError::roster_fetch_with_source("failed to create spool file", e))?;
        spool
            .write_all(&payload)
            .map_err(|e| GroupsError::roster_fetch_with_source("failed to write spool file", e))?;
        Ok(spool)
    }
}

fn resolve_action(page_url: &Url, action: Option<&str>) -> GroupsResult<Url> {
    match action {
        None => Ok(page_url.clone()),
        Some(action) => page_url.join(action).map_err(|e| {
            GroupsError::login_failed_with_source(
                format!("login form action {action:?} is not a valid URL"),
                expected_cookie_ids(),
                e,
            )
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionSettings;

    fn session() -> Session {
        Session::new(&ConnectionSettings::default()).unwrap()
    }

    fn grant_full_fingerprint(jar: &SessionJar) {
        for name in GOOGLE_SESSION_COOKIES {
            jar.insert(GOOGLE_DOMAIN, SESSION_PATH, name, "value");
        }
        jar.insert(ACCOUNTS_DOMAIN, SESSION_PATH, ACCOUNTS_SESSION_COOKIE, "value");
    }

    #[test]
    fn test_expected_cookie_ids_order() {
        assert_eq!(
            expected_cookie_ids(),
            vec![
                ".google.com:/:APISID",
                ".google.com:/:SSID",
                ".google.com:/:SAPISID",
                ".google.com:/:SID",
                ".google.com:/:HSID",
                "accounts.google.com:/:LSID",
            ]
        );
    }

    #[test]
    fn test_phase_is_derived_from_the_jar() {
        let session = session();
        assert!(!session.is_authenticated());

        grant_full_fingerprint(session.jar());
        assert!(session.is_authenticated());
        assert!(session.verify_authenticated().is_ok());

        session.jar().clear();
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_verify_fails_on_any_missing_cookie() {
        for withheld in ["APISID", "SSID", "SAPISID", "SID", "HSID", "LSID"] {
            let session = session();
            for name in GOOGLE_SESSION_COOKIES {
                if name != withheld {
                    session.jar().insert(GOOGLE_DOMAIN, SESSION_PATH, name, "value");
                }
            }
            if withheld != ACCOUNTS_SESSION_COOKIE {
                session.jar().insert(
                    ACCOUNTS_DOMAIN,
                    SESSION_PATH,
                    ACCOUNTS_SESSION_COOKIE,
                    "value",
                );
            }

            let err = session.verify_authenticated().unwrap_err();
            match err {
                GroupsError::AuthenticationFailed { expected, .. } => {
                    assert_eq!(expected, expected_cookie_ids(), "withheld {withheld}");
                }
                other => panic!("expected AuthenticationFailed, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_remaining_cookies_follow_check_order() {
        let session = session();
        session.jar().insert(GOOGLE_DOMAIN, SESSION_PATH, "HSID", "value");
        session.jar().insert(GOOGLE_DOMAIN, SESSION_PATH, "SID", "value");

        // Check order, not insertion order.
        assert_eq!(
            session.remaining_fingerprint_cookies(),
            vec![".google.com:/:SID", ".google.com:/:HSID"]
        );
    }

    #[test]
    fn test_resolve_action() {
        let page = Url::parse("https://accounts.google.com/ServiceLogin?hl=en").unwrap();

        let resolved = resolve_action(&page, Some("/signin")).unwrap();
        assert_eq!(resolved.as_str(), "https://accounts.google.com/signin");

        let resolved = resolve_action(&page, Some("https://example.com/auth")).unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/auth");

        let resolved = resolve_action(&page, None).unwrap();
        assert_eq!(resolved, page);
    }
}
