//! Google Groups membership connector.

use serde::Serialize;
use tracing::{info, instrument};

use crate::config::{GoogleGroupsConfig, GoogleGroupsCredentials};
use crate::cookies::SessionJar;
use crate::error::GroupsResult;
use crate::roster;
use crate::session::Session;

/// Outcome detail for an existence check. The shape is identical on both
/// outcomes so the host framework can log and report it uniformly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExistenceCheck {
    pub exists: bool,
    pub details: ExistenceDetails,
}

/// Detail payload of an [`ExistenceCheck`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExistenceDetails {
    /// The username the check was asked about.
    pub username: String,
}

/// Connector for one Google Group, driven by the host user-directory
/// framework through its plugin surface.
///
/// One instance serves one caller sequentially. All session state
/// (cookies) lives in memory for the connector's lifetime; nothing is
/// persisted and no roster data is cached across calls.
pub struct GoogleGroupsConnector {
    config: GoogleGroupsConfig,
    credentials: GoogleGroupsCredentials,
    session: Session,
    display_name: String,
    export_url: String,
}

impl std::fmt::Debug for GoogleGroupsConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleGroupsConnector")
            .field("display_name", &self.display_name)
            .field("config", &self.config)
            .field("credentials", &self.credentials)
            .finish()
    }
}

impl GoogleGroupsConnector {
    /// Create a connector for the configured group.
    ///
    /// Fails only on structurally invalid configuration; credential
    /// values are not validated and surface later as authentication
    /// failures.
    pub fn new(
        config: GoogleGroupsConfig,
        credentials: GoogleGroupsCredentials,
    ) -> GroupsResult<Self> {
        config.validate()?;
        let session = Session::new(&config.connection)?;
        let display_name = format!("Google Groups: {}", config.group);
        let export_url = config.endpoints.export_url(&config.group);
        Ok(Self {
            config,
            credentials,
            session,
            display_name,
            export_url,
        })
    }

    /// Display name for this connector instance.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// The cookie store backing this connector's session.
    pub fn session_jar(&self) -> &SessionJar {
        self.session.jar()
    }

    /// Whether the session currently carries the complete authentication
    /// fingerprint. Derived from the cookie store on every call; there
    /// is no separate logged-in flag to drift out of sync.
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Log in and verify the session reached an authenticated state.
    #[instrument(skip(self), fields(group = %self.config.group))]
    pub async fn authenticate(&self) -> GroupsResult<()> {
        self.session.login(&self.config, &self.credentials).await?;
        self.session.verify_authenticated()?;
        info!("Authenticated against the groups service");
        Ok(())
    }

    /// Log out and verify every session artifact is gone.
    #[instrument(skip(self), fields(group = %self.config.group))]
    pub async fn logout(&self) -> GroupsResult<()> {
        self.session.logout(&self.config).await?;
        info!("Session terminated");
        Ok(())
    }

    /// All member usernames, in export order, duplicates preserved.
    ///
    /// Requires an authenticated session; callers are expected to
    /// [`authenticate`](Self::authenticate) first.
    #[instrument(skip(self), fields(group = %self.config.group))]
    pub async fn all_usernames(&self) -> GroupsResult<Vec<String>> {
        let spool = self
            .session
            .fetch_to_spool(&self.export_url, self.config.spool_dir.as_deref())
            .await?;
        let usernames = roster::decode(spool.path());
        // The spooled export is removed on success and failure alike,
        // before anything propagates to the caller.
        drop(spool);
        let usernames = usernames?;

        info!(member_count = usernames.len(), "Roster fetched");
        Ok(usernames)
    }

    /// Whether `username` is a member of the group, plus the detail
    /// record. Matching is exact string equality against the roster.
    #[instrument(skip(self), fields(group = %self.config.group))]
    pub async fn exists(&self, username: &str) -> GroupsResult<(bool, ExistenceCheck)> {
        let exists = self
            .all_usernames()
            .await?
            .iter()
            .any(|member| member == username);

        let check = ExistenceCheck {
            exists,
            details: ExistenceDetails {
                username: username.to_owned(),
            },
        };
        Ok((exists, check))
    }
}
