//! Google Groups membership connector for headcount
//!
//! This crate implements the headcount user-directory plugin surface for
//! Google Groups (free tier). The service has no membership API at this
//! tier, so the connector drives the web flow instead: it signs in
//! through the accounts login form, verifies the session via a fixed
//! cookie fingerprint, downloads the group's member export, and answers
//! membership queries against it.
//!
//! # Features
//!
//! - Form-based session establishment with fingerprint verification:
//!   cookie presence, not HTTP status, decides whether login worked
//! - Verified session teardown that reports exactly which cookies
//!   survived a failed logout
//! - Roster export decoding (banner skip, CSV, `Email address` column)
//! - Membership existence checks with a uniform detail record
//!
//! # Example
//!
//! ```no_run
//! use headcount_google_groups::{
//!     GoogleGroupsConfig, GoogleGroupsConnector, GoogleGroupsCredentials,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GoogleGroupsConfig::new("ops-team");
//! let credentials = GoogleGroupsCredentials {
//!     username: "admin@example.com".to_string(),
//!     password: "secret".to_string().into(),
//! };
//!
//! let connector = GoogleGroupsConnector::new(config, credentials)?;
//! connector.authenticate().await?;
//!
//! let (present, detail) = connector.exists("human").await?;
//! println!("member present: {present} ({detail:?})");
//!
//! connector.logout().await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod connector;
mod cookies;
mod error;
mod html;
mod roster;
mod session;

// Re-exports
pub use config::{
    ConnectionSettings, GoogleGroupsConfig, GoogleGroupsCredentials, ServiceEndpoints,
};
pub use connector::{ExistenceCheck, ExistenceDetails, GoogleGroupsConnector};
pub use cookies::SessionJar;
pub use error::{GroupsError, GroupsResult};
