//! Common test utilities for connector integration tests.

#![allow(dead_code)]

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use headcount_google_groups::{
    GoogleGroupsConfig, GoogleGroupsConnector, GoogleGroupsCredentials, ServiceEndpoints,
};

/// Fingerprint cookies issued under `.google.com`.
pub const GOOGLE_SESSION_COOKIES: [&str; 5] = ["APISID", "SSID", "SAPISID", "SID", "HSID"];

/// Login page with the sign-in form and a hidden anti-forgery token.
pub const LOGIN_PAGE: &str = r#"<html>
  <head><title>Google Accounts</title></head>
  <body>
    <form method="post" action="/signin">
      <input type="hidden" name="GALX" value="token123" />
      <input type="text" name="Email" />
      <input type="password" name="Passwd" />
    </form>
  </body>
</html>"#;

pub fn test_endpoints(base: &str) -> ServiceEndpoints {
    ServiceEndpoints {
        login_url: format!("{base}/ServiceLogin?hl=en"),
        logout_url: format!("{base}/Logout?hl=en"),
        export_url_template: format!("{base}/exportmembers/{{group}}"),
    }
}

pub fn test_config(server: &MockServer) -> GoogleGroupsConfig {
    GoogleGroupsConfig::new("ops-team").with_endpoints(test_endpoints(&server.uri()))
}

pub fn test_credentials() -> GoogleGroupsCredentials {
    GoogleGroupsCredentials {
        username: "admin@example.com".to_string(),
        password: "sw0rdfish".to_string().into(),
    }
}

pub fn connector(server: &MockServer) -> GoogleGroupsConnector {
    connector_with(test_config(server))
}

pub fn connector_with(config: GoogleGroupsConfig) -> GoogleGroupsConnector {
    GoogleGroupsConnector::new(config, test_credentials()).unwrap()
}

/// Mount the login page at `/ServiceLogin`.
pub async fn mount_login_page(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/ServiceLogin"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(LOGIN_PAGE, "text/html"))
        .mount(server)
        .await;
}

/// Append `Set-Cookie` headers issuing the named `.google.com` cookies.
pub fn grant_google_cookies(
    mut template: ResponseTemplate,
    names: &[&str],
) -> ResponseTemplate {
    for name in names {
        template = template.append_header(
            "set-cookie",
            format!("{name}=issued-{name}; Domain=.google.com; Path=/"),
        );
    }
    template
}

/// Append a `Set-Cookie` header issuing the accounts-scoped cookie.
pub fn grant_accounts_cookie(template: ResponseTemplate) -> ResponseTemplate {
    template.append_header(
        "set-cookie",
        "LSID=issued-LSID; Domain=accounts.google.com; Path=/".to_string(),
    )
}

/// A sign-in response that issues the complete session fingerprint.
pub fn grant_full_fingerprint(template: ResponseTemplate) -> ResponseTemplate {
    grant_accounts_cookie(grant_google_cookies(template, &GOOGLE_SESSION_COOKIES))
}

/// Append `Set-Cookie` headers expiring the named `.google.com` cookies.
pub fn expire_google_cookies(
    mut template: ResponseTemplate,
    names: &[&str],
) -> ResponseTemplate {
    for name in names {
        template = template.append_header(
            "set-cookie",
            format!("{name}=; Domain=.google.com; Path=/; Max-Age=0"),
        );
    }
    template
}

/// Append a `Set-Cookie` header expiring the accounts-scoped cookie.
pub fn expire_accounts_cookie(template: ResponseTemplate) -> ResponseTemplate {
    template.append_header(
        "set-cookie",
        "LSID=; Domain=accounts.google.com; Path=/; Max-Age=0".to_string(),
    )
}

/// A logout response that expires the complete fingerprint.
pub fn expire_full_fingerprint(template: ResponseTemplate) -> ResponseTemplate {
    expire_accounts_cookie(expire_google_cookies(template, &GOOGLE_SESSION_COOKIES))
}

/// A page whose `<title>` is the given text.
pub fn titled_page(title: &str) -> String {
    format!("<html><head><title>{title}</title></head><body></body></html>")
}

/// Mount a sign-in endpoint that issues the full fingerprint, and the
/// login page it is reached from.
pub async fn mount_successful_login(server: &MockServer) {
    mount_login_page(server).await;
    Mock::given(method("POST"))
        .and(path("/signin"))
        .respond_with(grant_full_fingerprint(
            ResponseTemplate::new(200).set_body_raw(titled_page("My Groups"), "text/html"),
        ))
        .mount(server)
        .await;
}
