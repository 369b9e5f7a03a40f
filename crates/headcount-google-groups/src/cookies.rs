//! In-memory session cookie store.
//!
//! The session phase is derived by inspecting cookies, never tracked in
//! a flag, so the store must expose exact `(domain, path) -> name`
//! indexing. reqwest's built-in jar is opaque; this store plugs into the
//! transport through [`reqwest::cookie::CookieStore`] and exposes
//! [`get`](SessionJar::get) / [`contains`](SessionJar::contains) /
//! [`clear`](SessionJar::clear) as the stable inspection contract.
//!
//! Domains are canonicalized by stripping a leading dot: `.google.com`
//! and `google.com` address the same scope, and host-only cookies are
//! not distinguished from domain-scoped ones. The jar belongs to a
//! single connector talking to one trusted service, so it does not
//! enforce the public-jar rules (host/domain acceptance, Secure,
//! HttpOnly) that a shared browser store would.
//!
//! Cookie values are session credentials: they never appear in logs,
//! error payloads, or `Debug` output. Inspection works on names only.

use std::collections::HashMap;

use cookie::time::OffsetDateTime;
use cookie::Cookie;
use parking_lot::Mutex;
use reqwest::header::HeaderValue;
use url::Url;

/// One cookie scope: `(domain, path)`.
type Scope = (String, String);

/// Cookie store scoped to a single connector's session.
#[derive(Default)]
pub struct SessionJar {
    cookies: Mutex<HashMap<Scope, HashMap<String, String>>>,
}

impl SessionJar {
    /// Create an empty jar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cookie value by domain, path and name.
    pub fn get(&self, domain: &str, path: &str, name: &str) -> Option<String> {
        self.cookies
            .lock()
            .get(&scope_key(domain, path))
            .and_then(|scope| scope.get(name))
            .cloned()
    }

    /// Whether a cookie is present at the given domain and path.
    pub fn contains(&self, domain: &str, path: &str, name: &str) -> bool {
        self.cookies
            .lock()
            .get(&scope_key(domain, path))
            .is_some_and(|scope| scope.contains_key(name))
    }

    /// Insert or replace a cookie.
    pub fn insert(
        &self,
        domain: impl Into<String>,
        path: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.cookies
            .lock()
            .entry(scope_key(&domain.into(), &path.into()))
            .or_default()
            .insert(name.into(), value.into());
    }

    /// Number of cookies stored under a domain, across all paths.
    pub fn domain_cookie_count(&self, domain: &str) -> usize {
        let domain = canonical_domain(domain);
        self.cookies
            .lock()
            .iter()
            .filter(|((d, _), _)| *d == domain)
            .map(|(_, scope)| scope.len())
            .sum()
    }

    /// Total number of stored cookies.
    pub fn len(&self) -> usize {
        self.cookies.lock().values().map(HashMap::len).sum()
    }

    /// Whether the jar holds no cookies at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every cookie.
    pub fn clear(&self) {
        self.cookies.lock().clear();
    }

    fn remove(&self, domain: &str, path: &str, name: &str) {
        let mut store = self.cookies.lock();
        let key = scope_key(domain, path);
        if let Some(scope) = store.get_mut(&key) {
            scope.remove(name);
            if scope.is_empty() {
                store.remove(&key);
            }
        }
    }

    fn store_response_cookie(&self, parsed: &Cookie<'_>, url: &Url) {
        let domain = match parsed.domain() {
            Some(domain) => domain.to_owned(),
            None => match url.host_str() {
                Some(host) => host.to_owned(),
                None => return,
            },
        };
        let path = match parsed.path() {
            Some(path) if path.starts_with('/') => path.to_owned(),
            _ => default_path(url),
        };

        if is_removal(parsed) {
            self.remove(&domain, &path, parsed.name());
        } else {
            self.insert(domain, path, parsed.name(), parsed.value());
        }
    }
}

impl std::fmt::Debug for SessionJar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Names only; values are session credentials.
        let store = self.cookies.lock();
        let mut scopes: Vec<String> = store
            .iter()
            .map(|((domain, path), scope)| {
                let mut names: Vec<&str> = scope.keys().map(String::as_str).collect();
                names.sort_unstable();
                format!("{domain}:{path}:[{}]", names.join(", "))
            })
            .collect();
        scopes.sort_unstable();
        f.debug_struct("SessionJar").field("scopes", &scopes).finish()
    }
}

impl reqwest::cookie::CookieStore for SessionJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        for header in cookie_headers {
            let Ok(raw) = header.to_str() else { continue };
            let Ok(parsed) = Cookie::parse(raw.to_owned()) else {
                continue;
            };
            self.store_response_cookie(&parsed, url);
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let host = url.host_str()?;
        let request_path = url.path();
        let store = self.cookies.lock();
        let mut pairs: Vec<String> = Vec::new();
        for ((domain, path), scope) in store.iter() {
            if domain_matches(domain, host) && path_matches(path, request_path) {
                for (name, value) in scope {
                    pairs.push(format!("{name}={value}"));
                }
            }
        }
        if pairs.is_empty() {
            return None;
        }
        HeaderValue::from_str(&pairs.join("; ")).ok()
    }
}

fn scope_key(domain: &str, path: &str) -> Scope {
    (canonical_domain(domain), path.to_owned())
}

fn canonical_domain(domain: &str) -> String {
    domain.trim_start_matches('.').to_ascii_lowercase()
}

/// Whether a `Set-Cookie` is a removal (already expired, or `Max-Age=0`).
fn is_removal(cookie: &Cookie<'_>) -> bool {
    if let Some(max_age) = cookie.max_age() {
        if max_age <= cookie::time::Duration::ZERO {
            return true;
        }
    }
    cookie
        .expires_datetime()
        .is_some_and(|at| at <= OffsetDateTime::now_utc())
}

/// Default cookie path per RFC 6265 §5.1.4.
fn default_path(url: &Url) -> String {
    let path = url.path();
    if !path.starts_with('/') {
        return "/".to_string();
    }
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(index) => path[..index].to_owned(),
    }
}

fn domain_matches(stored: &str, host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    host == stored || host.ends_with(&format!(".{stored}"))
}

/// Request-path match per RFC 6265 §5.1.4.
fn path_matches(stored: &str, request_path: &str) -> bool {
    request_path == stored
        || (request_path.starts_with(stored)
            && (stored.ends_with('/') || request_path.as_bytes().get(stored.len()) == Some(&b'/')))
}
