//! Cookie transport: tokens travel as named cookies.
//!
//! Browsers only delete a cookie when the clearing `Set-Cookie` matches
//! the original one's name, domain and path, so the clear carrier is built
//! from the same [`CookieConfig`] as the set carrier.

use std::time::Duration;

use cookie::{Cookie, CookieBuilder, SameSite};
use http::HeaderMap;
use http::header::COOKIE;
use time::OffsetDateTime;

use crate::{Carrier, SessionTransport, Slot, TransportError};

/// Name and attributes of one cookie.
///
/// ```rust
/// use std::time::Duration;
/// use continuum_transport::CookieConfig;
///
/// let config = CookieConfig::named("_sessiondata")
///     .with_domain("example.com")
///     .with_max_age(Duration::from_secs(3600));
/// let cookie = config.set_cookie("abc");
/// assert_eq!(cookie.domain(), Some("example.com"));
/// assert_eq!(cookie.http_only(), Some(true));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CookieConfig {
    /// Cookie name.
    pub name: String,
    /// `Domain` attribute. Default: none (host-only).
    pub domain: Option<String>,
    /// `Path` attribute. Default: `/`.
    pub path: Option<String>,
    /// `Max-Age` attribute. Default: none (browser-session cookie).
    pub max_age: Option<Duration>,
    /// `Secure` attribute. Default: `true`.
    pub secure: bool,
    /// `HttpOnly` attribute. Default: `true`.
    pub http_only: bool,
    /// `SameSite` attribute. Default: `Lax`.
    pub same_site: Option<SameSite>,
}

impl CookieConfig {
    /// A cookie called `name` with the default attributes.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domain: None,
            path: Some("/".to_owned()),
            max_age: None,
            secure: true,
            http_only: true,
            same_site: Some(SameSite::Lax),
        }
    }

    /// Sets the `Domain` attribute.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Sets the `Path` attribute.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the `Max-Age` attribute.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// Sets the `Secure` attribute. Turn off only for plain-HTTP
    /// development.
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Sets the `HttpOnly` attribute.
    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// Sets the `SameSite` attribute.
    pub fn with_same_site(mut self, same_site: Option<SameSite>) -> Self {
        self.same_site = same_site;
        self
    }

    fn builder(&self, value: String) -> CookieBuilder<'static> {
        let mut builder = Cookie::build((self.name.clone(), value))
            .secure(self.secure)
            .http_only(self.http_only);
        if let Some(domain) = &self.domain {
            builder = builder.domain(domain.clone());
        }
        if let Some(path) = &self.path {
            builder = builder.path(path.clone());
        }
        if let Some(same_site) = self.same_site {
            builder = builder.same_site(same_site);
        }
        builder
    }

    /// The cookie carrying `value`.
    pub fn set_cookie(&self, value: &str) -> Cookie<'static> {
        let mut builder = self.builder(value.to_owned());
        if let Some(max_age) = self.max_age {
            builder = builder
                .max_age(time::Duration::try_from(max_age).unwrap_or(time::Duration::MAX));
        }
        builder.build()
    }

    /// An empty, already-expired cookie with every other attribute
    /// identical to [`set_cookie`](Self::set_cookie).
    pub fn clear_cookie(&self) -> Cookie<'static> {
        self.builder(String::new())
            .max_age(time::Duration::ZERO)
            .expires(OffsetDateTime::UNIX_EPOCH)
            .build()
    }
}

/// Finds cookie `name` in a request's `Cookie` headers.
///
/// Empty values are treated as absent: a client may keep sending a cookie
/// it was told to clear until the clear reaches it.
pub fn read_cookie(request: &HeaderMap, name: &str) -> Option<String> {
    request
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_owned())
        .filter(|value| !value.is_empty())
}

// ---------------------------------------------------------------------------
// CookieTransport
// ---------------------------------------------------------------------------

/// Cookie settings for both token slots.
#[derive(Debug, Clone, PartialEq)]
pub struct CookieTransportConfig {
    /// Session token cookie. Default name: `_sessiondata`.
    pub session: CookieConfig,
    /// Refresh token cookie. Default name: `_refreshtoken`, max-age 30
    /// days.
    pub refresh: CookieConfig,
}

impl Default for CookieTransportConfig {
    fn default() -> Self {
        Self {
            session: CookieConfig::named("_sessiondata"),
            refresh: CookieConfig::named("_refreshtoken")
                .with_max_age(Duration::from_secs(30 * 24 * 60 * 60)),
        }
    }
}

/// A [`SessionTransport`] carrying tokens in cookies.
#[derive(Debug, Clone, Default)]
pub struct CookieTransport {
    config: CookieTransportConfig,
}

impl CookieTransport {
    /// Creates a cookie transport.
    pub fn new(config: CookieTransportConfig) -> Self {
        Self { config }
    }

    /// The cookie settings for `slot`.
    pub fn cookie_config(&self, slot: Slot) -> &CookieConfig {
        match slot {
            Slot::Session => &self.config.session,
            Slot::Refresh => &self.config.refresh,
        }
    }
}

impl SessionTransport for CookieTransport {
    fn extract(&self, request: &HeaderMap, slot: Slot) -> Option<String> {
        read_cookie(request, &self.cookie_config(slot).name)
    }

    fn set_carrier(&self, slot: Slot, value: &str) -> Result<Carrier, TransportError> {
        Ok(Carrier::Cookie(self.cookie_config(slot).set_cookie(value)))
    }

    fn clear_carrier(&self, slot: Slot) -> Carrier {
        let config = self.cookie_config(slot);
        tracing::debug!(%slot, cookie = %config.name, "clearing cookie");
        Carrier::Cookie(config.clear_cookie())
    }
}
