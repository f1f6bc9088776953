//! Transport abstraction layer for Continuum.
//!
//! Decides how a token travels on an HTTP exchange. Provides the
//! [`SessionTransport`] trait and two implementations:
//!
//! - [`CookieTransport`] — named cookies, attributes mirrored on clear
//! - [`HeaderTransport`] — custom headers, clear is omission
//!
//! Session and refresh tokens travel in two independent [`Slot`]s under
//! whichever transport is active.
//!
//! Everything here works on plain [`http::HeaderMap`]s, so any server
//! built on the `http` crate types can use it.

mod cookies;
mod error;
mod header;

pub use cookies::{CookieConfig, CookieTransport, CookieTransportConfig, read_cookie};
pub use error::TransportError;
pub use header::{HeaderConfig, HeaderTransport, HeaderTransportConfig};

use std::fmt;

use cookie::Cookie;
use http::HeaderMap;
use http::header::{HeaderName, HeaderValue, SET_COOKIE};

/// Which token a carrier holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// The signed session token.
    Session,
    /// The `selector:secret` refresh token.
    Refresh,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session => f.write_str("session"),
            Self::Refresh => f.write_str("refresh"),
        }
    }
}

/// A response mutation that sets or clears one token.
#[derive(Debug, Clone, PartialEq)]
pub enum Carrier {
    /// A `Set-Cookie` line.
    Cookie(Cookie<'static>),

    /// A response header. `None` means "make sure the header is absent".
    Header {
        /// The header to write or remove.
        name: HeaderName,
        /// The value to write, if any.
        value: Option<HeaderValue>,
    },
}

impl Carrier {
    /// Writes this carrier into response headers.
    ///
    /// Cookies are appended (a response may set several); headers replace
    /// any previous value.
    ///
    /// # Errors
    /// [`TransportError::InvalidHeaderValue`] if the cookie can't be
    /// rendered as a header value.
    pub fn apply(self, headers: &mut HeaderMap) -> Result<(), TransportError> {
        match self {
            Self::Cookie(cookie) => {
                headers.append(SET_COOKIE, HeaderValue::from_str(&cookie.to_string())?);
            }
            Self::Header {
                name,
                value: Some(value),
            } => {
                headers.insert(name, value);
            }
            Self::Header { name, value: None } => {
                headers.remove(name);
            }
        }
        Ok(())
    }
}

/// Reads tokens from requests and expresses "set" and "clear" on
/// responses.
///
/// # Trait bounds
///
/// - `Send + Sync + 'static` → one transport is shared by every request
///   task for the lifetime of the process.
///
/// # Example
///
/// ```rust
/// use continuum_transport::{HeaderTransport, SessionTransport, Slot};
/// use http::HeaderMap;
///
/// let transport = HeaderTransport::default();
/// let mut response = HeaderMap::new();
/// transport.attach_set(&mut response, Slot::Session, "token").unwrap();
/// assert_eq!(response["set-authorization"], "token");
/// ```
pub trait SessionTransport: Send + Sync + 'static {
    /// The raw token in `slot`, if the request carries one.
    fn extract(&self, request: &HeaderMap, slot: Slot) -> Option<String>;

    /// The carrier that hands `value` to the client.
    ///
    /// # Errors
    /// [`TransportError::InvalidHeaderValue`] if `value` can't travel in a
    /// header.
    fn set_carrier(&self, slot: Slot, value: &str) -> Result<Carrier, TransportError>;

    /// The carrier that makes the client drop the token in `slot`.
    fn clear_carrier(&self, slot: Slot) -> Carrier;

    /// Sets `value` in `slot` on a response.
    fn attach_set(
        &self,
        response: &mut HeaderMap,
        slot: Slot,
        value: &str,
    ) -> Result<(), TransportError> {
        self.set_carrier(slot, value)?.apply(response)
    }

    /// Clears `slot` on a response.
    fn attach_clear(&self, response: &mut HeaderMap, slot: Slot) -> Result<(), TransportError> {
        self.clear_carrier(slot).apply(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_display() {
        assert_eq!(Slot::Session.to_string(), "session");
        assert_eq!(Slot::Refresh.to_string(), "refresh");
    }

    #[test]
    fn test_apply_header_none_removes_existing() {
        let mut headers = HeaderMap::new();
        headers.insert("x-token", HeaderValue::from_static("old"));

        Carrier::Header {
            name: HeaderName::from_static("x-token"),
            value: None,
        }
        .apply(&mut headers)
        .unwrap();

        assert!(headers.get("x-token").is_none());
    }

    #[test]
    fn test_apply_cookie_appends() {
        let mut headers = HeaderMap::new();
        Carrier::Cookie(Cookie::new("a", "1"))
            .apply(&mut headers)
            .unwrap();
        Carrier::Cookie(Cookie::new("b", "2"))
            .apply(&mut headers)
            .unwrap();

        assert_eq!(headers.get_all(SET_COOKIE).iter().count(), 2);
    }
}
