//! Header transport: tokens travel in custom headers.
//!
//! The server hands a token out in one header (e.g. `Set-Authorization`)
//! and the client sends it back in another (e.g. `Authorization`). The
//! client owns storage; "clear" is the server not sending the header, and
//! the client is expected to drop its copy on logout.

use http::HeaderMap;
use http::header::{HeaderName, HeaderValue};

use crate::{Carrier, SessionTransport, Slot, TransportError};

/// Header names for one token slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderConfig {
    /// Header the server writes the token to.
    pub send_to_client_name: String,
    /// Header the client sends the token back in.
    pub get_from_client_name: String,
}

impl HeaderConfig {
    /// Creates a header pair.
    pub fn new(send_to_client_name: impl Into<String>, get_from_client_name: impl Into<String>) -> Self {
        Self {
            send_to_client_name: send_to_client_name.into(),
            get_from_client_name: get_from_client_name.into(),
        }
    }
}

/// Header settings for both token slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderTransportConfig {
    /// Default: `Set-Authorization` / `Authorization`.
    pub session: HeaderConfig,
    /// Default: `Set-Refresh-Token` / `Refresh-Token`.
    pub refresh: HeaderConfig,
}

impl Default for HeaderTransportConfig {
    fn default() -> Self {
        Self {
            session: HeaderConfig::new("Set-Authorization", "Authorization"),
            refresh: HeaderConfig::new("Set-Refresh-Token", "Refresh-Token"),
        }
    }
}

/// Parsed header names for one slot.
#[derive(Debug, Clone)]
struct Names {
    send: HeaderName,
    get: HeaderName,
}

impl Names {
    fn parse(config: &HeaderConfig) -> Result<Self, TransportError> {
        Ok(Self {
            send: HeaderName::try_from(config.send_to_client_name.as_str())?,
            get: HeaderName::try_from(config.get_from_client_name.as_str())?,
        })
    }
}

/// A [`SessionTransport`] carrying tokens in custom headers.
#[derive(Debug, Clone)]
pub struct HeaderTransport {
    session: Names,
    refresh: Names,
}

impl HeaderTransport {
    /// Creates a header transport.
    ///
    /// # Errors
    /// [`TransportError::InvalidHeaderName`] if a configured name isn't a
    /// valid header name.
    pub fn new(config: HeaderTransportConfig) -> Result<Self, TransportError> {
        Ok(Self {
            session: Names::parse(&config.session)?,
            refresh: Names::parse(&config.refresh)?,
        })
    }

    fn names(&self, slot: Slot) -> &Names {
        match slot {
            Slot::Session => &self.session,
            Slot::Refresh => &self.refresh,
        }
    }
}

impl Default for HeaderTransport {
    fn default() -> Self {
        Self {
            session: Names {
                send: HeaderName::from_static("set-authorization"),
                get: http::header::AUTHORIZATION,
            },
            refresh: Names {
                send: HeaderName::from_static("set-refresh-token"),
                get: HeaderName::from_static("refresh-token"),
            },
        }
    }
}

impl SessionTransport for HeaderTransport {
    fn extract(&self, request: &HeaderMap, slot: Slot) -> Option<String> {
        request
            .get(&self.names(slot).get)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(str::to_owned)
    }

    fn set_carrier(&self, slot: Slot, value: &str) -> Result<Carrier, TransportError> {
        Ok(Carrier::Header {
            name: self.names(slot).send.clone(),
            value: Some(HeaderValue::from_str(value)?),
        })
    }

    fn clear_carrier(&self, slot: Slot) -> Carrier {
        Carrier::Header {
            name: self.names(slot).send.clone(),
            value: None,
        }
    }
}
