//! # Continuum
//!
//! Signed, rotating HTTP sessions with CSRF protection.
//!
//! Continuum keeps a typed session alive across stateless
//! request/response cycles. It is built from four layers, each its own
//! crate, re-exported here:
//!
//! - [`codec`] — signs (and optionally encrypts) a payload into a token
//! - [`session`] — one-off sessions, and refresh sessions with
//!   single-use rotating refresh tokens and theft detection
//! - [`transport`] — carries tokens in cookies or custom headers
//! - [`csrf`] — double-submit CSRF protection
//!
//! This crate ties them to HTTP: [`SessionDirectives`] for handlers,
//! [`protect`] for CSRF-guarded routes, [`ContinuumBuilder`] to wire it
//! all from one secret, and [`ContinuumError::status`] to map failures to
//! status codes.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use continuum::prelude::*;
//!
//! let builder = ContinuumBuilder::new(secret)?;
//! let sessions = builder.directives(builder.one_off(StringSerializer), builder.cookie_transport());
//!
//! // POST /login
//! sessions.set_session(username, response.headers_mut()).await?;
//! // GET /me
//! let session = sessions.require_session(request.headers(), response.headers_mut()).await?;
//! // POST /logout
//! sessions.invalidate_session(request.headers(), response.headers_mut()).await?;
//! ```

mod builder;
mod directives;
mod error;
mod protect;

pub use builder::ContinuumBuilder;
pub use directives::SessionDirectives;
pub use error::ContinuumError;
pub use protect::protect;

pub use continuum_codec as codec;
pub use continuum_csrf as csrf;
pub use continuum_session as session;
pub use continuum_transport as transport;

/// The types most applications need.
pub mod prelude {
    pub use crate::{protect, ContinuumBuilder, ContinuumError, SessionDirectives};
    pub use continuum_codec::{
        Clock, FnSerializer, IntegerSerializer, JsonSerializer, ManualClock, MapSerializer,
        SessionSerializer, StringSerializer, SystemClock, TokenFormat,
    };
    pub use continuum_csrf::{CsrfConfig, CsrfError, CsrfGuard};
    pub use continuum_session::{
        InMemoryRefreshTokenStore, OneOffManager, RefreshManager, RefreshTokenStore, Session,
        SessionConfig, SessionError, SessionOrigin, SessionStrategy, StoreError,
    };
    pub use continuum_transport::{
        CookieConfig, CookieTransport, CookieTransportConfig, HeaderConfig, HeaderTransport,
        HeaderTransportConfig, SessionTransport, Slot,
    };
}
