//! CSRF protection for Continuum, using the double-submit cookie pattern.
//!
//! The server sets a signed random token in a script-readable cookie.
//! State-changing requests must echo it in a header. A third-party page
//! can make the browser *send* the cookie but can't *read* it, so it can't
//! produce the header.
//!
//! [`CsrfGuard::check`] runs the protocol for one request;
//! [`CsrfGuard::reissue`] rotates the token (call it on login).

mod config;
mod error;
mod guard;

pub use config::CsrfConfig;
pub use error::CsrfError;
pub use guard::CsrfGuard;
