//! CSRF cookie and header names.

use continuum_transport::CookieConfig;

/// Where the CSRF token travels.
///
/// The cookie must stay readable by scripts (no `HttpOnly`): the page
/// reads it and echoes it back in the header. Defaults are the names
/// common JavaScript HTTP clients look for out of the box.
///
/// ```rust
/// use continuum_csrf::CsrfConfig;
///
/// let config = CsrfConfig::default();
/// assert_eq!(config.cookie.name, "XSRF-TOKEN");
/// assert_eq!(config.header_name, "X-XSRF-TOKEN");
/// assert!(!config.cookie.http_only);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CsrfConfig {
    /// Cookie the token is set in. Default: `XSRF-TOKEN`, path `/`.
    pub cookie: CookieConfig,
    /// Header the client echoes the token in. Default: `X-XSRF-TOKEN`.
    pub header_name: String,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            cookie: CookieConfig::named("XSRF-TOKEN").with_http_only(false),
            header_name: "X-XSRF-TOKEN".to_owned(),
        }
    }
}
