//! Session types: what a manager hands out and what it hands back.
//!
//! A "session" here is the server's view of an authenticated request:
//! - WHAT the application stored (`data`, any payload type)
//! - HOW the token carrying it came to exist (`origin`)
//!
//! Tokens themselves are opaque strings; [`IssuedTokens`] and
//! [`PresentedTokens`] are the two directions they travel in.

// ---------------------------------------------------------------------------
// SessionOrigin
// ---------------------------------------------------------------------------

/// How the current session token was produced.
///
/// Carried inside the signed token, so a client cannot upgrade a renewed
/// session to a login one. Routes that want a step-up guarantee
/// ("the user actually authenticated recently") reject
/// [`SessionOrigin::Refresh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOrigin {
    /// Issued directly by a login.
    Login,
    /// Issued by silently redeeming a refresh token.
    Refresh,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// An authenticated session and its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session<T> {
    /// The application payload.
    pub data: T,

    /// Where the token carrying this session came from.
    pub origin: SessionOrigin,
}

impl<T> Session<T> {
    /// A session created by logging in.
    pub fn login(data: T) -> Self {
        Self {
            data,
            origin: SessionOrigin::Login,
        }
    }

    /// A session created by a refresh.
    pub fn refreshed(data: T) -> Self {
        Self {
            data,
            origin: SessionOrigin::Refresh,
        }
    }

    /// `true` if the token was produced by a refresh rather than a login.
    pub fn was_refreshed(&self) -> bool {
        self.origin == SessionOrigin::Refresh
    }
}

// ---------------------------------------------------------------------------
// Token bundles
// ---------------------------------------------------------------------------

/// Tokens to send to the client.
///
/// `refresh` is `None` for strategies without refresh tokens, or when only
/// the session token was re-signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedTokens {
    /// The signed session token.
    pub session: String,
    /// The `selector:secret` refresh token, if one was issued.
    pub refresh: Option<String>,
}

/// The session/refresh token pair produced by a login or a refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    /// The signed, short-lived session token.
    pub session: String,
    /// The single-use `selector:secret` refresh token.
    pub refresh: String,
}

impl From<TokenPair> for IssuedTokens {
    fn from(pair: TokenPair) -> Self {
        Self {
            session: pair.session,
            refresh: Some(pair.refresh),
        }
    }
}

/// Tokens the client sent with a request, as extracted by a transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresentedTokens<'a> {
    /// Raw session token, if present.
    pub session: Option<&'a str>,
    /// Raw refresh token, if present.
    pub refresh: Option<&'a str>,
}

/// The outcome of a successful authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated<T> {
    /// The session the request belongs to.
    pub session: Session<T>,

    /// New tokens that must be sent back, when the strategy renewed the
    /// session while authenticating.
    pub renewed: Option<IssuedTokens>,
}
