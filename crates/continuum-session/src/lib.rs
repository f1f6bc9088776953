//! Session management for Continuum.
//!
//! This crate sits on top of the codec and decides what a session token
//! *means* over time:
//!
//! 1. **One-off sessions** ([`OneOffManager`]) — a signed token with a
//!    fixed expiry and no server state
//! 2. **Refresh sessions** ([`RefreshManager`]) — a short-lived session
//!    token plus a single-use, rotating refresh token backed by a
//!    [`RefreshTokenStore`], with replay detection
//! 3. **Strategy** ([`SessionStrategy`]) — one interface over both, so the
//!    HTTP layer is written once
//!
//! # How it fits in the stack
//!
//! ```text
//! HTTP layer (above)  ← asks a SessionStrategy to issue/authenticate/invalidate
//!     ↕
//! Session layer (this crate)  ← lifetimes, rotation, theft detection
//!     ↕
//! Codec layer (below)  ← signs and verifies the token strings
//! ```
//!
//! Every reason a session can be refused (bad signature, expiry, unknown
//! or reused refresh token, store outage) surfaces as the same
//! [`SessionError::NoSession`].

#![allow(async_fn_in_trait)]

mod config;
mod envelope;
mod error;
mod memory;
mod oneoff;
mod refresh;
mod session;
mod store;
mod strategy;
mod token;

pub use config::SessionConfig;
pub use envelope::SessionEnvelope;
pub use error::{SessionError, StoreError};
pub use memory::InMemoryRefreshTokenStore;
pub use oneoff::OneOffManager;
pub use refresh::{RefreshManager, Renewed};
pub use session::{
    Authenticated, IssuedTokens, PresentedTokens, Session, SessionOrigin, TokenPair,
};
pub use store::{RefreshTokenRecord, RefreshTokenStore};
pub use strategy::SessionStrategy;
pub use token::{RefreshToken, hash_secret};
