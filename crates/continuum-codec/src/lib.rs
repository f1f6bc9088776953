//! Session token codec for Continuum.
//!
//! This crate is the leaf of the workspace. It turns a typed session value
//! into a tamper-evident token string and back:
//!
//! - **Serializers** ([`SessionSerializer`] and friends) — how a payload
//!   becomes bytes. One per payload kind; the codec is generic over them.
//! - **Codec** ([`SessionCodec`]) — signs (and optionally encrypts) those
//!   bytes together with an expiry.
//! - **Keys** ([`ServerSecret`], [`Signer`]) — the secret everything is
//!   rooted in and the HMAC built from it.
//! - **Clock / random** ([`Clock`], [`random_token`]) — the only sources
//!   of time and entropy the rest of the workspace uses.
//!
//! # Architecture
//!
//! ```text
//! Transport (header/cookie string) → Codec (typed payload) → Session managers
//! ```
//!
//! # Feature Flags
//!
//! - `json` (default) — [`JsonSerializer`] for any serde type
//! - `encrypted` (default) — [`TokenFormat::Encrypted`] via ChaCha20-Poly1305

mod clock;
mod codec;
#[cfg(feature = "encrypted")]
mod cipher;
mod error;
mod keys;
mod random;
mod serializer;

pub use clock::{duration_millis, Clock, ManualClock, SystemClock};
pub use codec::{SessionCodec, TokenFormat};
pub use error::CodecError;
pub use keys::{constant_time_eq, ServerSecret, Signer, MIN_SECRET_LEN};
pub use random::{random_bytes, random_token};
#[cfg(feature = "json")]
pub use serializer::JsonSerializer;
pub use serializer::{
    FnSerializer, IntegerSerializer, MapSerializer, SessionSerializer, StringSerializer,
};
