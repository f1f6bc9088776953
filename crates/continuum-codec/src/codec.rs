//! The session codec: payload + expiry in, opaque signed token out.
//!
//! ## Wire format
//!
//! ```text
//! Basic:      payload.expiry.signature
//! Encrypted:  nonce.ciphertext.expiry.signature
//! ```
//!
//! Binary segments are unpadded base64url; `expiry` is decimal unix
//! milliseconds. `signature` is HMAC-SHA256 over everything before the
//! last `.`, so every other segment (including the nonce) is covered.
//!
//! ## Decode order
//!
//! 1. split into segments → [`CodecError::MalformedToken`]
//! 2. verify the MAC in constant time → [`CodecError::InvalidSignature`]
//! 3. compare expiry with the clock → [`CodecError::Expired`]
//! 4. decrypt (if encrypted) and deserialize →
//!    [`CodecError::Deserialization`]
//!
//! Nothing in a token is looked at before step 2 passes, so a forger
//! learns nothing from which error comes back.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

#[cfg(feature = "encrypted")]
use crate::cipher::{NONCE_LEN, PayloadCipher};
use crate::keys::{ServerSecret, Signer};
use crate::{Clock, CodecError, SessionSerializer};

const MAC_LABEL: &str = "session-mac";
#[cfg(feature = "encrypted")]
const ENC_LABEL: &str = "session-enc";

/// Which token layout a codec produces and accepts.
///
/// Changing the format of a running deployment invalidates every
/// outstanding token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenFormat {
    /// Signed but readable payload (3 segments).
    #[default]
    Basic,

    /// Signed and encrypted payload (4 segments).
    #[cfg(feature = "encrypted")]
    Encrypted,
}

impl TokenFormat {
    fn segments(self) -> usize {
        match self {
            Self::Basic => 3,
            #[cfg(feature = "encrypted")]
            Self::Encrypted => 4,
        }
    }
}

/// Signs, verifies and optionally encrypts session tokens for one payload
/// type.
///
/// The codec is immutable after construction and holds no per-request
/// state, so a single instance (usually behind an `Arc`) serves every
/// thread.
///
/// ## Example
///
/// ```rust
/// use std::sync::Arc;
/// use continuum_codec::{ServerSecret, SessionCodec, StringSerializer, SystemClock, Clock};
///
/// let secret = ServerSecret::new("x".repeat(64)).unwrap();
/// let codec = SessionCodec::new(StringSerializer, &secret, Arc::new(SystemClock));
///
/// let expires = SystemClock.now_millis() + 60_000;
/// let token = codec.encode(&"alice".to_string(), expires).unwrap();
/// assert_eq!(codec.decode(&token).unwrap(), "alice");
/// ```
pub struct SessionCodec<S: SessionSerializer> {
    serializer: S,
    signer: Signer,
    format: TokenFormat,
    #[cfg(feature = "encrypted")]
    cipher: PayloadCipher,
    clock: Arc<dyn Clock>,
}

impl<S: SessionSerializer> SessionCodec<S> {
    /// Creates a codec producing [`TokenFormat::Basic`] tokens.
    pub fn new(serializer: S, secret: &ServerSecret, clock: Arc<dyn Clock>) -> Self {
        Self::with_format(serializer, secret, TokenFormat::Basic, clock)
    }

    /// Creates a codec producing tokens of the given format.
    pub fn with_format(
        serializer: S,
        secret: &ServerSecret,
        format: TokenFormat,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            serializer,
            signer: secret.signer(MAC_LABEL),
            format,
            #[cfg(feature = "encrypted")]
            cipher: PayloadCipher::new(&secret.derive(ENC_LABEL)),
            clock,
        }
    }

    /// The format this codec writes.
    pub fn format(&self) -> TokenFormat {
        self.format
    }

    /// The clock expiries are checked against.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// The payload serializer.
    pub fn serializer(&self) -> &S {
        &self.serializer
    }

    /// Encodes `value` into a token valid until `expires_at` (unix ms).
    ///
    /// # Errors
    /// [`CodecError::Serialization`] if the payload can't be serialized,
    /// [`CodecError::Encryption`] if sealing fails.
    pub fn encode(&self, value: &S::Value, expires_at: u64) -> Result<String, CodecError> {
        let plaintext = self.serializer.serialize(value)?;
        let expiry = expires_at.to_string();

        let signed = match self.format {
            TokenFormat::Basic => {
                format!("{}.{expiry}", URL_SAFE_NO_PAD.encode(&plaintext))
            }
            #[cfg(feature = "encrypted")]
            TokenFormat::Encrypted => {
                let nonce = crate::random_bytes::<NONCE_LEN>();
                let sealed = self.cipher.seal(&nonce, &plaintext, expiry.as_bytes())?;
                format!(
                    "{}.{}.{expiry}",
                    URL_SAFE_NO_PAD.encode(nonce),
                    URL_SAFE_NO_PAD.encode(sealed)
                )
            }
        };

        let signature = self.signer.sign(signed.as_bytes());
        Ok(format!("{signed}.{}", URL_SAFE_NO_PAD.encode(signature)))
    }

    /// Decodes a token against the codec's clock.
    ///
    /// # Errors
    /// See the module docs for the order in which errors are produced.
    pub fn decode(&self, token: &str) -> Result<S::Value, CodecError> {
        self.decode_at(token, self.clock.now_millis())
    }

    /// Decodes a token as if the current time were `now` (unix ms).
    ///
    /// # Errors
    /// See the module docs for the order in which errors are produced.
    pub fn decode_at(&self, token: &str, now: u64) -> Result<S::Value, CodecError> {
        // 1. Structure.
        let (signed, signature) = token.rsplit_once('.').ok_or(CodecError::MalformedToken)?;
        let segments: Vec<&str> = signed.split('.').collect();
        if segments.len() + 1 != self.format.segments() {
            return Err(CodecError::MalformedToken);
        }
        let signature = b64(signature)?;

        // 2. Authenticity.
        if !self.signer.verify(signed.as_bytes(), &signature) {
            return Err(CodecError::InvalidSignature);
        }

        // 3. Freshness.
        let expiry_segment = segments[segments.len() - 1];
        let expires_at: u64 = expiry_segment
            .parse()
            .map_err(|_| CodecError::MalformedToken)?;
        if expires_at <= now {
            return Err(CodecError::Expired);
        }

        // 4. Payload.
        let plaintext = match self.format {
            TokenFormat::Basic => b64(segments[0])?,
            #[cfg(feature = "encrypted")]
            TokenFormat::Encrypted => {
                let nonce = b64(segments[0])?;
                let sealed = b64(segments[1])?;
                self.cipher
                    .open(&nonce, &sealed, expiry_segment.as_bytes())?
            }
        };
        self.serializer.deserialize(&plaintext)
    }
}

impl<S: SessionSerializer + std::fmt::Debug> std::fmt::Debug for SessionCodec<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCodec")
            .field("serializer", &self.serializer)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

fn b64(segment: &str) -> Result<Vec<u8>, CodecError> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| CodecError::MalformedToken)
}

// =========================================================================
// Tests
// =========================================================================
