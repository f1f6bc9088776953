//! Authenticated encryption for the payload segment.
//!
//! Only compiled with the `encrypted` feature. The cipher is
//! ChaCha20-Poly1305 with a fresh random 96-bit nonce per token; the nonce
//! travels in the token as its own segment.

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};

use crate::CodecError;

/// Nonce length for ChaCha20-Poly1305.
pub(crate) const NONCE_LEN: usize = 12;

pub(crate) struct PayloadCipher {
    cipher: ChaCha20Poly1305,
}

impl PayloadCipher {
    #[allow(deprecated)]
    pub(crate) fn new(key: &[u8; 32]) -> Self {
        Self {
            cipher: ChaCha20Poly1305::new(Key::from_slice(key)),
        }
    }

    /// Encrypts `plaintext`, binding `aad` into the tag.
    #[allow(deprecated)]
    pub(crate) fn seal(
        &self,
        nonce: &[u8; NONCE_LEN],
        plaintext: &[u8],
        aad: &[u8],
    ) -> Result<Vec<u8>, CodecError> {
        self.cipher
            .encrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: plaintext,
                    aad,
                },
            )
            .map_err(|_| CodecError::Encryption)
    }

    /// Decrypts and authenticates `ciphertext`.
    #[allow(deprecated)]
    pub(crate) fn open(
        &self,
        nonce: &[u8],
        ciphertext: &[u8],
        aad: &[u8],
    ) -> Result<Vec<u8>, CodecError> {
        if nonce.len() != NONCE_LEN {
            return Err(CodecError::MalformedToken);
        }
        self.cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad,
                },
            )
            .map_err(|_| CodecError::Encryption)
    }
}
