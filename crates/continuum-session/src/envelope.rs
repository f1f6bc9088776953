//! Wraps a payload serializer so the token also records its origin.
//!
//! Wire form: one tag byte (`L` for login, `R` for refresh) followed by
//! whatever the inner serializer produced. The tag sits inside the signed
//! (and possibly encrypted) payload segment.

use continuum_codec::{CodecError, SessionSerializer};

use crate::{Session, SessionOrigin};

const LOGIN_TAG: u8 = b'L';
const REFRESH_TAG: u8 = b'R';

/// A [`SessionSerializer`] for [`Session<S::Value>`](Session).
#[derive(Debug, Clone, Default)]
pub struct SessionEnvelope<S>(pub S);

impl<S: SessionSerializer> SessionSerializer for SessionEnvelope<S> {
    type Value = Session<S::Value>;

    fn serialize(&self, value: &Self::Value) -> Result<Vec<u8>, CodecError> {
        let inner = self.0.serialize(&value.data)?;
        let mut bytes = Vec::with_capacity(inner.len() + 1);
        bytes.push(match value.origin {
            SessionOrigin::Login => LOGIN_TAG,
            SessionOrigin::Refresh => REFRESH_TAG,
        });
        bytes.extend_from_slice(&inner);
        Ok(bytes)
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Self::Value, CodecError> {
        let (tag, rest) = bytes
            .split_first()
            .ok_or_else(|| CodecError::Deserialization("empty session envelope".into()))?;
        let origin = match *tag {
            LOGIN_TAG => SessionOrigin::Login,
            REFRESH_TAG => SessionOrigin::Refresh,
            other => {
                return Err(CodecError::Deserialization(format!(
                    "unknown session origin tag {other:#04x}"
                )));
            }
        };
        Ok(Session {
            data: self.0.deserialize(rest)?,
            origin,
        })
    }
}
