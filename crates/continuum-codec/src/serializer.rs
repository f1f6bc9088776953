//! Payload serializers: how a session value becomes bytes and back.
//!
//! The codec doesn't care WHAT a session holds. It signs whatever bytes a
//! [`SessionSerializer`] hands it and gives the bytes back once the
//! signature checks out. Swapping the serializer swaps the payload type
//! without touching the signing protocol (the "strategy pattern" again).
//!
//! Provided schemes:
//!
//! - [`StringSerializer`] — a single string scalar
//! - [`IntegerSerializer`] — a single `i64` scalar
//! - [`MapSerializer`] — a string-keyed mapping
//! - [`JsonSerializer`] — any serde type (feature `json`)
//! - [`FnSerializer`] — a pair of caller-supplied functions

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use crate::CodecError;

/// Converts one session value type to bytes and back.
///
/// ## Trait bounds explained
///
/// - `Send + Sync + 'static` → a serializer lives inside a codec that is
///   shared by every request-handling task for the lifetime of the
///   process.
/// - `Value: Send + Sync` → decoded sessions are handed across tasks.
pub trait SessionSerializer: Send + Sync + 'static {
    /// The session value this serializer understands.
    type Value: Send + Sync + 'static;

    /// Turns a value into bytes.
    ///
    /// # Errors
    /// Returns [`CodecError::Serialization`] if the value can't be
    /// represented.
    fn serialize(&self, value: &Self::Value) -> Result<Vec<u8>, CodecError>;

    /// Turns bytes back into a value.
    ///
    /// # Errors
    /// Returns [`CodecError::Deserialization`] if the bytes have the wrong
    /// shape for this value type.
    fn deserialize(&self, bytes: &[u8]) -> Result<Self::Value, CodecError>;
}

fn utf8(bytes: &[u8]) -> Result<&str, CodecError> {
    std::str::from_utf8(bytes).map_err(|e| CodecError::Deserialization(e.to_string()))
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

/// A session holding one string.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringSerializer;

impl SessionSerializer for StringSerializer {
    type Value = String;

    fn serialize(&self, value: &String) -> Result<Vec<u8>, CodecError> {
        Ok(value.as_bytes().to_vec())
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<String, CodecError> {
        utf8(bytes).map(str::to_owned)
    }
}

/// A session holding one signed 64-bit integer, written in decimal.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerSerializer;

impl SessionSerializer for IntegerSerializer {
    type Value = i64;

    fn serialize(&self, value: &i64) -> Result<Vec<u8>, CodecError> {
        Ok(value.to_string().into_bytes())
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<i64, CodecError> {
        utf8(bytes)?
            .parse()
            .map_err(|e: std::num::ParseIntError| CodecError::Deserialization(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// MapSerializer
// ---------------------------------------------------------------------------

/// A session holding a string-keyed mapping.
///
/// Wire form is `k1=v1&k2=v2` with keys sorted and both sides
/// percent-encoded, so the same map always produces the same bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapSerializer;

impl SessionSerializer for MapSerializer {
    type Value = HashMap<String, String>;

    fn serialize(&self, value: &HashMap<String, String>) -> Result<Vec<u8>, CodecError> {
        let mut pairs: Vec<(&String, &String)> = value.iter().collect();
        pairs.sort();
        let joined = pairs
            .into_iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        Ok(joined.into_bytes())
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<HashMap<String, String>, CodecError> {
        let text = utf8(bytes)?;
        if text.is_empty() {
            return Ok(HashMap::new());
        }

        let mut map = HashMap::new();
        for pair in text.split('&') {
            let (k, v) = pair
                .split_once('=')
                .ok_or_else(|| CodecError::Deserialization(format!("missing '=' in {pair:?}")))?;
            let k = urlencoding::decode(k).map_err(|e| CodecError::Deserialization(e.to_string()))?;
            let v = urlencoding::decode(v).map_err(|e| CodecError::Deserialization(e.to_string()))?;
            map.insert(k.into_owned(), v.into_owned());
        }
        Ok(map)
    }
}

// ---------------------------------------------------------------------------
// JsonSerializer
// ---------------------------------------------------------------------------

/// A session holding any serde type, written as JSON.
///
/// This is behind the `json` feature flag (enabled by default).
#[cfg(feature = "json")]
pub struct JsonSerializer<T>(PhantomData<fn() -> T>);

#[cfg(feature = "json")]
impl<T> JsonSerializer<T> {
    /// Creates a JSON serializer for `T`.
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

#[cfg(feature = "json")]
impl<T> Default for JsonSerializer<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "json")]
impl<T> Clone for JsonSerializer<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

#[cfg(feature = "json")]
impl<T> fmt::Debug for JsonSerializer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JsonSerializer")
    }
}

#[cfg(feature = "json")]
impl<T> SessionSerializer for JsonSerializer<T>
where
    T: serde::Serialize + serde::de::DeserializeOwned + Send + Sync + 'static,
{
    type Value = T;

    fn serialize(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(|e| CodecError::Serialization(e.to_string()))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Deserialization(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// FnSerializer
// ---------------------------------------------------------------------------

/// A session type described by two plain functions.
///
/// `to_string` renders the value, `from_string` parses it back. This is
/// the escape hatch for record types that don't (or shouldn't) derive
/// serde traits.
///
/// ```rust
/// use continuum_codec::{FnSerializer, SessionSerializer};
///
/// #[derive(Debug, PartialEq)]
/// struct Badge { name: String, level: i32 }
///
/// let serializer = FnSerializer::new(
///     |b: &Badge| format!("{},{}", b.name, b.level),
///     |s: &str| -> Result<Badge, String> {
///         let (name, level) = s.split_once(',').ok_or("no comma")?;
///         let level = level.parse().map_err(|_| "bad level")?;
///         Ok(Badge { name: name.to_owned(), level })
///     },
/// );
///
/// let bytes = serializer.serialize(&Badge { name: "ada".into(), level: 3 }).unwrap();
/// assert_eq!(bytes, b"ada,3");
/// assert_eq!(serializer.deserialize(b"ada,3").unwrap().level, 3);
/// assert!(serializer.deserialize(b"nonsense").is_err());
/// ```
pub struct FnSerializer<T, S, D> {
    to_string: S,
    from_string: D,
    _value: PhantomData<fn() -> T>,
}

impl<T, S, D, E> FnSerializer<T, S, D>
where
    S: Fn(&T) -> String,
    D: Fn(&str) -> Result<T, E>,
    E: fmt::Display,
{
    /// Builds a serializer from a render function and a parse function.
    pub fn new(to_string: S, from_string: D) -> Self {
        Self {
            to_string,
            from_string,
            _value: PhantomData,
        }
    }
}

impl<T, S, D> fmt::Debug for FnSerializer<T, S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnSerializer")
    }
}

impl<T, S, D, E> SessionSerializer for FnSerializer<T, S, D>
where
    T: Send + Sync + 'static,
    S: Fn(&T) -> String + Send + Sync + 'static,
    D: Fn(&str) -> Result<T, E> + Send + Sync + 'static,
    E: fmt::Display,
{
    type Value = T;

    fn serialize(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        Ok((self.to_string)(value).into_bytes())
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<T, CodecError> {
        (self.from_string)(utf8(bytes)?).map_err(|e| CodecError::Deserialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_serializer_rejects_invalid_utf8() {
        let result = StringSerializer.deserialize(&[0xff, 0xfe]);
        assert!(matches!(result, Err(CodecError::Deserialization(_))));
    }

    #[test]
    fn test_integer_serializer_negative_and_garbage() {
        assert_eq!(IntegerSerializer.serialize(&-42).unwrap(), b"-42");
        assert_eq!(IntegerSerializer.deserialize(b"-42").unwrap(), -42);
        assert!(matches!(
            IntegerSerializer.deserialize(b"4x2"),
            Err(CodecError::Deserialization(_))
        ));
    }

    #[test]
    fn test_map_serializer_is_canonical() {
        let mut a = HashMap::new();
        a.insert("value".to_string(), "alice".to_string());
        a.insert("new".to_string(), "true".to_string());

        let bytes = MapSerializer.serialize(&a).unwrap();
        assert_eq!(bytes, b"new=true&value=alice");
    }

    #[test]
    fn test_map_serializer_escapes_separators() {
        let mut map = HashMap::new();
        map.insert("a&b".to_string(), "c=d".to_string());

        let bytes = MapSerializer.serialize(&map).unwrap();
        assert_eq!(MapSerializer.deserialize(&bytes).unwrap(), map);
    }

    #[test]
    fn test_map_serializer_empty_map() {
        let bytes = MapSerializer.serialize(&HashMap::new()).unwrap();
        assert!(bytes.is_empty());
        assert!(MapSerializer.deserialize(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_map_serializer_pair_without_equals_fails() {
        assert!(matches!(
            MapSerializer.deserialize(b"lonely"),
            Err(CodecError::Deserialization(_))
        ));
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_json_serializer_wrong_shape_fails() {
        #[derive(Debug, serde::Serialize, serde::Deserialize, PartialEq)]
        struct User {
            id: u64,
            name: String,
        }

        let s = JsonSerializer::<User>::new();
        let bytes = s
            .serialize(&User {
                id: 1,
                name: "alice".into(),
            })
            .unwrap();
        assert_eq!(s.deserialize(&bytes).unwrap().name, "alice");
        assert!(matches!(
            s.deserialize(br#"{"id":"one"}"#),
            Err(CodecError::Deserialization(_))
        ));
    }
}
