//! # Serialization adapters.
//!
//! Every store owns one [`Decode`] strategy for inbound frames and one
//! [`Encode`] strategy for outbound values, so different endpoints can use
//! different wire conventions.
//!
//! | Strategy        | Decode                                   | Encode                                   |
//! |-----------------|------------------------------------------|------------------------------------------|
//! | [`Json`]        | `serde_json::from_str`                   | JSON, except strings are sent raw         |
//! | [`DoubleJson`]  | JSON string whose content is JSON        | JSON document wrapped in a JSON string    |
//! | [`Text`]        | raw `String`                             | raw `String`                             |
//! | [`DecodeFn`]    | any closure `Fn(&str) -> Result<T, _>`   | -                                        |
//!
//! A decode error rejects that frame only: the connection stays open and the
//! cached value keeps its last good value.

mod json;

pub use json::{DoubleJson, Json};

use crate::error::CodecError;

/// Inbound strategy: wire text → value.
pub trait Decode<T>: Send + Sync + 'static {
    /// Decodes one frame.
    fn decode(&self, raw: &str) -> Result<T, CodecError>;
}

/// Outbound strategy: value → wire text.
pub trait Encode<T>: Send + Sync + 'static {
    /// Encodes one value into a text frame.
    fn encode(&self, value: &T) -> Result<String, CodecError>;
}

/// Raw text passthrough for `String` stores.
#[derive(Clone, Copy, Debug, Default)]
pub struct Text;

impl Decode<String> for Text {
    fn decode(&self, raw: &str) -> Result<String, CodecError> {
        Ok(raw.to_owned())
    }
}

impl Encode<String> for Text {
    fn encode(&self, value: &String) -> Result<String, CodecError> {
        Ok(value.clone())
    }
}

/// Closure-backed decoder.
///
/// ## Example
/// ```rust
/// use wirestate::{CodecError, Decode, DecodeFn};
///
/// let upper = DecodeFn(|raw: &str| Ok::<_, CodecError>(raw.to_uppercase()));
/// assert_eq!(upper.decode("ok").unwrap(), "OK");
/// ```
#[derive(Clone, Copy, Debug)]
pub struct DecodeFn<F>(pub F);

impl<T, F> Decode<T> for DecodeFn<F>
where
    F: Fn(&str) -> Result<T, CodecError> + Send + Sync + 'static,
{
    fn decode(&self, raw: &str) -> Result<T, CodecError> {
        (self.0)(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_passthrough() {
        assert_eq!(Text.decode("{not json").unwrap(), "{not json");
        assert_eq!(Text.encode(&"ok".to_string()).unwrap(), "ok");
    }

    #[test]
    fn decode_fn_errors_propagate() {
        let strict = DecodeFn(|raw: &str| {
            raw.parse::<u8>()
                .map_err(|e| CodecError::Decode(e.to_string()))
        });
        assert_eq!(strict.decode("7").unwrap(), 7);
        assert!(matches!(strict.decode("700"), Err(CodecError::Decode(_))));
    }
}
