//! JSON codecs.
//!
//! Two conventions exist on the wire and both are kept:
//! - [`Json`]: the frame *is* the JSON document (`{"n":1}`).
//! - [`DoubleJson`]: the frame is a JSON string containing the document (`"{\"n\":1}"`).

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use super::{Decode, Encode};
use crate::error::CodecError;

/// Plain JSON frames.
///
/// Encoding sends a value that serializes to a JSON string as the raw string
/// (no quotes); everything else is JSON-stringified. Sets serialize as arrays.
///
/// Decoding mirrors that: a frame that is not valid JSON for `T` is retried as
/// a bare string, so string-valued stores read back what they sent.
#[derive(Clone, Copy, Debug, Default)]
pub struct Json;

impl<T: DeserializeOwned> Decode<T> for Json {
    fn decode(&self, raw: &str) -> Result<T, CodecError> {
        match serde_json::from_str(raw) {
            Ok(value) => Ok(value),
            Err(e) => serde_json::from_value(Value::String(raw.to_owned()))
                .map_err(|_| CodecError::from(e)),
        }
    }
}

impl<T: Serialize> Encode<T> for Json {
    fn encode(&self, value: &T) -> Result<String, CodecError> {
        match serde_json::to_value(value).map_err(|e| CodecError::Encode(e.to_string()))? {
            Value::String(s) => Ok(s),
            other => Ok(other.to_string()),
        }
    }
}

/// JSON document carried inside a JSON string.
///
/// Decoding also accepts a bare document, so a server that stops
/// double-encoding keeps working.
#[derive(Clone, Copy, Debug, Default)]
pub struct DoubleJson;

impl<T: DeserializeOwned> Decode<T> for DoubleJson {
    fn decode(&self, raw: &str) -> Result<T, CodecError> {
        match serde_json::from_str::<Value>(raw)? {
            Value::String(inner) => Ok(serde_json::from_str(&inner)?),
            other => Ok(serde_json::from_value(other)?),
        }
    }
}

impl<T: Serialize> Encode<T> for DoubleJson {
    fn encode(&self, value: &T) -> Result<String, CodecError> {
        let inner = serde_json::to_string(value).map_err(|e| CodecError::Encode(e.to_string()))?;
        serde_json::to_string(&inner).map_err(|e| CodecError::Encode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde::Deserialize;
    use std::collections::BTreeSet;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Counter {
        n: i64,
    }

    #[test]
    fn rejects_non_json() {
        let res: Result<Counter, _> = Json.decode("hello there");
        assert!(matches!(res, Err(CodecError::Decode(_))));
    }

    #[test]
    fn rejects_wrong_shape() {
        let res: Result<Counter, _> = Json.decode(r#"{"m": 1}"#);
        assert!(res.is_err());
    }

    #[test]
    fn strings_are_sent_raw() {
        assert_eq!(Json.encode(&"move".to_string()).unwrap(), "move");
        assert_eq!(Json.encode(&Counter { n: 3 }).unwrap(), r#"{"n":3}"#);
    }

    #[test]
    fn sets_are_sent_as_arrays() {
        let set: BTreeSet<u8> = [3, 1, 2].into_iter().collect();
        assert_eq!(Json.encode(&set).unwrap(), "[1,2,3]");
    }

    #[test]
    fn json_decode_inverts_encode_for_documents() {
        let v = Counter { n: -12 };
        let frame = Json.encode(&v).unwrap();
        let back: Counter = Json.decode(&frame).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn bare_strings_decode_as_strings() {
        let v: String = Json.decode("hello").unwrap();
        assert_eq!(v, "hello");
        let v: String = Json.decode("42").unwrap();
        assert_eq!(v, "42");
        let v: String = Json.decode(r#""quoted""#).unwrap();
        assert_eq!(v, "quoted");
    }

    #[test]
    fn bare_string_fallback_keeps_the_parse_error() {
        let res: Result<i64, _> = Json.decode("forty-two");
        match res {
            Err(CodecError::Decode(msg)) => assert!(!msg.contains("invalid type: string"), "{msg}"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn double_json_unwraps_string() {
        let frame = r#""{\"n\":5}""#;
        let v: Counter = DoubleJson.decode(frame).unwrap();
        assert_eq!(v, Counter { n: 5 });
    }

    #[test]
    fn double_json_accepts_bare_document() {
        let v: Counter = DoubleJson.decode(r#"{"n":6}"#).unwrap();
        assert_eq!(v, Counter { n: 6 });
    }

    #[test]
    fn double_json_encode_wraps_document() {
        let frame = DoubleJson.encode(&Counter { n: 1 }).unwrap();
        assert_eq!(frame, r#""{\"n\":1}""#);
        let back: Counter = DoubleJson.decode(&frame).unwrap();
        assert_eq!(back, Counter { n: 1 });
    }

    fn counters() -> impl Strategy<Value = Counter> {
        any::<i64>().prop_map(|n| Counter { n })
    }

    proptest! {
        // A raw frame holding a quoted JSON string reads back unquoted, so
        // string values with a double quote are left out for `Json`.
        #[test]
        fn json_round_trips_strings(v in "[^\"]*") {
            let back: String = Json.decode(&Json.encode(&v).unwrap()).unwrap();
            prop_assert_eq!(back, v);
        }

        #[test]
        fn json_round_trips_values(n in any::<i64>(), list in prop::collection::vec(".*", 0..4), c in counters()) {
            let back: i64 = Json.decode(&Json.encode(&n).unwrap()).unwrap();
            prop_assert_eq!(back, n);
            let back: Vec<String> = Json.decode(&Json.encode(&list).unwrap()).unwrap();
            prop_assert_eq!(back, list);
            let back: Counter = Json.decode(&Json.encode(&c).unwrap()).unwrap();
            prop_assert_eq!(back, c);
        }

        #[test]
        fn double_json_round_trips(s in ".*", n in any::<i64>(), list in prop::collection::vec(".*", 0..4), c in counters()) {
            let back: String = DoubleJson.decode(&DoubleJson.encode(&s).unwrap()).unwrap();
            prop_assert_eq!(back, s);
            let back: i64 = DoubleJson.decode(&DoubleJson.encode(&n).unwrap()).unwrap();
            prop_assert_eq!(back, n);
            let back: Vec<String> = DoubleJson.decode(&DoubleJson.encode(&list).unwrap()).unwrap();
            prop_assert_eq!(back, list);
            let back: Counter = DoubleJson.decode(&DoubleJson.encode(&c).unwrap()).unwrap();
            prop_assert_eq!(back, c);
        }
    }
}
