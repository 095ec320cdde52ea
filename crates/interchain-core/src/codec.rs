//! Binary and JSON codecs.
//!
//! Everything written to a store, every query parameter blob and every
//! transaction body is CBOR. Query responses are JSON so that light tooling
//! can read them without a CBOR decoder.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CoreError;

/// Encode a value to CBOR bytes.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CoreError> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| CoreError::EncodingError(e.to_string()))?;
    Ok(buf)
}

/// Decode a value from CBOR bytes.
///
/// Trailing bytes after the first item are rejected.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CoreError> {
    let mut reader = bytes;
    let value = ciborium::from_reader(&mut reader)
        .map_err(|e| CoreError::DecodingError(e.to_string()))?;
    if !reader.is_empty() {
        return Err(CoreError::DecodingError(format!(
            "{} trailing bytes",
            reader.len()
        )));
    }
    Ok(value)
}

/// Encode a value to JSON bytes.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CoreError> {
    serde_json::to_vec(value).map_err(|e| CoreError::EncodingError(e.to_string()))
}

/// Decode a value from JSON bytes.
pub fn from_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CoreError> {
    serde_json::from_slice(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = encode(&42u64).unwrap();
        bytes.push(0x00);
        assert!(decode::<u64>(&bytes).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(decode::<u64>(&[0xff, 0xff]).is_err());
        assert!(from_json::<u64>(b"not json").is_err());
    }

    #[test]
    fn test_json_counter() {
        let bytes = to_json(&3u64).unwrap();
        assert_eq!(bytes, b"3");
        assert_eq!(from_json::<u64>(&bytes).unwrap(), 3);
    }
}
