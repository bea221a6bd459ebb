//! Byte encoding of persisted values. JSON is the primary, self-describing form;
//! bincode is the direct representation for values JSON cannot express
//! (maps with non-string keys and the like) or cannot express faithfully: `Some(None)`
//! and `None` both print as `null`, and so does a NaN float.

use serde::de::DeserializeOwned;
use serde::Serialize;
use crate::{debug, AppError};

/// Writes JSON when it decodes back to the same value, bincode otherwise.
pub fn encode<T: Serialize + DeserializeOwned>(value: &T) -> Result<Vec<u8>, AppError> {
    match serde_json::to_vec(value) {
        Ok(json) if json_round_trips(value, &json) => Ok(json),
        Ok(json) => {
            debug!("JSON {} of {} is lossy, writing bincode", String::from_utf8_lossy(&json), std::any::type_name::<T>());
            Ok(bincode::serde::encode_to_vec(value, bincode::config::standard())?)
        }
        Err(json_err) => {
            debug!("JSON encoding failed ({}), writing bincode", json_err);
            Ok(bincode::serde::encode_to_vec(value, bincode::config::standard())?)
        }
    }
}

/// Compares the bincode form of `value` with that of its JSON reading. Values bincode
/// cannot write at all keep their JSON.
fn json_round_trips<T: Serialize + DeserializeOwned>(value: &T, json: &[u8]) -> bool {
    let Ok(decoded) = serde_json::from_slice::<T>(json) else {
        return false;
    };
    let config = bincode::config::standard();
    match (bincode::serde::encode_to_vec(value, config), bincode::serde::encode_to_vec(&decoded, config)) {
        (Ok(original), Ok(read_back)) => original == read_back,
        _ => true,
    }
}

/// Decodes JSON, then bincode. A bincode decode must consume every byte, otherwise
/// stray JSON of another type could pass as a value.
pub fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> Result<T, AppError> {
    let json_err = match serde_json::from_slice::<T>(bytes) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };
    match bincode::serde::decode_from_slice::<T, _>(bytes, bincode::config::standard()) {
        Ok((value, read)) if read == bytes.len() => Ok(value),
        Ok((_, read)) => Err(AppError::Decode {
            key: key.to_string(),
            reason: format!("{}; bincode left {} trailing bytes", json_err, bytes.len() - read),
        }),
        Err(bin_err) => Err(AppError::Decode {
            key: key.to_string(),
            reason: format!("{}; {}", json_err, bin_err),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Profile {
        username: Option<String>,
        is_loading: bool,
    }

    #[test]
    fn structs_are_written_as_json() {
        let profile = Profile { username: Some("Leif".into()), is_loading: false };
        let bytes = encode(&profile).unwrap();
        assert_eq!(bytes, br#"{"username":"Leif","is_loading":false}"#.to_vec());
        assert_eq!(decode::<Profile>("k", &bytes).unwrap(), profile);
    }

    #[test]
    fn non_string_map_keys_fall_back_to_bincode() {
        let mut map = HashMap::new();
        map.insert((1u8, 2u8), "pair".to_string());
        let bytes = encode(&map).unwrap();
        assert!(serde_json::from_slice::<serde_json::Value>(&bytes).is_err());
        assert_eq!(decode::<HashMap<(u8, u8), String>>("k", &bytes).unwrap(), map);
    }

    #[test]
    fn type_change_is_a_decode_failure() {
        let bytes = encode(&"not a number".to_string()).unwrap();
        let err = decode::<i32>("app.count", &bytes).unwrap_err();
        assert!(matches!(err, AppError::Decode { key, .. } if key == "app.count"));
    }

    #[test]
    fn nested_none_is_not_collapsed_to_none() {
        let value: Option<Option<i32>> = Some(None);
        let bytes = encode(&value).unwrap();
        assert_ne!(bytes, b"null".to_vec());
        assert_eq!(decode::<Option<Option<i32>>>("k", &bytes).unwrap(), Some(None));
        assert_eq!(encode(&None::<Option<i32>>).unwrap(), b"null".to_vec());
        assert_eq!(encode(&Some(Some(3))).unwrap(), b"3".to_vec());
    }

    #[test]
    fn nested_none_inside_collections_keeps_its_shape() {
        let values: Vec<Option<Option<u8>>> = vec![Some(None), None, Some(Some(1))];
        let bytes = encode(&values).unwrap();
        assert_eq!(decode::<Vec<Option<Option<u8>>>>("k", &bytes).unwrap(), values);
    }

    #[test]
    fn nan_is_kept() {
        let bytes = encode(&f64::NAN).unwrap();
        assert!(decode::<f64>("k", &bytes).unwrap().is_nan());
        assert_eq!(encode(&1.5f64).unwrap(), b"1.5".to_vec());
    }
}
