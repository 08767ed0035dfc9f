// crates/strata-core/src/codec.rs
//
// Value codec for stored records. Records are JSON-encoded; the engine
// attaches no meaning to the bytes beyond round-tripping them.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StrataError;

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StrataError> {
    Ok(serde_json::to_vec(value)?)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StrataError> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ValidatorApproval;
    use crate::identity::Address;

    #[test]
    fn test_decode_garbage_is_serialization_error() {
        let err = decode::<ValidatorApproval>(b"not json").unwrap_err();
        assert!(matches!(err, StrataError::Serialization(_)));
    }

    #[test]
    fn test_encode_decode() {
        let approval = ValidatorApproval {
            approver: Address([3u8; 20]),
            enabled: true,
        };
        let back: ValidatorApproval = decode(&encode(&approval).unwrap()).unwrap();
        assert_eq!(back, approval);
    }
}
