//! Translation between external identifiers and backend keys.

use mongodb::bson::oid::ObjectId;

use crate::errors::RepositoryError;

/// Parse/format pair for one backend's native key type.
pub trait KeyCodec: Send + Sync {
    type Key: Send + Sync;

    /// # Errors
    ///
    /// Returns `RepositoryError::Validation` when `id` does not follow the
    /// backend's key syntax.
    fn decode(&self, id: &str) -> Result<Self::Key, RepositoryError>;

    fn encode(&self, key: &Self::Key) -> String;
}

/// MongoDB `ObjectId` keys, exchanged as 24-character lowercase hex.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectIdCodec;

impl KeyCodec for ObjectIdCodec {
    type Key = ObjectId;

    /// Only the canonical lowercase form is accepted, so every identifier
    /// that decodes encodes back to the same string.
    fn decode(&self, id: &str) -> Result<ObjectId, RepositoryError> {
        let key = ObjectId::parse_str(id)
            .map_err(|e| RepositoryError::Validation(format!("{id:?}: {e}")))?;
        if key.to_hex() != id {
            return Err(RepositoryError::Validation(format!(
                "{id:?}: identifiers must be lowercase hex"
            )));
        }
        Ok(key)
    }

    fn encode(&self, key: &ObjectId) -> String {
        key.to_hex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_then_encode_reproduces_identifier() {
        let codec = ObjectIdCodec;
        let id = "65f1c0ffee0123456789abcd";
        let key = codec.decode(id).unwrap();
        assert_eq!(codec.encode(&key), id);
    }

    #[test]
    fn test_generated_keys_survive_translation() {
        let codec = ObjectIdCodec;
        let key = ObjectId::new();
        assert_eq!(codec.decode(&codec.encode(&key)).unwrap(), key);
    }

    #[test]
    fn test_malformed_identifiers_fail_validation() {
        let codec = ObjectIdCodec;
        for bad in ["", "not-an-id", "65f1c0ffee0123456789abc", "65f1c0ffee0123456789abcdz"] {
            match codec.decode(bad) {
                Err(RepositoryError::Validation(msg)) => assert!(msg.contains(bad)),
                other => panic!("Expected Validation for {bad:?}, got: {other:?}"),
            }
        }
    }

    #[test]
    fn test_non_canonical_case_fails_validation() {
        let codec = ObjectIdCodec;
        for bad in ["65F1C0FFEE0123456789ABCD", "65f1c0ffee0123456789ABcd"] {
            match codec.decode(bad) {
                Err(RepositoryError::Validation(msg)) => assert!(msg.contains("lowercase")),
                other => panic!("Expected Validation for {bad:?}, got: {other:?}"),
            }
        }
    }
}
