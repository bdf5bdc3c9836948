// Thin wrapper over the bincode 2.x API with the crate's error type.
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};

/// Serialize a value with bincode's standard configuration
pub fn serialize<T: Serialize + bincode::Encode>(data: &T) -> Result<Vec<u8>> {
    let config = bincode::config::standard();
    bincode::encode_to_vec(data, config)
        .map_err(|e| LedgerError::Serialization(format!("Serialization failed: {e}")))
}

/// Deserialize a value with bincode's standard configuration
pub fn deserialize<T>(bytes: &[u8]) -> Result<T>
where
    T: for<'de> Deserialize<'de> + bincode::Decode<()>,
{
    let config = bincode::config::standard();
    let (data, _) = bincode::decode_from_slice(bytes, config)
        .map_err(|e| LedgerError::Serialization(format!("Deserialization failed: {e}")))?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
    struct Record {
        height: u64,
        payload: Vec<u8>,
        label: String,
    }

    #[test]
    fn round_trip() {
        let original = Record {
            height: 7,
            payload: vec![0xde, 0xad, 0xbe, 0xef],
            label: "tip".to_string(),
        };

        let bytes = serialize(&original).unwrap();
        let decoded: Record = deserialize(&bytes).unwrap();

        assert_eq!(original, decoded);
    }

    #[test]
    fn round_trip_is_byte_stable() {
        let original = Record {
            height: 1,
            payload: vec![1, 2, 3],
            label: "a".to_string(),
        };

        let first = serialize(&original).unwrap();
        let decoded: Record = deserialize(&first).unwrap();
        let second = serialize(&decoded).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn rejects_garbage() {
        let garbage = vec![0xFF; 16];
        let result: Result<Record> = deserialize(&garbage);
        assert!(result.is_err());
    }
}
