//! Object codec for `OBJECT` columns.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::ObjectSerDe;
use crate::error::{BlockError, BlockResult};

/// Encodes any serde type with bincode.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeSerDe;

impl<T> ObjectSerDe<T> for BincodeSerDe
where
    T: Serialize + DeserializeOwned,
{
    fn serialize(&self, value: &T) -> BlockResult<Vec<u8>> {
        bincode::serialize(value).map_err(|e| BlockError::object_codec(e.to_string()))
    }

    fn deserialize(&self, bytes: &[u8]) -> BlockResult<T> {
        bincode::deserialize(bytes).map_err(|e| BlockError::object_codec(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Histogram {
        buckets: Vec<u64>,
        label: String,
    }

    #[test]
    fn test_object_roundtrip() {
        let hist = Histogram {
            buckets: vec![1, 4, 9],
            label: "latency".into(),
        };
        let bytes = BincodeSerDe.serialize(&hist).unwrap();
        let decoded: Histogram = BincodeSerDe.deserialize(&bytes).unwrap();
        assert_eq!(decoded, hist);
    }

    #[test]
    fn test_truncated_object() {
        let bytes = ObjectSerDe::<String>::serialize(&BincodeSerDe, &"hello".to_string()).unwrap();
        let result: BlockResult<String> = BincodeSerDe.deserialize(&bytes[..3]);
        assert!(matches!(result, Err(BlockError::ObjectCodec { .. })));
    }
}
