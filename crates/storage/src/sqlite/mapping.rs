use quest_core::model::UserStats;

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Encode stats as the JSON document stored in `user_stats.document`.
pub(crate) fn encode_stats(stats: &UserStats) -> Result<String, StorageError> {
    serde_json::to_string(stats).map_err(ser)
}

/// Decode a stored JSON document. Missing fields take their defaults.
pub(crate) fn decode_stats(document: &str) -> Result<UserStats, StorageError> {
    serde_json::from_str(document).map_err(ser)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quest_core::time::fixed_now;

    #[test]
    fn corrupt_document_is_a_serialization_error() {
        let err = decode_stats("{not json").unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[test]
    fn encoded_document_decodes_back() {
        let stats = UserStats::new(fixed_now());
        let doc = encode_stats(&stats).unwrap();
        assert!(doc.contains("\"lives\":5"));
        assert_eq!(decode_stats(&doc).unwrap(), stats);
    }
}
