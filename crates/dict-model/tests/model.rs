//! Integration tests for the marker record model.

use dict_model::{ExtractedRecord, ExtractedSense, MarkerRecord, split_ids};
use proptest::prelude::*;

#[test]
fn extracted_records_expose_owner_and_media() {
    let record: MarkerRecord = [("sn", "1"), ("de", "a pet")].into_iter().collect();
    let mut sense = ExtractedSense::new("SN000001", "cat_1", record);
    sense.media_ids_mut().push("abc123".to_string());
    assert_eq!(sense.entry_id(), Some("cat_1"));
    assert_eq!(sense.media_ids(), ["abc123".to_string()]);
    assert!(sense.sense_ids().is_none());
}

proptest! {
    #[test]
    fn split_ids_is_sorted_and_unique(value in "[a-c,; ]{0,20}") {
        let ids = split_ids(&value);
        let mut sorted = ids.clone();
        sorted.sort();
        sorted.dedup();
        prop_assert_eq!(&ids, &sorted);
        prop_assert!(ids.iter().all(|id| !id.is_empty() && id.trim() == id));
    }

    #[test]
    fn partition_keeps_every_pair(markers in proptest::collection::vec("[a-d]", 0..12)) {
        let record: MarkerRecord = markers
            .iter()
            .enumerate()
            .map(|(index, marker)| (marker.clone(), index.to_string()))
            .collect();
        let (matched, rest) = record.partition(|marker| marker == "a");
        prop_assert_eq!(matched.len() + rest.len(), record.len());
        prop_assert!(matched.iter().all(|(marker, _)| marker == "a"));
    }
}
