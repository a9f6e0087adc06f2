//! Specification derivation from `md.json` properties.

use std::collections::BTreeSet;

use dict_map::make_spec;
use dict_model::Properties;
use proptest::prelude::*;

fn markers(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|m| (*m).to_string()).collect()
}

#[test]
fn spec_for_custom_submission() {
    let properties: Properties = serde_json::from_str(
        r#"{
            "entry_sep": "\\hw ",
            "entry_id": "hw",
            "entry_map": {"hw": "Headword"},
            "sense_map": {"gn": "Description"},
            "references": {"src": "gn"}
        }"#,
    )
    .unwrap();
    let spec = make_spec(
        &properties,
        &markers(&["hw", "lx", "ps", "sn", "gn", "de", "src", "tx", "ft"]),
    )
    .unwrap();

    assert_eq!(spec.entry_sep, "hw");
    assert_eq!(spec.entry.column("hw"), Some("Headword"));
    // `lx` lost its default column to `hw`.
    assert_eq!(spec.entry.column("lx"), None);
    assert_eq!(spec.sense.column("gn"), Some("Description"));
    assert_eq!(spec.sense.column("de"), None);
    assert_eq!(spec.sense.refs.get("src").map(String::as_str), Some("Description"));
    assert!(spec.has_refs());

    insta::assert_json_snapshot!(spec.sense.map, @r#"
    {
      "gn": "Description"
    }
    "#);
}

proptest! {
    #[test]
    fn mappings_are_injective(
        extra in prop::collection::btree_map("[a-z]{1,3}", prop::sample::select(vec![
            "Description", "Comment", "Headword", "Custom_A", "Custom_B",
        ]), 0..6)
    ) {
        let mut properties = Properties::default();
        // Keep the submission map itself injective.
        let mut used = BTreeSet::new();
        for (marker, column) in extra {
            if used.insert(column) {
                properties.sense_map.insert(marker, column.to_string());
            }
        }
        let mut all: BTreeSet<String> = properties.sense_map.keys().cloned().collect();
        all.extend(markers(&["lx", "de", "nt", "sd", "sn"]));

        let spec = make_spec(&properties, &all).unwrap();
        let columns: Vec<&String> = spec.sense.map.values().collect();
        let unique: BTreeSet<&String> = columns.iter().copied().collect();
        prop_assert_eq!(columns.len(), unique.len());
    }
}
