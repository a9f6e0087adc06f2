//! Properties of the record visitors and the example extractor.

use dict_model::{Diagnostics, MarkerRecord};
use dict_transform::{
    Corpus, Database, ExampleExtractor, Normalize, Rearrange, VisitorChain, XREF_MARKER,
    normalize,
};
use proptest::prelude::*;

fn messy_value() -> impl Strategy<Value = String> {
    "[a-z_ \t]{0,20}"
}

fn record() -> impl Strategy<Value = MarkerRecord> {
    prop::collection::vec(
        (prop::sample::select(vec!["ps", "sd", "de", "ge"]), messy_value()),
        0..8,
    )
    .prop_map(|pairs| {
        let mut record = MarkerRecord::new();
        record.push("lx", "word");
        record.extend(pairs);
        record
    })
}

/// Entry with `n` complete examples, each followed by an entry marker.
fn entry_with_examples(n: usize) -> MarkerRecord {
    let mut record = MarkerRecord::new();
    record.push("lx", "word");
    record.push("ps", "n");
    for i in 0..n {
        record.push("xv", format!("text number {i}"));
        record.push("xvm", format!("text number-{i}"));
        record.push("xe", format!("translation {i}"));
        record.push("de", format!("sense {i}"));
    }
    record
}

proptest! {
    #[test]
    fn normalize_is_idempotent(record in record()) {
        let once = normalize(&record);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn every_complete_example_leaves_one_xref(n in 0usize..12) {
        let mut extractor = ExampleExtractor::new(Corpus::default());
        let mut diagnostics = Diagnostics::new("test");
        let entry = extractor.extract(&entry_with_examples(n), &mut diagnostics);

        let xrefs = entry.get_all(XREF_MARKER);
        prop_assert_eq!(xrefs.len(), n);
        let examples = extractor.store().examples();
        prop_assert_eq!(examples.len(), n);
        for (i, xref) in xrefs.iter().enumerate() {
            let example = examples.get(xref).unwrap();
            let expected = format!("text number {i}");
            prop_assert_eq!(example.text(), Some(expected.as_str()));
        }
        prop_assert!(diagnostics.is_empty());
    }
}

#[test]
fn cat_scenario_through_the_chain() {
    let mut database = Database::new(vec![MarkerRecord::from_iter([
        ("lx", "cat"),
        ("hm", "1"),
        ("xv", "The cat sat."),
        ("xe", "The cat sat."),
        ("ps", "N"),
    ])]);
    let mut diagnostics = Diagnostics::new("test");
    let mut chain = VisitorChain::new()
        .add_visitor(Box::new(Normalize))
        .add_visitor(Box::new(Rearrange));
    chain.run(&mut database, &mut diagnostics);

    let mut extractor = ExampleExtractor::new(Corpus::default());
    database.visit(&mut extractor, &mut diagnostics);

    let entry = &database.records()[0];
    assert_eq!(entry.get("ps"), Some("N"));
    let xref = entry.get(XREF_MARKER).unwrap();
    let example = extractor.store().examples().get(xref).unwrap();
    assert_eq!(example.text(), Some("The cat sat."));
    assert_eq!(example.translation(), Some("The cat sat."));
}
